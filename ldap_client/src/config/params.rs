// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors
use serde_derive::{Deserialize, Serialize};

/// The flat input mapping of a convergence run.
///
/// Every field is optional here. Numbers and enumerations are kept in their
/// raw form so that the resolver, not the deserializer, decides what is
/// out of range.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RawParams {
    pub uri: Option<String>,
    pub base: Option<String>,
    pub version: Option<i64>,
    pub timelimit: Option<i64>,
    pub bind_timelimit: Option<i64>,
    pub idle_timelimit: Option<i64>,
    pub binddn: Option<String>,
    pub bindpw: Option<String>,
    pub port: Option<i64>,
    pub scope: Option<String>,
    pub ssl: Option<bool>,
    pub ssl_cert: Option<String>,
    pub tls_checkpeer: Option<bool>,
    pub tls_ciphers: Option<String>,
    pub schema: Option<String>,

    pub nsswitch: Option<bool>,
    pub nss_passwd: Option<String>,
    pub nss_group: Option<String>,
    pub nss_shadow: Option<String>,
    pub nss_reconnect_tries: Option<i64>,
    pub nss_reconnect_sleeptime: Option<i64>,
    pub nss_reconnect_maxsleeptime: Option<i64>,
    pub nss_reconnect_maxconntries: Option<i64>,

    pub pam: Option<bool>,
    pub pam_att_login: Option<String>,
    pub pam_att_member: Option<String>,
    pub pam_passwd: Option<String>,
    pub pam_filter: Option<String>,

    pub sssd: Option<bool>,
    pub ensure: Option<String>,
}

impl RawParams {
    /// Shorthand for the two required options.
    pub fn new(uri: impl Into<String>, base: impl Into<String>) -> Self {
        RawParams {
            uri: Some(uri.into()),
            base: Some(base.into()),
            ..Default::default()
        }
    }
}
