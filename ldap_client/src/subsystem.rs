// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors

//! Subsystem composer.
//!
//! Decides which name-service and authentication collaborators a run
//! invokes and with which parameters. The bundles are opaque here: how
//! nsswitch, PAM or SSSD apply them is up to the collaborator.

use crate::config::{NssConfig, PamConfig, ResolvedConfig};
use serde_derive::Serialize;
use std::collections::BTreeMap;

pub const NSSWITCH: &str = "nsswitch";
pub const PAM: &str = "pam";
pub const SSSD: &str = "sssd";
pub const KNOWN_SUBSYSTEMS: &[&str] = &[NSSWITCH, PAM, SSSD];

/// Parameter bundle handed to a collaborator. Ordered, so plans compare and
/// serialize deterministically.
pub type SubsystemParams = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubsystemInvocation {
    pub name: String,
    pub params: SubsystemParams,
}

/// Compose the collaborator invocations of a run.
///
/// `nsswitch` and `pam` are emitted when enabled, `sssd` when `cfg.sssd` is
/// set. SSSD receives its own copies of the nsswitch and PAM parameters
/// rather than depending on those invocations, and all three may fire in
/// the same run.
pub fn compose(
    cfg: &ResolvedConfig,
    nss: &NssConfig,
    pam: &PamConfig,
) -> Vec<SubsystemInvocation> {
    let mut invocations = Vec::new();

    if nss.enabled {
        let mut params = connection_params(cfg);
        params.extend(nss_params(cfg, nss));
        invocations.push(SubsystemInvocation {
            name: NSSWITCH.to_string(),
            params,
        });
    }

    if pam.enabled {
        let mut params = connection_params(cfg);
        params.extend(pam_params(pam));
        invocations.push(SubsystemInvocation {
            name: PAM.to_string(),
            params,
        });
    }

    if cfg.sssd {
        let mut params = connection_params(cfg);
        params.extend(tls_params(cfg));
        params.extend(
            nss_params(cfg, nss)
                .into_iter()
                .map(|(k, v)| (format!("nss_{k}"), v)),
        );
        params.extend(
            pam_params(pam)
                .into_iter()
                .map(|(k, v)| (format!("pam_{k}"), v)),
        );
        invocations.push(SubsystemInvocation {
            name: SSSD.to_string(),
            params,
        });
    }

    invocations
}

fn connection_params(cfg: &ResolvedConfig) -> SubsystemParams {
    let mut params = SubsystemParams::from([
        ("ensure".to_string(), cfg.ensure.to_string()),
        ("uri".to_string(), cfg.uri.clone()),
        ("base".to_string(), cfg.base.clone()),
        ("port".to_string(), cfg.port.to_string()),
        ("scope".to_string(), cfg.scope.to_string()),
        ("ldap_version".to_string(), cfg.version.to_string()),
        ("timelimit".to_string(), cfg.timelimit.to_string()),
        ("bind_timelimit".to_string(), cfg.bind_timelimit.to_string()),
        ("idle_timelimit".to_string(), cfg.idle_timelimit.to_string()),
    ]);
    if let Some(binddn) = &cfg.binddn {
        let _ = params.insert("binddn".to_string(), binddn.clone());
    }
    if let Some(bindpw) = &cfg.bindpw {
        let _ = params.insert("bindpw".to_string(), bindpw.clone());
    }
    params
}

fn tls_params(cfg: &ResolvedConfig) -> SubsystemParams {
    let mut params = SubsystemParams::from([
        ("ssl".to_string(), cfg.ssl.to_string()),
        ("tls_checkpeer".to_string(), cfg.tls_checkpeer.to_string()),
        ("tls_ciphers".to_string(), cfg.tls_ciphers.clone()),
        ("schema".to_string(), cfg.schema.clone()),
    ]);
    if let Some(cert) = &cfg.ssl_cert {
        let _ = params.insert("ssl_cert".to_string(), cert.clone());
    }
    params
}

fn nss_params(cfg: &ResolvedConfig, nss: &NssConfig) -> SubsystemParams {
    let mut params = SubsystemParams::from([
        ("reconnect_tries".to_string(), nss.reconnect.tries.to_string()),
        (
            "reconnect_sleeptime".to_string(),
            nss.reconnect.sleep_time.to_string(),
        ),
        (
            "reconnect_maxsleeptime".to_string(),
            nss.reconnect.max_sleep_time.to_string(),
        ),
        (
            "reconnect_maxconntries".to_string(),
            nss.reconnect.max_conn_tries.to_string(),
        ),
    ]);
    for (key, value) in [
        ("base_passwd", nss.passwd_base(&cfg.base)),
        ("base_group", nss.group_base(&cfg.base)),
        ("base_shadow", nss.shadow_base(&cfg.base)),
    ] {
        if let Some(value) = value {
            let _ = params.insert(key.to_string(), value);
        }
    }
    params
}

fn pam_params(pam: &PamConfig) -> SubsystemParams {
    SubsystemParams::from([
        ("login_attribute".to_string(), pam.login_attribute.clone()),
        ("member_attribute".to_string(), pam.member_attribute.clone()),
        ("password".to_string(), pam.password_scheme.clone()),
        ("filter".to_string(), pam.filter.clone()),
    ])
}
