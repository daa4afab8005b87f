// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors
use crate::config::{RawParams, ValidationError};
use serde_derive::Serialize;
use std::{
    fmt,
    path::{Component, Path},
    str::FromStr,
};

pub const DEFAULT_VERSION: u8 = 3;
pub const DEFAULT_TIMELIMIT: u32 = 30;
pub const DEFAULT_BIND_TIMELIMIT: u32 = 30;
pub const DEFAULT_IDLE_TIMELIMIT: u32 = 3600;
pub const DEFAULT_TLS_CIPHERS: &str = "TLSv1";
pub const DEFAULT_SCHEMA: &str = "rfc2307bis";
pub const LDAP_PORT: u16 = 389;
pub const LDAPS_PORT: u16 = 636;

pub const DEFAULT_NSS_RECONNECT_TRIES: u32 = 5;
pub const DEFAULT_NSS_RECONNECT_SLEEPTIME: u32 = 4;
pub const DEFAULT_NSS_RECONNECT_MAXSLEEPTIME: u32 = 64;
pub const DEFAULT_NSS_RECONNECT_MAXCONNTRIES: u32 = 2;

pub const DEFAULT_PAM_ATT_LOGIN: &str = "uid";
pub const DEFAULT_PAM_ATT_MEMBER: &str = "member";
pub const DEFAULT_PAM_PASSWD: &str = "md5";
pub const DEFAULT_PAM_FILTER: &str = "objectClass=posixAccount";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Base,
    One,
    #[default]
    Sub,
}

impl FromStr for Scope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "base" => Ok(Scope::Base),
            "one" => Ok(Scope::One),
            "sub" => Ok(Scope::Sub),
            other => Err(ValidationError::InvalidScope(other.to_string())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Base => "base",
            Scope::One => "one",
            Scope::Sub => "sub",
        })
    }
}

/// Desired existence of a managed resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

impl Ensure {
    pub fn is_present(self) -> bool {
        self == Ensure::Present
    }
}

impl FromStr for Ensure {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "present" => Ok(Ensure::Present),
            "absent" => Ok(Ensure::Absent),
            other => Err(ValidationError::InvalidEnsure(other.to_string())),
        }
    }
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ensure::Present => "present",
            Ensure::Absent => "absent",
        })
    }
}

/// Fully defaulted and validated client parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub uri: String,
    pub base: String,
    pub version: u8,
    pub timelimit: u32,
    pub bind_timelimit: u32,
    pub idle_timelimit: u32,
    /// Paired with `bindpw`; the pairing is not enforced.
    pub binddn: Option<String>,
    pub bindpw: Option<String>,
    pub port: u16,
    pub scope: Scope,
    pub ssl: bool,
    pub ssl_cert: Option<String>,
    pub tls_checkpeer: bool,
    pub tls_ciphers: String,
    pub schema: String,
    pub sssd: bool,
    pub ensure: Ensure,
}

/// Back-off schedule handed to the name-service cache. Never executed here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ReconnectPolicy {
    pub tries: u32,
    pub sleep_time: u32,
    pub max_sleep_time: u32,
    pub max_conn_tries: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy {
            tries: DEFAULT_NSS_RECONNECT_TRIES,
            sleep_time: DEFAULT_NSS_RECONNECT_SLEEPTIME,
            max_sleep_time: DEFAULT_NSS_RECONNECT_MAXSLEEPTIME,
            max_conn_tries: DEFAULT_NSS_RECONNECT_MAXCONNTRIES,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NssConfig {
    pub enabled: bool,
    pub passwd: Option<String>,
    pub group: Option<String>,
    pub shadow: Option<String>,
    pub reconnect: ReconnectPolicy,
}

impl NssConfig {
    pub fn resolve(raw: &RawParams) -> Result<Self, ValidationError> {
        let defaults = ReconnectPolicy::default();
        Ok(NssConfig {
            enabled: raw.nsswitch.unwrap_or(false),
            passwd: non_empty(raw.nss_passwd.as_deref()),
            group: non_empty(raw.nss_group.as_deref()),
            shadow: non_empty(raw.nss_shadow.as_deref()),
            reconnect: ReconnectPolicy {
                tries: positive(
                    "nss_reconnect_tries",
                    raw.nss_reconnect_tries,
                    defaults.tries,
                )?,
                sleep_time: positive(
                    "nss_reconnect_sleeptime",
                    raw.nss_reconnect_sleeptime,
                    defaults.sleep_time,
                )?,
                max_sleep_time: positive(
                    "nss_reconnect_maxsleeptime",
                    raw.nss_reconnect_maxsleeptime,
                    defaults.max_sleep_time,
                )?,
                max_conn_tries: positive(
                    "nss_reconnect_maxconntries",
                    raw.nss_reconnect_maxconntries,
                    defaults.max_conn_tries,
                )?,
            },
        })
    }

    pub fn passwd_base(&self, base: &str) -> Option<String> {
        search_base(self.passwd.as_deref(), base)
    }

    pub fn group_base(&self, base: &str) -> Option<String> {
        search_base(self.group.as_deref(), base)
    }

    pub fn shadow_base(&self, base: &str) -> Option<String> {
        search_base(self.shadow.as_deref(), base)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PamConfig {
    pub enabled: bool,
    pub login_attribute: String,
    pub member_attribute: String,
    pub password_scheme: String,
    pub filter: String,
}

impl Default for PamConfig {
    fn default() -> Self {
        PamConfig {
            enabled: false,
            login_attribute: DEFAULT_PAM_ATT_LOGIN.to_string(),
            member_attribute: DEFAULT_PAM_ATT_MEMBER.to_string(),
            password_scheme: DEFAULT_PAM_PASSWD.to_string(),
            filter: DEFAULT_PAM_FILTER.to_string(),
        }
    }
}

impl PamConfig {
    pub fn resolve(raw: &RawParams) -> Self {
        let defaults = PamConfig::default();
        PamConfig {
            enabled: raw.pam.unwrap_or(false),
            login_attribute: non_empty(raw.pam_att_login.as_deref())
                .unwrap_or(defaults.login_attribute),
            member_attribute: non_empty(raw.pam_att_member.as_deref())
                .unwrap_or(defaults.member_attribute),
            password_scheme: non_empty(raw.pam_passwd.as_deref())
                .unwrap_or(defaults.password_scheme),
            filter: non_empty(raw.pam_filter.as_deref())
                .unwrap_or(defaults.filter),
        }
    }
}

/// The three records a run is planned from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedParams {
    pub config: ResolvedConfig,
    pub nss: NssConfig,
    pub pam: PamConfig,
}

/// Resolve the client record and both sub-configurations in one pass.
pub fn resolve_all(
    raw: &RawParams,
) -> Result<ResolvedParams, ValidationError> {
    Ok(ResolvedParams {
        config: resolve(raw)?,
        nss: NssConfig::resolve(raw)?,
        pam: PamConfig::resolve(raw),
    })
}

/// Turn raw input into a [`ResolvedConfig`].
///
/// Applies the defaults, derives the port from `ssl` when none was given and
/// rejects inconsistent input. Performs no I/O.
///
/// # Errors
///
/// - `MissingRequired` when `uri` or `base` is absent or blank
/// - `MissingCert` when `ssl` is enabled without `ssl_cert`
/// - `InvalidCertName` when `ssl_cert` is not a bare file name
/// - `InvalidScope`, `InvalidEnsure`, `InvalidPort`, `InvalidVersion` and
///   `NotPositive` for out-of-range values
pub fn resolve(raw: &RawParams) -> Result<ResolvedConfig, ValidationError> {
    let uri = raw
        .uri
        .as_deref()
        .map(|u| u.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|u| !u.is_empty())
        .ok_or(ValidationError::MissingRequired("uri"))?;
    let base = non_empty(raw.base.as_deref())
        .ok_or(ValidationError::MissingRequired("base"))?;

    let ssl = raw.ssl.unwrap_or(false);
    let ssl_cert = non_empty(raw.ssl_cert.as_deref());
    if ssl && ssl_cert.is_none() {
        return Err(ValidationError::MissingCert);
    }
    if let Some(name) = &ssl_cert {
        if !is_plain_file_name(name) {
            return Err(ValidationError::InvalidCertName(name.clone()));
        }
    }

    let port = match raw.port {
        Some(p) => u16::try_from(p)
            .ok()
            .filter(|p| *p != 0)
            .ok_or(ValidationError::InvalidPort(p))?,
        None if ssl => LDAPS_PORT,
        None => LDAP_PORT,
    };

    let version = match raw.version {
        None => DEFAULT_VERSION,
        Some(v @ (2 | 3)) => v as u8,
        Some(v) => return Err(ValidationError::InvalidVersion(v)),
    };

    let scope = match raw.scope.as_deref() {
        Some(s) => s.parse()?,
        None => Scope::default(),
    };
    let ensure = match raw.ensure.as_deref() {
        Some(e) => e.parse()?,
        None => Ensure::default(),
    };

    Ok(ResolvedConfig {
        uri,
        base,
        version,
        timelimit: positive("timelimit", raw.timelimit, DEFAULT_TIMELIMIT)?,
        bind_timelimit: positive(
            "bind_timelimit",
            raw.bind_timelimit,
            DEFAULT_BIND_TIMELIMIT,
        )?,
        idle_timelimit: positive(
            "idle_timelimit",
            raw.idle_timelimit,
            DEFAULT_IDLE_TIMELIMIT,
        )?,
        binddn: non_empty(raw.binddn.as_deref()),
        bindpw: raw.bindpw.clone().filter(|p| !p.is_empty()),
        port,
        scope,
        ssl,
        ssl_cert,
        tls_checkpeer: raw.tls_checkpeer.unwrap_or(true),
        tls_ciphers: non_empty(raw.tls_ciphers.as_deref())
            .unwrap_or_else(|| DEFAULT_TLS_CIPHERS.to_string()),
        schema: non_empty(raw.schema.as_deref())
            .unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
        sssd: raw.sssd.unwrap_or(false),
        ensure,
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// The certificate always lives directly in the policy's certificate
// directory.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains('/')
}

fn positive(
    field: &'static str,
    value: Option<i64>,
    default: u32,
) -> Result<u32, ValidationError> {
    match value {
        None => Ok(default),
        Some(v) => u32::try_from(v)
            .ok()
            .filter(|v| *v > 0)
            .ok_or(ValidationError::NotPositive { field, value: v }),
    }
}

fn search_base(suffix: Option<&str>, base: &str) -> Option<String> {
    suffix.map(|s| format!("{s},{base}"))
}
