// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors

//! Per-OS values the engine needs: which packages provide the client, where
//! its configuration and trust material live and who owns them.
//!
//! These are passed explicitly to the planner instead of being looked up
//! from the host, so plans for any target family can be built anywhere.

use log::*;
use serde_derive::Serialize;
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub static OS_RELEASE: &str = "/etc/os-release";
pub static DEFAULT_CERT_SOURCE_DIR: &str = "/etc/ldap_client/certs";
pub const CONFIG_FILE_MODE: u32 = 0o644;
pub const CERT_FILE_MODE: u32 = 0o644;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Could not read {path}")]
    OsRelease {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported operating system family '{0}'")]
    UnsupportedFamily(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Debian,
    RedHat,
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OsFamily::Debian => "debian",
            OsFamily::RedHat => "redhat",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlatformPolicy {
    pub family: OsFamily,
    /// Packages providing the client tools and owning `config_dir`.
    pub packages: Vec<String>,
    pub config_dir: PathBuf,
    pub config_file: String,
    pub cert_dir: PathBuf,
    /// Where the trust file named by `ssl_cert` is read from.
    pub cert_source_dir: PathBuf,
    pub owner: String,
    pub group: String,
    pub cert_owner: String,
    pub cert_group: String,
}

impl PlatformPolicy {
    pub fn debian() -> Self {
        PlatformPolicy {
            family: OsFamily::Debian,
            packages: vec!["ldap-utils".to_string()],
            config_dir: PathBuf::from("/etc/ldap"),
            config_file: "ldap.conf".to_string(),
            cert_dir: PathBuf::from("/etc/ssl/certs"),
            cert_source_dir: PathBuf::from(DEFAULT_CERT_SOURCE_DIR),
            owner: "root".to_string(),
            group: "root".to_string(),
            cert_owner: "root".to_string(),
            cert_group: "root".to_string(),
        }
    }

    pub fn redhat() -> Self {
        PlatformPolicy {
            family: OsFamily::RedHat,
            packages: vec!["openldap-clients".to_string()],
            config_dir: PathBuf::from("/etc/openldap"),
            config_file: "ldap.conf".to_string(),
            cert_dir: PathBuf::from("/etc/openldap/cacerts"),
            cert_source_dir: PathBuf::from(DEFAULT_CERT_SOURCE_DIR),
            owner: "root".to_string(),
            group: "root".to_string(),
            cert_owner: "root".to_string(),
            cert_group: "root".to_string(),
        }
    }

    pub fn for_family(family: OsFamily) -> Self {
        match family {
            OsFamily::Debian => Self::debian(),
            OsFamily::RedHat => Self::redhat(),
        }
    }

    /// Pick the policy matching the running host's `/etc/os-release`.
    pub fn detect() -> Result<Self, PlatformError> {
        let contents = fs::read_to_string(OS_RELEASE).map_err(|source| {
            PlatformError::OsRelease {
                path: OS_RELEASE.to_string(),
                source,
            }
        })?;
        Self::from_os_release(&contents)
    }

    /// Pick the policy from the contents of an os-release file, looking at
    /// `ID` first and `ID_LIKE` after it.
    pub fn from_os_release(contents: &str) -> Result<Self, PlatformError> {
        let mut ids = Vec::new();
        for key in ["ID", "ID_LIKE"] {
            if let Some(value) = contents.lines().find_map(|line| {
                line.strip_prefix(key)?.strip_prefix('=')
            }) {
                ids.extend(
                    value
                        .trim_matches(|c| c == '"' || c == '\'')
                        .split_whitespace()
                        .map(str::to_string),
                );
            }
        }

        let family = ids.iter().find_map(|id| match id.as_str() {
            "debian" | "ubuntu" => Some(OsFamily::Debian),
            "rhel" | "fedora" | "centos" | "rocky" | "almalinux" => {
                Some(OsFamily::RedHat)
            }
            _ => None,
        });

        match family {
            Some(f) => {
                debug!("Detected operating system family {f}");
                Ok(Self::for_family(f))
            }
            None => Err(PlatformError::UnsupportedFamily(ids.join(" "))),
        }
    }

    /// Re-home every managed path below `root`, for chroots and image trees.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        let reroot = |p: &Path| root.join(p.strip_prefix("/").unwrap_or(p));
        self.config_dir = reroot(&self.config_dir);
        self.cert_dir = reroot(&self.cert_dir);
        self.cert_source_dir = reroot(&self.cert_source_dir);
        self
    }

    /// Use the same owner and group for the config and trust files.
    pub fn owned_by(mut self, owner: &str, group: &str) -> Self {
        self.owner = owner.to_string();
        self.group = group.to_string();
        self.cert_owner = owner.to_string();
        self.cert_group = group.to_string();
        self
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(&self.config_file)
    }

    pub fn cert_path(&self, name: &str) -> PathBuf {
        self.cert_dir.join(name)
    }

    pub fn cert_source_path(&self, name: &str) -> PathBuf {
        self.cert_source_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let debian = PlatformPolicy::debian();
        assert_eq!(debian.packages, vec!["ldap-utils"]);
        assert_eq!(debian.config_path(), Path::new("/etc/ldap/ldap.conf"));
        assert_eq!(debian.cert_dir, Path::new("/etc/ssl/certs"));

        let redhat = PlatformPolicy::redhat();
        assert_eq!(redhat.packages, vec!["openldap-clients"]);
        assert_eq!(
            redhat.config_path(),
            Path::new("/etc/openldap/ldap.conf")
        );
        assert_eq!(
            redhat.cert_path("ca.pem"),
            Path::new("/etc/openldap/cacerts/ca.pem")
        );
    }

    #[test]
    fn test_from_os_release() {
        let ubuntu = "NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\n";
        assert_eq!(
            PlatformPolicy::from_os_release(ubuntu)
                .expect("failed to detect")
                .family,
            OsFamily::Debian
        );

        let rocky = "NAME=\"Rocky Linux\"\nID=\"rocky\"\n\
                     ID_LIKE=\"rhel centos fedora\"\n";
        assert_eq!(
            PlatformPolicy::from_os_release(rocky)
                .expect("failed to detect")
                .family,
            OsFamily::RedHat
        );

        let arch = "NAME=\"Arch Linux\"\nID=arch\n";
        assert!(matches!(
            PlatformPolicy::from_os_release(arch),
            Err(PlatformError::UnsupportedFamily(id)) if id == "arch"
        ));
    }

    #[test]
    fn test_rooted_at() {
        let policy = PlatformPolicy::redhat()
            .rooted_at(Path::new("/srv/image"))
            .owned_by("ldap", "ldap");
        assert_eq!(policy.config_dir, Path::new("/srv/image/etc/openldap"));
        assert_eq!(
            policy.cert_dir,
            Path::new("/srv/image/etc/openldap/cacerts")
        );
        assert_eq!(
            policy.cert_source_path("ca.pem"),
            Path::new("/srv/image/etc/ldap_client/certs/ca.pem")
        );
        assert_eq!(policy.cert_owner, "ldap");
        assert_eq!(policy.packages, vec!["openldap-clients"]);
    }
}
