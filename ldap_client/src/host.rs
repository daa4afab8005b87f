// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors

//! Collaborators the executor talks to: the package database and the
//! name-service/authentication subsystems. Filesystem actions are applied
//! directly by the executor.

use crate::{
    config::Ensure, crypto::CryptoError, permissions::PermissionError,
    platform::OsFamily, subsystem::SubsystemParams,
};
use log::*;
use std::{
    collections::BTreeMap,
    fmt, io,
    process::{Command, Output},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("I/O error on {path}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to persist {path}")]
    Persist {
        path: String,
        #[source]
        source: tempfile::PersistError,
    },

    #[error("{0} exists but is not a directory")]
    NotADirectory(String),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("Package manager failed for {package}: {message}")]
    Package { package: String, message: String },

    #[error("Subsystem {name} failed: {message}")]
    Subsystem { name: String, message: String },

    #[error("No collaborator registered for subsystem {0}")]
    NoCollaborator(String),
}

impl HostError {
    pub(crate) fn io(path: &std::path::Path, source: io::Error) -> Self {
        HostError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Narrow interface to the host package database.
pub trait PackageManager {
    fn is_installed(&self, name: &str) -> Result<bool, HostError>;

    fn ensure(&mut self, name: &str, state: Ensure) -> Result<(), HostError>;
}

/// An external nsswitch, PAM or SSSD integration.
pub trait SubsystemCollaborator {
    /// Whether the subsystem already reflects `params`.
    fn is_converged(&self, params: &SubsystemParams)
        -> Result<bool, HostError>;

    fn apply(&mut self, params: &SubsystemParams) -> Result<(), HostError>;
}

/// Package manager driven through the distribution's command line tools.
#[derive(Debug, Clone, Copy)]
pub struct SystemPackageManager {
    family: OsFamily,
}

impl SystemPackageManager {
    pub fn new(family: OsFamily) -> Self {
        SystemPackageManager { family }
    }

    fn run(
        &self,
        package: &str,
        program: &str,
        args: &[&str],
    ) -> Result<Output, HostError> {
        debug!("Running {program} {}", args.join(" "));
        Command::new(program)
            .args(args)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .output()
            .map_err(|e| HostError::Package {
                package: package.to_string(),
                message: format!("could not run {program}: {e}"),
            })
    }
}

impl PackageManager for SystemPackageManager {
    fn is_installed(&self, name: &str) -> Result<bool, HostError> {
        match self.family {
            OsFamily::Debian => {
                let output = self.run(
                    name,
                    "dpkg-query",
                    &["-W", "-f=${Status}", name],
                )?;
                Ok(output.status.success()
                    && String::from_utf8_lossy(&output.stdout)
                        .contains("install ok installed"))
            }
            OsFamily::RedHat => {
                let output = self.run(name, "rpm", &["-q", name])?;
                Ok(output.status.success())
            }
        }
    }

    fn ensure(&mut self, name: &str, state: Ensure) -> Result<(), HostError> {
        let (program, verb) = match (self.family, state) {
            (OsFamily::Debian, Ensure::Present) => ("apt-get", "install"),
            (OsFamily::Debian, Ensure::Absent) => ("apt-get", "remove"),
            (OsFamily::RedHat, Ensure::Present) => ("yum", "install"),
            (OsFamily::RedHat, Ensure::Absent) => ("yum", "remove"),
        };
        let output = self.run(name, program, &["-y", verb, name])?;
        if !output.status.success() {
            return Err(HostError::Package {
                package: name.to_string(),
                message: format!(
                    "{program} {verb} exited with {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        info!("Package {name} {state}");
        Ok(())
    }
}

/// The live host as seen by the executor.
pub struct Host {
    packages: Box<dyn PackageManager>,
    subsystems: BTreeMap<String, Box<dyn SubsystemCollaborator>>,
}

impl Host {
    pub fn new(packages: impl PackageManager + 'static) -> Self {
        Host {
            packages: Box::new(packages),
            subsystems: BTreeMap::new(),
        }
    }

    /// Register the collaborator applying bundles for subsystem `name`.
    pub fn with_subsystem(
        mut self,
        name: &str,
        collaborator: impl SubsystemCollaborator + 'static,
    ) -> Self {
        let _ = self
            .subsystems
            .insert(name.to_string(), Box::new(collaborator));
        self
    }

    pub fn packages(&self) -> &dyn PackageManager {
        self.packages.as_ref()
    }

    pub fn packages_mut(&mut self) -> &mut dyn PackageManager {
        self.packages.as_mut()
    }

    pub fn subsystem_mut(
        &mut self,
        name: &str,
    ) -> Result<&mut (dyn SubsystemCollaborator + 'static), HostError> {
        self.subsystems
            .get_mut(name)
            .map(|s| s.as_mut())
            .ok_or_else(|| HostError::NoCollaborator(name.to_string()))
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("subsystems", &self.subsystems.keys().collect::<Vec<_>>())
            .finish()
    }
}
