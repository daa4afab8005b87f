// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Parameter loading error: {0}")]
    ConfigLoad(#[from] crate::config::ConfigLoadError),
    #[error("Validation error: {0}")]
    Validation(#[from] crate::config::ValidationError),
    #[error("Platform error: {0}")]
    Platform(#[from] crate::platform::PlatformError),
    #[error("Planning error: {0}")]
    Planning(#[from] crate::plan::PlanningError),
    #[error("Execution error: {0}")]
    Execution(#[from] crate::executor::ExecutionError),
}

impl Error {
    /// The per-action report of a run that reached the host, if any.
    pub fn report(&self) -> Option<&crate::executor::ApplyReport> {
        match self {
            Error::Execution(e) => Some(e.report()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
