// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors
use config::ConfigError;
use thiserror::Error;

/// Failures while collecting raw parameters from files and the environment.
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    // Error from config crate
    #[error("Error from the config crate")]
    Config(#[from] ConfigError),

    // Glob error
    #[error("Glob pattern error")]
    GlobPattern(#[from] glob::PatternError),

    // Missing configuration file set in LDAP_CLIENT_CONFIG
    #[error("Missing file {file} set in 'LDAP_CLIENT_CONFIG' environment variable")]
    MissingEnvConfigFile { file: String },
}

/// Rejections raised by the resolver before anything is planned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required option '{0}' not set")]
    MissingRequired(&'static str),

    #[error("Option 'ssl' is enabled but 'ssl_cert' is not set")]
    MissingCert,

    #[error("Invalid ssl_cert '{0}', expected a file name without directories")]
    InvalidCertName(String),

    #[error("Invalid scope '{0}', expected one of 'base', 'one' or 'sub'")]
    InvalidScope(String),

    #[error("Invalid port {0}, expected a value between 1 and 65535")]
    InvalidPort(i64),

    #[error("Invalid ensure '{0}', expected 'present' or 'absent'")]
    InvalidEnsure(String),

    #[error("Invalid LDAP protocol version {0}, expected 2 or 3")]
    InvalidVersion(i64),

    #[error("Invalid value {value} for option '{field}', expected a positive integer")]
    NotPositive { field: &'static str, value: i64 },
}
