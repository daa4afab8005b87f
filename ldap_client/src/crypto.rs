// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors

use openssl::x509::X509;
use serde_derive::Serialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    /// Read error
    #[error("failed to read {path}")]
    IOReadError {
        path: String,
        source: std::io::Error,
    },

    /// Error decoding certificate from PEM
    #[error("failed to parse PEM certificate {path}")]
    X509FromPEMError {
        path: String,
        source: openssl::error::ErrorStack,
    },
}

/// How a trust-anchor link name is derived from a certificate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustHash {
    /// The OpenSSL subject-name hash, as used by `-CApath` lookups.
    #[default]
    SubjectName,
}

impl TrustHash {
    pub fn compute(&self, cert: &X509) -> String {
        match self {
            TrustHash::SubjectName => {
                format!("{:08x}", cert.subject_name_hash())
            }
        }
    }

    /// Name of the first link slot (`<hash>.0`) for the certificate at `path`.
    pub fn link_name(&self, path: &Path) -> Result<String, CryptoError> {
        let cert = load_x509_pem(path)?;
        Ok(format!("{}.0", self.compute(&cert)))
    }
}

pub fn load_x509_pem(path: &Path) -> Result<X509, CryptoError> {
    let contents =
        std::fs::read(path).map_err(|source| CryptoError::IOReadError {
            path: path.display().to_string(),
            source,
        })?;

    X509::from_pem(&contents).map_err(|source| CryptoError::X509FromPEMError {
        path: path.display().to_string(),
        source,
    })
}

/// Whether `name` looks like a hash link (`<8 hex digits>.<n>`).
pub fn is_hash_link_name(name: &str) -> bool {
    match name.split_once('.') {
        Some((hash, slot)) => {
            hash.len() == 8
                && hash.chars().all(|c| c.is_ascii_hexdigit())
                && !slot.is_empty()
                && slot.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}
