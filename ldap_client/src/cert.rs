// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors
use crate::{
    config::ResolvedConfig,
    crypto::TrustHash,
    plan::{ActionKind, FileContent},
    platform::{PlatformPolicy, CERT_FILE_MODE},
};
use log::debug;

/// Plan the trust material of a run: the certificate file and its hash link.
///
/// Nothing is planned unless `ssl` is enabled; a `ssl_cert` given without
/// `ssl` is ignored. The link name depends on the installed certificate, so
/// only the hashing function is recorded here and the name is computed when
/// the action is applied.
pub fn plan(cfg: &ResolvedConfig, policy: &PlatformPolicy) -> Vec<ActionKind> {
    let name = match (cfg.ssl, cfg.ssl_cert.as_deref()) {
        (true, Some(name)) => name,
        (false, Some(name)) => {
            debug!("Ignoring ssl_cert {name}: ssl is disabled");
            return Vec::new();
        }
        _ => return Vec::new(),
    };

    let path = policy.cert_path(name);
    vec![
        ActionKind::EnsureFileContent {
            path: path.clone(),
            content: FileContent::CopyFrom(policy.cert_source_path(name)),
            mode: CERT_FILE_MODE,
            owner: policy.cert_owner.clone(),
            group: policy.cert_group.clone(),
            state: cfg.ensure,
        },
        ActionKind::EnsureSymlinkFromHash {
            source: path,
            hash: TrustHash::SubjectName,
            state: cfg.ensure,
        },
    ]
}
