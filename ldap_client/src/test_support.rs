// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors

//! In-memory collaborators and fixtures shared by the unit tests.

use crate::{
    config::Ensure,
    executor::CancellationToken,
    host::{HostError, PackageManager, SubsystemCollaborator},
    permissions::current_user_group,
    platform::PlatformPolicy,
    subsystem::SubsystemParams,
};
use openssl::{
    asn1::Asn1Time,
    ec::{EcGroup, EcKey},
    hash::MessageDigest,
    nid::Nid,
    pkey::PKey,
    x509::{X509Name, X509},
};
use std::{
    cell::RefCell,
    collections::HashSet,
    path::Path,
    rc::Rc,
};

#[derive(Debug, Default, Clone)]
pub struct MemoryPackages {
    pub installed: Rc<RefCell<HashSet<String>>>,
    pub failing: HashSet<String>,
}

impl PackageManager for MemoryPackages {
    fn is_installed(&self, name: &str) -> Result<bool, HostError> {
        Ok(self.installed.borrow().contains(name))
    }

    fn ensure(&mut self, name: &str, state: Ensure) -> Result<(), HostError> {
        if self.failing.contains(name) {
            return Err(HostError::Package {
                package: name.to_string(),
                message: "simulated failure".to_string(),
            });
        }
        let mut installed = self.installed.borrow_mut();
        match state {
            Ensure::Present => {
                let _ = installed.insert(name.to_string());
            }
            Ensure::Absent => {
                let _ = installed.remove(name);
            }
        }
        Ok(())
    }
}

/// Installs like [`MemoryPackages`], then cancels the run it is part of.
#[derive(Debug, Clone)]
pub struct CancellingPackages {
    pub packages: MemoryPackages,
    pub token: CancellationToken,
}

impl PackageManager for CancellingPackages {
    fn is_installed(&self, name: &str) -> Result<bool, HostError> {
        self.packages.is_installed(name)
    }

    fn ensure(&mut self, name: &str, state: Ensure) -> Result<(), HostError> {
        self.packages.ensure(name, state)?;
        self.token.cancel();
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingSubsystem {
    pub applied: Rc<RefCell<Vec<SubsystemParams>>>,
}

impl SubsystemCollaborator for RecordingSubsystem {
    fn is_converged(
        &self,
        params: &SubsystemParams,
    ) -> Result<bool, HostError> {
        Ok(self.applied.borrow().last() == Some(params))
    }

    fn apply(&mut self, params: &SubsystemParams) -> Result<(), HostError> {
        self.applied.borrow_mut().push(params.clone());
        Ok(())
    }
}

/// A Debian-shaped policy rooted in `root` and owned by the test user.
pub fn test_policy(root: &Path) -> PlatformPolicy {
    let (user, group) =
        current_user_group().expect("failed to get current user");
    PlatformPolicy::debian()
        .rooted_at(root)
        .owned_by(&user, &group)
}

/// Write a self-signed PEM certificate with the given common name.
pub fn write_test_cert(path: &Path, common_name: &str) -> X509 {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)
        .expect("failed to create EC group");
    let key = PKey::from_ec_key(
        EcKey::generate(&group).expect("failed to generate EC key"),
    )
    .expect("failed to wrap EC key");

    let mut name = X509Name::builder().expect("failed to create name");
    name.append_entry_by_nid(Nid::COMMONNAME, common_name)
        .expect("failed to set common name");
    let name = name.build();

    let mut builder = X509::builder().expect("failed to create builder");
    builder.set_version(2).expect("failed to set version");
    builder.set_subject_name(&name).expect("failed to set subject");
    builder.set_issuer_name(&name).expect("failed to set issuer");
    builder.set_pubkey(&key).expect("failed to set public key");
    builder
        .set_not_before(&Asn1Time::days_from_now(0).expect("not before"))
        .expect("failed to set not before");
    builder
        .set_not_after(&Asn1Time::days_from_now(365).expect("not after"))
        .expect("failed to set not after");
    builder
        .sign(&key, MessageDigest::sha256())
        .expect("failed to sign");
    let cert = builder.build();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create dir");
    }
    std::fs::write(path, cert.to_pem().expect("failed to encode PEM"))
        .expect("failed to write certificate");
    cert
}
