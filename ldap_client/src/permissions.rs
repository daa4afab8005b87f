// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors

use libc::{gid_t, uid_t};
use log::*;
use std::{
    ffi::{CStr, CString},
    fs, io,
    os::unix::{
        ffi::OsStrExt,
        fs::{MetadataExt, PermissionsExt},
    },
    path::Path,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PermissionError {
    /// Failed to change file ownership
    #[error("Failed to change file {path} owner")]
    ChOwn {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Failed to convert name to CString
    #[error("Failed to convert {0} to CString")]
    CStringConversion(String),

    /// Error getting GID from group name
    #[error("Could not get GID from group name {group}: {error:?}")]
    GetGrNam {
        group: String,
        #[source]
        error: io::Error,
    },

    /// Error getting UID from user name
    #[error("Could not get UID from user name {user}: {error:?}")]
    GetPWNam {
        user: String,
        #[source]
        error: io::Error,
    },

    /// Error getting names for the running process
    #[error("Could not get user or group name of the running process")]
    CurrentIds(#[source] io::Error),

    /// Error setting mode for file
    #[error("Could not set permissions of {path} to mode {mode:#o}")]
    SetMode {
        path: String,
        mode: u32,
        #[source]
        source: io::Error,
    },
}

/// Numeric ids an `(owner, group)` name pair resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserIds {
    pub uid: uid_t,
    pub gid: gid_t,
}

impl UserIds {
    /// Resolve owner and group names through the system user database.
    pub fn lookup(user: &str, group: &str) -> Result<Self, PermissionError> {
        // Get gid from group name
        let gid = if let Ok(g_cstr) = CString::new(group.as_bytes()) {
            let p = unsafe { libc::getgrnam(g_cstr.as_ptr()) };
            if p.is_null() {
                let e = io::Error::last_os_error();
                return Err(PermissionError::GetGrNam {
                    group: group.to_string(),
                    error: e,
                });
            }
            unsafe { (*p).gr_gid }
        } else {
            return Err(PermissionError::CStringConversion(
                group.to_string(),
            ));
        };

        // Get uid from user name
        let uid = if let Ok(u_cstr) = CString::new(user.as_bytes()) {
            let p = unsafe { libc::getpwnam(u_cstr.as_ptr()) };
            if p.is_null() {
                let e = io::Error::last_os_error();
                return Err(PermissionError::GetPWNam {
                    user: user.to_string(),
                    error: e,
                });
            }
            unsafe { (*p).pw_uid }
        } else {
            return Err(PermissionError::CStringConversion(user.to_string()));
        };

        Ok(UserIds { uid, gid })
    }

    pub fn matches(&self, metadata: &fs::Metadata) -> bool {
        metadata.uid() == self.uid && metadata.gid() == self.gid
    }
}

/// User and group names of the running process.
pub fn current_user_group() -> Result<(String, String), PermissionError> {
    let passwd = unsafe { libc::getpwuid(libc::geteuid()) };
    if passwd.is_null() {
        return Err(PermissionError::CurrentIds(io::Error::last_os_error()));
    }
    let user = unsafe { CStr::from_ptr((*passwd).pw_name) }
        .to_string_lossy()
        .into_owned();

    let group = unsafe { libc::getgrgid(libc::getegid()) };
    if group.is_null() {
        return Err(PermissionError::CurrentIds(io::Error::last_os_error()));
    }
    let group = unsafe { CStr::from_ptr((*group).gr_name) }
        .to_string_lossy()
        .into_owned();

    Ok((user, group))
}

pub fn chown(path: &Path, ids: &UserIds) -> Result<(), PermissionError> {
    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        PermissionError::CStringConversion(path.display().to_string())
    })?;
    if unsafe { libc::chown(c_path.as_ptr(), ids.uid, ids.gid) } != 0 {
        let source = io::Error::last_os_error();
        error!("Failed to change file {} owner.", path.display());
        return Err(PermissionError::ChOwn {
            path: path.display().to_string(),
            source,
        });
    }

    debug!(
        "Changed file {} owner to {}:{}",
        path.display(),
        ids.uid,
        ids.gid
    );
    Ok(())
}

/// Set file permissions to the given mode
pub fn set_mode(path: &Path, mode: u32) -> Result<(), PermissionError> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| {
        PermissionError::SetMode {
            path: path.display().to_string(),
            mode,
            source: e,
        }
    })
}

/// Permission bits of `metadata`, without the file type.
pub fn mode_of(metadata: &fs::Metadata) -> u32 {
    metadata.permissions().mode() & 0o7777
}
