// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors

//! Plan executor.
//!
//! Actions run strictly in plan order. Each one first checks whether its
//! postcondition already holds and is skipped if so. The first failure
//! stops the run; earlier changes stay in place and a re-run picks up from
//! there. Cancellation is honoured between actions, never inside one.

use crate::{
    config::Ensure,
    crypto::{is_hash_link_name, TrustHash},
    host::{Host, HostError},
    permissions::{chown, mode_of, set_mode, UserIds},
    plan::{ActionKind, FileContent, Plan},
    subsystem::SubsystemParams,
};
use log::*;
use serde_derive::Serialize;
use std::{
    error::Error as StdError,
    fs,
    io::{self, Write},
    os::unix::fs::symlink,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Action #{index} '{action}' failed on {resource}")]
    ActionFailed {
        index: usize,
        action: String,
        resource: String,
        #[source]
        source: HostError,
        report: Box<ApplyReport>,
    },

    #[error("Convergence cancelled after {completed} action(s)")]
    Cancelled {
        completed: usize,
        report: Box<ApplyReport>,
    },
}

impl ExecutionError {
    /// What ran before the run stopped.
    pub fn report(&self) -> &ApplyReport {
        match self {
            ExecutionError::ActionFailed { report, .. }
            | ExecutionError::Cancelled { report, .. } => report,
        }
    }
}

/// Shared flag asking a running executor to stop before its next action.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The host was changed.
    Applied,
    /// The postcondition already held.
    Skipped,
    Failed {
        reason: String,
    },
    NotRun,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub action: String,
    pub resource: String,
    pub outcome: Outcome,
}

/// Structured result of a run, one record per planned action.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub actions: Vec<ActionRecord>,
    pub applied: usize,
    pub skipped: usize,
    pub success: bool,
}

impl ApplyReport {
    fn pending(plan: &Plan) -> Self {
        ApplyReport {
            actions: plan
                .iter()
                .map(|a| ActionRecord {
                    action: a.kind.to_string(),
                    resource: a.kind.resource(),
                    outcome: Outcome::NotRun,
                })
                .collect(),
            ..Default::default()
        }
    }

    /// The record of the action that stopped the run, if any.
    pub fn failed(&self) -> Option<&ActionRecord> {
        self.actions
            .iter()
            .find(|r| matches!(r.outcome, Outcome::Failed { .. }))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

enum Change {
    Applied,
    Unchanged,
}

pub struct Executor<'h> {
    host: &'h mut Host,
    cancel: CancellationToken,
}

impl<'h> Executor<'h> {
    pub fn new(host: &'h mut Host) -> Self {
        Executor {
            host,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Apply `plan` in order.
    ///
    /// # Errors
    ///
    /// `ActionFailed` when an action cannot be applied and `Cancelled` when
    /// the token was triggered; both carry the report of the actions run so
    /// far.
    pub fn apply(
        &mut self,
        plan: &Plan,
    ) -> Result<ApplyReport, ExecutionError> {
        let mut report = ApplyReport::pending(plan);

        for (index, action) in plan.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!(
                    "Convergence cancelled with {} of {} action(s) done",
                    index,
                    plan.len()
                );
                return Err(ExecutionError::Cancelled {
                    completed: index,
                    report: Box::new(report),
                });
            }

            match self.apply_action(&action.kind) {
                Ok(Change::Applied) => {
                    info!("Applied {}", action.kind);
                    report.actions[index].outcome = Outcome::Applied;
                    report.applied += 1;
                }
                Ok(Change::Unchanged) => {
                    debug!("Skipped {}: already in desired state", action.kind);
                    report.actions[index].outcome = Outcome::Skipped;
                    report.skipped += 1;
                }
                Err(source) => {
                    let reason = error_chain(&source);
                    error!("Failed {}: {}", action.kind, reason);
                    report.actions[index].outcome = Outcome::Failed { reason };
                    return Err(ExecutionError::ActionFailed {
                        index,
                        action: action.kind.to_string(),
                        resource: action.kind.resource(),
                        source,
                        report: Box::new(report),
                    });
                }
            }
        }

        report.success = true;
        info!(
            "Convergence finished: {} applied, {} skipped",
            report.applied, report.skipped
        );
        Ok(report)
    }

    fn apply_action(
        &mut self,
        kind: &ActionKind,
    ) -> Result<Change, HostError> {
        match kind {
            ActionKind::EnsurePackage { name, state } => {
                self.ensure_package(name, *state)
            }
            ActionKind::EnsureDirectory { path, state } => {
                ensure_directory(path, *state)
            }
            ActionKind::EnsureFileContent {
                path,
                content,
                mode,
                owner,
                group,
                state: Ensure::Present,
            } => ensure_file(path, content, *mode, owner, group),
            ActionKind::EnsureFileContent {
                path,
                state: Ensure::Absent,
                ..
            } => remove_file(path),
            ActionKind::EnsureSymlinkFromHash {
                source,
                hash,
                state: Ensure::Present,
            } => ensure_hash_link(source, hash),
            ActionKind::EnsureSymlinkFromHash {
                source,
                state: Ensure::Absent,
                ..
            } => remove_hash_links(source),
            ActionKind::InvokeSubsystem { name, params } => {
                self.invoke_subsystem(name, params)
            }
        }
    }

    fn ensure_package(
        &mut self,
        name: &str,
        state: Ensure,
    ) -> Result<Change, HostError> {
        let packages = self.host.packages_mut();
        if packages.is_installed(name)? == state.is_present() {
            return Ok(Change::Unchanged);
        }
        packages.ensure(name, state)?;
        Ok(Change::Applied)
    }

    fn invoke_subsystem(
        &mut self,
        name: &str,
        params: &SubsystemParams,
    ) -> Result<Change, HostError> {
        let subsystem = self.host.subsystem_mut(name)?;
        if subsystem.is_converged(params)? {
            return Ok(Change::Unchanged);
        }
        subsystem.apply(params)?;
        Ok(Change::Applied)
    }
}

fn ensure_directory(path: &Path, state: Ensure) -> Result<Change, HostError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => Some(m),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(HostError::io(path, e)),
    };

    match (state, metadata) {
        (Ensure::Present, None) => {
            fs::create_dir_all(path).map_err(|e| HostError::io(path, e))?;
            Ok(Change::Applied)
        }
        (Ensure::Absent, None) => Ok(Change::Unchanged),
        (Ensure::Present, Some(m)) if m.is_dir() => Ok(Change::Unchanged),
        // A link to a directory serves as one, but is never removed
        (Ensure::Present, Some(m))
            if m.file_type().is_symlink() && path.is_dir() =>
        {
            Ok(Change::Unchanged)
        }
        (Ensure::Absent, Some(m)) if m.file_type().is_symlink() => {
            warn!(
                "Leaving {} in place: it is a symbolic link",
                path.display()
            );
            Ok(Change::Unchanged)
        }
        (Ensure::Present, Some(_)) => {
            Err(HostError::NotADirectory(path.display().to_string()))
        }
        (Ensure::Absent, Some(m)) if !m.is_dir() => {
            Err(HostError::NotADirectory(path.display().to_string()))
        }
        (Ensure::Absent, Some(_)) => {
            let mut entries =
                fs::read_dir(path).map_err(|e| HostError::io(path, e))?;
            if entries.next().is_some() {
                warn!(
                    "Leaving directory {} in place: not empty",
                    path.display()
                );
                return Ok(Change::Unchanged);
            }
            fs::remove_dir(path).map_err(|e| HostError::io(path, e))?;
            Ok(Change::Applied)
        }
    }
}

fn ensure_file(
    path: &Path,
    content: &FileContent,
    mode: u32,
    owner: &str,
    group: &str,
) -> Result<Change, HostError> {
    let desired = match content {
        FileContent::Text(text) => text.as_bytes().to_vec(),
        FileContent::CopyFrom(source) => {
            fs::read(source).map_err(|e| HostError::io(source, e))?
        }
    };
    let ids = UserIds::lookup(owner, group)?;

    let metadata = match fs::metadata(path) {
        Ok(m) => Some(m),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(HostError::io(path, e)),
    };
    let content_ok = metadata.as_ref().is_some_and(|m| m.is_file())
        && fs::read(path).map_err(|e| HostError::io(path, e))? == desired;
    let mode_ok = metadata.as_ref().is_some_and(|m| mode_of(m) == mode);
    let owner_ok = metadata.as_ref().is_some_and(|m| ids.matches(m));

    if content_ok && mode_ok && owner_ok {
        return Ok(Change::Unchanged);
    }

    if content_ok {
        if !mode_ok {
            set_mode(path, mode)?;
        }
        if !owner_ok {
            chown(path, &ids)?;
        }
        return Ok(Change::Applied);
    }

    // Replace the whole file so readers never see partial content
    let parent = path.parent().unwrap_or_else(|| Path::new("/"));
    let mut tmp =
        NamedTempFile::new_in(parent).map_err(|e| HostError::io(parent, e))?;
    if let Err(e) = tmp.write_all(&desired).and_then(|_| tmp.flush()) {
        return Err(HostError::io(tmp.path(), e));
    }
    set_mode(tmp.path(), mode)?;
    let tmp_metadata =
        fs::metadata(tmp.path()).map_err(|e| HostError::io(tmp.path(), e))?;
    if !ids.matches(&tmp_metadata) {
        chown(tmp.path(), &ids)?;
    }
    let _ = tmp.persist(path).map_err(|e| HostError::Persist {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(Change::Applied)
}

fn remove_file(path: &Path) -> Result<Change, HostError> {
    match fs::symlink_metadata(path) {
        Ok(_) => {
            fs::remove_file(path).map_err(|e| HostError::io(path, e))?;
            Ok(Change::Applied)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Change::Unchanged),
        Err(e) => Err(HostError::io(path, e)),
    }
}

fn ensure_hash_link(
    source: &Path,
    hash: &TrustHash,
) -> Result<Change, HostError> {
    let link = source.with_file_name(hash.link_name(source)?);
    match fs::symlink_metadata(&link) {
        Ok(_) => {
            debug!("{} already exists", link.display());
            Ok(Change::Unchanged)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            // Relative, so the link survives a change of root
            let target = source.file_name().map(Path::new).unwrap_or(source);
            symlink(target, &link).map_err(|e| HostError::io(&link, e))?;
            Ok(Change::Applied)
        }
        Err(e) => Err(HostError::io(&link, e)),
    }
}

// The certificate may already be gone, so links are found by target rather
// than by recomputing the hash.
fn remove_hash_links(source: &Path) -> Result<Change, HostError> {
    let dir = source.parent().unwrap_or_else(|| Path::new("/"));
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(Change::Unchanged)
        }
        Err(e) => return Err(HostError::io(dir, e)),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| HostError::io(dir, e))?;
        let path = entry.path();
        if !is_hash_link_name(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let file_type =
            entry.file_type().map_err(|e| HostError::io(&path, e))?;
        if !file_type.is_symlink() {
            continue;
        }
        let target =
            fs::read_link(&path).map_err(|e| HostError::io(&path, e))?;
        if dir.join(target) == source {
            fs::remove_file(&path).map_err(|e| HostError::io(&path, e))?;
            removed += 1;
        }
    }

    Ok(if removed > 0 {
        Change::Applied
    } else {
        Change::Unchanged
    })
}

fn error_chain(error: &dyn StdError) -> String {
    let mut reason = error.to_string();
    let mut source = error.source();
    while let Some(e) = source {
        reason.push_str(": ");
        reason.push_str(&e.to_string());
        source = e.source();
    }
    reason
}
