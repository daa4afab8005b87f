// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors

//! Action planner.
//!
//! Actions are collected with explicit predecessor edges and then ordered
//! with a stable topological sort, so the position of every action in a
//! [`Plan`] satisfies its dependencies and ties keep insertion order.
//!
//! For `ensure = present` the plan is:
//!
//! 1. client packages
//! 2. directories (parents before children)
//! 3. trust file, then its hash link
//! 4. the rendered configuration file
//! 5. subsystem invocations, after every file and package action
//!
//! For `ensure = absent` file and link removals come first, subsystem
//! invocations next, then directories (children before parents) and package
//! removal last.

use crate::{
    config::{Ensure, ResolvedConfig},
    crypto::TrustHash,
    platform::{PlatformPolicy, CONFIG_FILE_MODE},
    subsystem::{SubsystemInvocation, SubsystemParams, KNOWN_SUBSYSTEMS},
};
use log::*;
use serde_derive::Serialize;
use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanningError {
    #[error("Dependency cycle between actions: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    #[error("Action '{action}' depends on unknown action #{dependency}")]
    UnknownDependency { action: String, dependency: usize },

    #[error("Unknown subsystem '{0}'")]
    UnknownSubsystem(String),

    #[error("Hash link for {0} has no matching certificate file action")]
    OrphanLink(String),
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
pub struct ActionId(usize);

impl ActionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Desired bytes of a managed file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileContent {
    Text(String),
    /// Copied from another file, read when the action is applied.
    CopyFrom(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    EnsurePackage {
        name: String,
        state: Ensure,
    },
    EnsureDirectory {
        path: PathBuf,
        state: Ensure,
    },
    EnsureFileContent {
        path: PathBuf,
        content: FileContent,
        mode: u32,
        owner: String,
        group: String,
        state: Ensure,
    },
    /// Link `<hash>.0` next to `source`, the hash computed at apply time.
    EnsureSymlinkFromHash {
        source: PathBuf,
        hash: TrustHash,
        state: Ensure,
    },
    InvokeSubsystem {
        name: String,
        params: SubsystemParams,
    },
}

impl ActionKind {
    /// The path or name the action manages.
    pub fn resource(&self) -> String {
        match self {
            ActionKind::EnsurePackage { name, .. }
            | ActionKind::InvokeSubsystem { name, .. } => name.clone(),
            ActionKind::EnsureDirectory { path, .. }
            | ActionKind::EnsureFileContent { path, .. }
            | ActionKind::EnsureSymlinkFromHash { source: path, .. } => {
                path.display().to_string()
            }
        }
    }

    fn removes(&self) -> bool {
        match self {
            ActionKind::EnsurePackage { state, .. }
            | ActionKind::EnsureDirectory { state, .. }
            | ActionKind::EnsureFileContent { state, .. }
            | ActionKind::EnsureSymlinkFromHash { state, .. } => {
                !state.is_present()
            }
            ActionKind::InvokeSubsystem { .. } => false,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::EnsurePackage { name, state } => {
                write!(f, "package {name} {state}")
            }
            ActionKind::EnsureDirectory { path, state } => {
                write!(f, "directory {} {state}", path.display())
            }
            ActionKind::EnsureFileContent { path, state, .. } => {
                write!(f, "file {} {state}", path.display())
            }
            ActionKind::EnsureSymlinkFromHash { source, state, .. } => {
                write!(f, "hash link to {} {state}", source.display())
            }
            ActionKind::InvokeSubsystem { name, .. } => {
                write!(f, "subsystem {name}")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Action {
    pub id: ActionId,
    pub kind: ActionKind,
    pub depends_on: Vec<ActionId>,
}

/// Topologically ordered actions. Only [`PlanBuilder::finish`] makes one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    actions: Vec<Action>,
}

impl Plan {
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    /// Position of the action with the given id in execution order.
    pub fn position(&self, id: ActionId) -> Option<usize> {
        self.actions.iter().position(|a| a.id == id)
    }

    /// Position of the first action matching `pred`.
    pub fn position_of(
        &self,
        pred: impl Fn(&ActionKind) -> bool,
    ) -> Option<usize> {
        self.actions.iter().position(|a| pred(&a.kind))
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

#[derive(Debug, Default)]
pub struct PlanBuilder {
    actions: Vec<Action>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an action that may only run after every id in `depends_on`.
    pub fn push(
        &mut self,
        kind: ActionKind,
        depends_on: &[ActionId],
    ) -> ActionId {
        let id = ActionId(self.actions.len());
        let mut deps = depends_on.to_vec();
        deps.sort();
        deps.dedup();
        self.actions.push(Action {
            id,
            kind,
            depends_on: deps,
        });
        id
    }

    /// Validate the recorded actions and order them.
    ///
    /// Package removals are dropped when another action of the same plan
    /// wants that package present.
    pub fn finish(self) -> Result<Plan, PlanningError> {
        let count = self.actions.len();
        for action in &self.actions {
            if let ActionKind::InvokeSubsystem { name, .. } = &action.kind {
                if !KNOWN_SUBSYSTEMS.contains(&name.as_str()) {
                    return Err(PlanningError::UnknownSubsystem(name.clone()));
                }
            }
            if let Some(dep) =
                action.depends_on.iter().find(|d| d.index() >= count)
            {
                return Err(PlanningError::UnknownDependency {
                    action: action.kind.to_string(),
                    dependency: dep.index(),
                });
            }
        }

        let required: HashSet<&str> = self
            .actions
            .iter()
            .filter_map(|a| match &a.kind {
                ActionKind::EnsurePackage {
                    name,
                    state: Ensure::Present,
                } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        let dropped: HashSet<ActionId> = self
            .actions
            .iter()
            .filter(|a| match &a.kind {
                ActionKind::EnsurePackage {
                    name,
                    state: Ensure::Absent,
                } => required.contains(name.as_str()),
                _ => false,
            })
            .map(|a| a.id)
            .collect();
        for id in &dropped {
            info!(
                "Not removing {}: still required by this plan",
                self.actions[id.index()].kind.resource()
            );
        }

        let mut pending: Vec<Action> = self
            .actions
            .into_iter()
            .filter(|a| !dropped.contains(&a.id))
            .map(|mut a| {
                a.depends_on.retain(|d| !dropped.contains(d));
                a
            })
            .collect();

        // Kahn's algorithm, always taking the earliest ready action
        let mut done: HashSet<ActionId> = dropped;
        let mut ordered = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let ready = pending
                .iter()
                .position(|a| a.depends_on.iter().all(|d| done.contains(d)));
            match ready {
                Some(i) => {
                    let action = pending.remove(i);
                    let _ = done.insert(action.id);
                    ordered.push(action);
                }
                None => {
                    return Err(PlanningError::DependencyCycle(
                        pending.iter().map(|a| a.kind.to_string()).collect(),
                    ));
                }
            }
        }

        Ok(Plan { actions: ordered })
    }
}

/// Assemble the plan of a convergence run.
///
/// `cert_actions` come from [`crate::cert::plan`], `rendered` from
/// [`crate::render::render`] and `invocations` from
/// [`crate::subsystem::compose`].
pub fn build_plan(
    cfg: &ResolvedConfig,
    policy: &PlatformPolicy,
    cert_actions: Vec<ActionKind>,
    rendered: String,
    invocations: Vec<SubsystemInvocation>,
) -> Result<Plan, PlanningError> {
    let mut directories = vec![policy.config_dir.clone()];
    if !cert_actions.is_empty() && policy.cert_dir != policy.config_dir {
        directories.push(policy.cert_dir.clone());
    }

    let config_file = ActionKind::EnsureFileContent {
        path: policy.config_path(),
        content: FileContent::Text(rendered),
        mode: CONFIG_FILE_MODE,
        owner: policy.owner.clone(),
        group: policy.group.clone(),
        state: cfg.ensure,
    };
    let invocations: Vec<ActionKind> = invocations
        .into_iter()
        .map(|i| ActionKind::InvokeSubsystem {
            name: i.name,
            params: i.params,
        })
        .collect();

    let plan = match cfg.ensure {
        Ensure::Present => plan_present(
            policy,
            &directories,
            cert_actions,
            config_file,
            invocations,
        )?,
        Ensure::Absent => plan_absent(
            policy,
            &directories,
            cert_actions,
            config_file,
            invocations,
        )?,
    };
    debug!("Planned {} action(s) for ensure={}", plan.len(), cfg.ensure);
    Ok(plan)
}

fn plan_present(
    policy: &PlatformPolicy,
    directories: &[PathBuf],
    cert_actions: Vec<ActionKind>,
    config_file: ActionKind,
    invocations: Vec<ActionKind>,
) -> Result<Plan, PlanningError> {
    let mut builder = PlanBuilder::new();

    let packages: Vec<ActionId> = policy
        .packages
        .iter()
        .map(|name| {
            builder.push(
                ActionKind::EnsurePackage {
                    name: name.clone(),
                    state: Ensure::Present,
                },
                &[],
            )
        })
        .collect();

    let mut dir_ids: Vec<(PathBuf, ActionId)> = Vec::new();
    for dir in directories {
        let mut deps = packages.clone();
        deps.extend(containing(&dir_ids, dir));
        let id = builder.push(
            ActionKind::EnsureDirectory {
                path: dir.clone(),
                state: Ensure::Present,
            },
            &deps,
        );
        dir_ids.push((dir.clone(), id));
    }

    let mut files: Vec<(PathBuf, ActionId)> = Vec::new();
    let mut all = packages.clone();
    all.extend(dir_ids.iter().map(|(_, id)| *id));
    for kind in cert_actions.into_iter().chain(std::iter::once(config_file)) {
        let id = push_file_like(
            &mut builder,
            kind,
            &packages,
            &dir_ids,
            &files,
        )?;
        if let Some(path) = file_path(&builder, id) {
            files.push((path, id));
        }
        all.push(id);
    }

    for kind in invocations {
        let _ = builder.push(kind, &all);
    }

    builder.finish()
}

fn plan_absent(
    policy: &PlatformPolicy,
    directories: &[PathBuf],
    cert_actions: Vec<ActionKind>,
    config_file: ActionKind,
    invocations: Vec<ActionKind>,
) -> Result<Plan, PlanningError> {
    let mut builder = PlanBuilder::new();

    let mut files: Vec<(PathBuf, ActionId)> = Vec::new();
    let mut removals = Vec::new();
    for kind in std::iter::once(config_file).chain(cert_actions) {
        let id = push_file_like(&mut builder, kind, &[], &[], &files)?;
        if let Some(path) = file_path(&builder, id) {
            files.push((path, id));
        }
        removals.push(id);
    }

    let mut subsystems = Vec::new();
    for kind in invocations {
        subsystems.push(builder.push(kind, &removals));
    }

    // Deepest directories go first
    let mut dirs = directories.to_vec();
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    let mut dir_ids: Vec<(PathBuf, ActionId)> = Vec::new();
    for dir in dirs {
        let mut deps = removals.clone();
        deps.extend(
            dir_ids
                .iter()
                .filter(|(p, _)| p.starts_with(&dir))
                .map(|(_, id)| *id),
        );
        let id = builder.push(
            ActionKind::EnsureDirectory {
                path: dir.clone(),
                state: Ensure::Absent,
            },
            &deps,
        );
        dir_ids.push((dir, id));
    }

    let mut everything = removals;
    everything.extend(subsystems);
    everything.extend(dir_ids.iter().map(|(_, id)| *id));
    for name in &policy.packages {
        let _ = builder.push(
            ActionKind::EnsurePackage {
                name: name.clone(),
                state: Ensure::Absent,
            },
            &everything,
        );
    }

    builder.finish()
}

// Files and hash links: a link always waits for the action managing its
// certificate file.
fn push_file_like(
    builder: &mut PlanBuilder,
    kind: ActionKind,
    packages: &[ActionId],
    dirs: &[(PathBuf, ActionId)],
    files: &[(PathBuf, ActionId)],
) -> Result<ActionId, PlanningError> {
    let mut deps = packages.to_vec();
    match &kind {
        ActionKind::EnsureFileContent { path, .. } => {
            deps.extend(containing(dirs, path));
        }
        ActionKind::EnsureSymlinkFromHash { source, .. } => {
            let cert = files
                .iter()
                .find(|(p, _)| p == source)
                .map(|(_, id)| *id)
                .ok_or_else(|| {
                    PlanningError::OrphanLink(source.display().to_string())
                })?;
            deps.push(cert);
            deps.extend(containing(dirs, source));
        }
        _ => {}
    }
    if kind.removes() {
        trace!("Planning removal: {kind}");
    }
    Ok(builder.push(kind, &deps))
}

fn file_path(builder: &PlanBuilder, id: ActionId) -> Option<PathBuf> {
    match &builder.actions[id.index()].kind {
        ActionKind::EnsureFileContent { path, .. } => Some(path.clone()),
        _ => None,
    }
}

// Directory actions whose path is an ancestor of `path`.
fn containing(dirs: &[(PathBuf, ActionId)], path: &Path) -> Vec<ActionId> {
    dirs.iter()
        .filter(|(dir, _)| path != dir && path.starts_with(dir))
        .map(|(_, id)| *id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cert,
        config::{resolve, NssConfig, PamConfig, RawParams},
        render::render,
        subsystem::compose,
    };

    fn raw_ssl() -> RawParams {
        let mut raw =
            RawParams::new("ldap://ldap1 ldap://ldap2", "dc=example,dc=com");
        raw.ssl = Some(true);
        raw.ssl_cert = Some("ca.pem".into());
        raw
    }

    fn plan_for(raw: &RawParams, policy: &PlatformPolicy) -> Plan {
        let cfg = resolve(raw).expect("failed to resolve");
        let nss = NssConfig::resolve(raw).expect("failed to resolve nss");
        let pam = PamConfig::resolve(raw);
        build_plan(
            &cfg,
            policy,
            cert::plan(&cfg, policy),
            render(&cfg, policy),
            compose(&cfg, &nss, &pam),
        )
        .expect("failed to plan")
    }

    fn is_dir(kind: &ActionKind, suffix: &str) -> bool {
        matches!(
            kind,
            ActionKind::EnsureDirectory { path, .. } if path.ends_with(suffix)
        )
    }

    fn is_file(kind: &ActionKind, suffix: &str) -> bool {
        matches!(
            kind,
            ActionKind::EnsureFileContent { path, .. } if path.ends_with(suffix)
        )
    }

    fn describe(plan: &Plan) -> Vec<String> {
        plan.iter().map(|a| a.kind.to_string()).collect()
    }

    #[test]
    fn test_example_scenario_order() {
        let policy = PlatformPolicy::debian();
        let plan = plan_for(&raw_ssl(), &policy);
        assert_eq!(
            describe(&plan),
            vec![
                "package ldap-utils present",
                "directory /etc/ldap present",
                "directory /etc/ssl/certs present",
                "file /etc/ssl/certs/ca.pem present",
                "hash link to /etc/ssl/certs/ca.pem present",
                "file /etc/ldap/ldap.conf present",
            ]
        );

        match &plan.actions()[5].kind {
            ActionKind::EnsureFileContent {
                content: FileContent::Text(text),
                mode,
                ..
            } => {
                assert!(text.contains("ssl on"));
                assert!(text.contains("tls_cacertdir /etc/ssl/certs"));
                assert_eq!(*mode, 0o644);
            }
            other => panic!("unexpected action {other:?}"), //#[allow_ci]
        }
    }

    #[test]
    fn test_dependencies_respected() {
        let mut raw = raw_ssl();
        raw.nsswitch = Some(true);
        raw.pam = Some(true);
        raw.sssd = Some(true);
        for policy in [PlatformPolicy::debian(), PlatformPolicy::redhat()] {
            let plan = plan_for(&raw, &policy);
            for (index, action) in plan.iter().enumerate() {
                for dep in &action.depends_on {
                    let pos = plan.position(*dep).expect("missing dependency");
                    assert!(pos < index, "{} before {}", action.kind, pos);
                }
            }
        }
    }

    #[test]
    fn test_link_after_cert_file() {
        let policy = PlatformPolicy::redhat();
        for ensure in ["present", "absent"] {
            let mut raw = raw_ssl();
            raw.ensure = Some(ensure.into());
            let plan = plan_for(&raw, &policy);
            let link = plan
                .position_of(|k| {
                    matches!(k, ActionKind::EnsureSymlinkFromHash { .. })
                })
                .expect("no link action");
            let cert = plan
                .position_of(|k| is_file(k, "ca.pem"))
                .expect("no cert action");
            assert!(cert < link);
        }
    }

    #[test]
    fn test_nested_cert_dir_depends_on_config_dir() {
        let policy = PlatformPolicy::redhat();
        let plan = plan_for(&raw_ssl(), &policy);
        let config_dir = plan
            .position_of(|k| is_dir(k, "/etc/openldap"))
            .expect("no config dir");
        let cert_dir_action = &plan.actions()[config_dir + 1];
        assert!(is_dir(&cert_dir_action.kind, "/etc/openldap/cacerts"));
        assert!(cert_dir_action
            .depends_on
            .contains(&plan.actions()[config_dir].id));
    }

    #[test]
    fn test_config_file_independent_of_cert() {
        let plan = plan_for(&raw_ssl(), &PlatformPolicy::debian());
        let config = plan
            .iter()
            .find(|a| is_file(&a.kind, "ldap.conf"))
            .expect("no config file");
        for dep in &config.depends_on {
            let pos = plan.position(*dep).expect("missing dependency");
            assert!(matches!(
                plan.actions()[pos].kind,
                ActionKind::EnsurePackage { .. }
                    | ActionKind::EnsureDirectory { .. }
            ));
        }
    }

    #[test]
    fn test_no_ssl_plan() {
        let raw = RawParams::new("ldap://ldap1", "dc=example,dc=com");
        let plan = plan_for(&raw, &PlatformPolicy::debian());
        assert_eq!(
            describe(&plan),
            vec![
                "package ldap-utils present",
                "directory /etc/ldap present",
                "file /etc/ldap/ldap.conf present",
            ]
        );
    }

    #[test]
    fn test_subsystems_last() {
        let mut raw = raw_ssl();
        raw.nsswitch = Some(true);
        raw.pam = Some(true);
        let plan = plan_for(&raw, &PlatformPolicy::debian());
        let names = describe(&plan);
        assert_eq!(names[names.len() - 2], "subsystem nsswitch");
        assert_eq!(names[names.len() - 1], "subsystem pam");
        let last = &plan.actions()[plan.len() - 1];
        assert_eq!(last.depends_on.len(), plan.len() - 2);
    }

    #[test]
    fn test_absent_reversal() {
        let mut raw = raw_ssl();
        raw.ensure = Some("absent".into());
        raw.pam = Some(true);
        let plan = plan_for(&raw, &PlatformPolicy::debian());
        assert_eq!(
            describe(&plan),
            vec![
                "file /etc/ldap/ldap.conf absent",
                "file /etc/ssl/certs/ca.pem absent",
                "hash link to /etc/ssl/certs/ca.pem absent",
                "subsystem pam",
                "directory /etc/ssl/certs absent",
                "directory /etc/ldap absent",
                "package ldap-utils absent",
            ]
        );
        let package = &plan.actions()[plan.len() - 1];
        assert_eq!(package.depends_on.len(), plan.len() - 1);
    }

    #[test]
    fn test_absent_nested_dirs_children_first() {
        let mut raw = raw_ssl();
        raw.ensure = Some("absent".into());
        let plan = plan_for(&raw, &PlatformPolicy::redhat());
        let cert_dir = plan
            .position_of(|k| is_dir(k, "cacerts"))
            .expect("no cert dir");
        let config_dir = plan
            .position_of(|k| is_dir(k, "openldap"))
            .expect("no config dir");
        assert!(cert_dir < config_dir);
    }

    #[test]
    fn test_builder_stable_order() {
        let mut builder = PlanBuilder::new();
        let a = builder.push(
            ActionKind::EnsurePackage {
                name: "a".into(),
                state: Ensure::Present,
            },
            &[],
        );
        let b = builder.push(
            ActionKind::EnsureDirectory {
                path: "/b".into(),
                state: Ensure::Present,
            },
            &[],
        );
        let _c = builder.push(
            ActionKind::EnsureDirectory {
                path: "/c".into(),
                state: Ensure::Present,
            },
            &[a],
        );
        let mut builder_rev = PlanBuilder::new();
        let first = builder_rev.push(
            ActionKind::EnsureDirectory {
                path: "/x".into(),
                state: Ensure::Present,
            },
            &[ActionId(1)],
        );
        let _second = builder_rev.push(
            ActionKind::EnsurePackage {
                name: "x".into(),
                state: Ensure::Present,
            },
            &[],
        );

        let plan = builder.finish().expect("failed to finish");
        assert_eq!(plan.position(a), Some(0));
        assert_eq!(plan.position(b), Some(1));

        let plan = builder_rev.finish().expect("failed to finish");
        assert_eq!(plan.position(first), Some(1));
    }

    #[test]
    fn test_builder_cycle() {
        let mut builder = PlanBuilder::new();
        let _ = builder.push(
            ActionKind::EnsurePackage {
                name: "a".into(),
                state: Ensure::Present,
            },
            &[ActionId(1)],
        );
        let _ = builder.push(
            ActionKind::EnsurePackage {
                name: "b".into(),
                state: Ensure::Present,
            },
            &[ActionId(0)],
        );
        assert!(matches!(
            builder.finish(),
            Err(PlanningError::DependencyCycle(actions)) if actions.len() == 2
        ));
    }

    #[test]
    fn test_builder_unknown_dependency() {
        let mut builder = PlanBuilder::new();
        let _ = builder.push(
            ActionKind::EnsurePackage {
                name: "a".into(),
                state: Ensure::Present,
            },
            &[ActionId(7)],
        );
        assert!(matches!(
            builder.finish(),
            Err(PlanningError::UnknownDependency { dependency: 7, .. })
        ));
    }

    #[test]
    fn test_builder_unknown_subsystem() {
        let mut builder = PlanBuilder::new();
        let _ = builder.push(
            ActionKind::InvokeSubsystem {
                name: "winbind".into(),
                params: SubsystemParams::new(),
            },
            &[],
        );
        assert_eq!(
            builder.finish(),
            Err(PlanningError::UnknownSubsystem("winbind".into()))
        );
    }

    #[test]
    fn test_required_package_not_removed() {
        let mut builder = PlanBuilder::new();
        let keep = builder.push(
            ActionKind::EnsurePackage {
                name: "ldap-utils".into(),
                state: Ensure::Present,
            },
            &[],
        );
        let file = builder.push(
            ActionKind::EnsureDirectory {
                path: "/etc/ldap".into(),
                state: Ensure::Absent,
            },
            &[],
        );
        let _ = builder.push(
            ActionKind::EnsurePackage {
                name: "ldap-utils".into(),
                state: Ensure::Absent,
            },
            &[file],
        );
        let plan = builder.finish().expect("failed to finish");
        assert_eq!(plan.len(), 2);
        assert!(plan.position(keep).is_some());
        assert!(!plan.iter().any(|a| matches!(
            a.kind,
            ActionKind::EnsurePackage {
                state: Ensure::Absent,
                ..
            }
        )));
    }

    #[test]
    fn test_orphan_link() {
        let cfg = resolve(&raw_ssl()).expect("failed to resolve");
        let policy = PlatformPolicy::debian();
        let link = ActionKind::EnsureSymlinkFromHash {
            source: policy.cert_path("ca.pem"),
            hash: TrustHash::SubjectName,
            state: Ensure::Present,
        };
        assert!(matches!(
            build_plan(&cfg, &policy, vec![link], String::new(), vec![]),
            Err(PlanningError::OrphanLink(_))
        ));
    }
}
