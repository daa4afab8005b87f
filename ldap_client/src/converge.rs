// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors

//! Top-level entry points tying resolution, planning and execution together.

use crate::{
    cert,
    config::{resolve_all, RawParams},
    executor::{ApplyReport, CancellationToken, Executor},
    host::Host,
    plan::{build_plan, Plan},
    platform::PlatformPolicy,
    render::render,
    subsystem::compose,
    Result,
};
use log::*;

/// Resolve `raw` and build the ordered plan for `policy`. Touches nothing
/// on the host.
pub fn plan_for(raw: &RawParams, policy: &PlatformPolicy) -> Result<Plan> {
    let resolved = resolve_all(raw)?;
    let cfg = &resolved.config;
    let plan = build_plan(
        cfg,
        policy,
        cert::plan(cfg, policy),
        render(cfg, policy),
        compose(cfg, &resolved.nss, &resolved.pam),
    )?;
    Ok(plan)
}

/// Converge `host` to the state described by `raw`.
///
/// Validation and planning errors are returned before any action runs.
pub fn converge(
    raw: &RawParams,
    policy: &PlatformPolicy,
    host: &mut Host,
) -> Result<ApplyReport> {
    converge_with_cancellation(raw, policy, host, CancellationToken::new())
}

pub fn converge_with_cancellation(
    raw: &RawParams,
    policy: &PlatformPolicy,
    host: &mut Host,
    token: CancellationToken,
) -> Result<ApplyReport> {
    let plan = plan_for(raw, policy)?;
    info!(
        "Converging {} towards {} with {} action(s)",
        policy.config_path().display(),
        raw.ensure.as_deref().unwrap_or("present"),
        plan.len()
    );
    let report = Executor::new(host).with_cancellation(token).apply(&plan)?;
    Ok(report)
}
