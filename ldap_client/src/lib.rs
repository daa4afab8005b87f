// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors

//! Convergence engine for the client side of an LDAP identity stack.
//!
//! A run resolves a flat parameter set into a [`config::ResolvedConfig`],
//! plans trust material, renders the client configuration file, composes
//! the optional nsswitch/PAM/SSSD collaborator invocations, orders all of it
//! into a [`plan::Plan`] and finally applies that plan through an
//! [`executor::Executor`]. Every action checks its postcondition first, so
//! re-applying a converged plan reports only skipped actions.

pub mod cert;
pub mod config;
pub mod converge;
pub mod crypto;
pub mod error;
pub mod executor;
pub mod host;
pub mod permissions;
pub mod plan;
pub mod platform;
pub mod render;
pub mod subsystem;

#[cfg(test)]
mod test_support;

pub use config::{Ensure, RawParams, ResolvedConfig, Scope};
pub use converge::{converge, converge_with_cancellation, plan_for};
pub use error::{Error, Result};
