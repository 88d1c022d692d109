//! Operator tools for the fx-autotrade deployment.
//!
//! Two independent command-line utilities share this crate:
//!
//! - `tmp-sweep` reclaims stale temporary working directories while
//!   protecting the one the service is currently using ([`sweep`]).
//! - `config-edit` views and mutates the service's XML configuration
//!   document, optionally triggering a restart ([`edit`]).
//!
//! The layout mirrors a strict split:
//!
//! - **[`core`]**: Pure, deterministic logic (marker resolution, sweep
//!   decisions, table rendering, value updates). No I/O.
//! - **[`io`]**: Side-effecting operations (filesystem walks, XML load/save,
//!   terminal prompts, subprocesses). Behind traits where tests need fakes.
//!
//! [`sweep`] and [`edit`] orchestrate the two and implement the CLI commands.

pub mod core;
pub mod edit;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod sweep;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
