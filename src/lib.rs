// (c) Copyright 2026 reposprout contributors. All rights reserved.

//! Dependency placement planner and parallel bootstrap orchestrator for
//! npm-compatible monorepos.
//!
//! [`planner::plan`] decides, for every external dependency declared
//! anywhere in the repo, whether it gets hoisted to the repository root or
//! installed per-package, and which version wins on disagreement.
//! [`orchestrator::Orchestrator`] executes the resulting [`planner::Plan`]
//! against external collaborators: an installer subprocess, a filesystem,
//! and a lifecycle-script runner.

pub mod command;
pub mod config;
pub mod errors;
pub mod fsops;
pub mod graph;
pub mod hoist;
pub mod installer;
pub mod lifecycle;
pub mod manifest;
pub mod orchestrator;
pub mod planner;
pub mod port;
pub mod progress;
pub mod version;

pub use errors::{BootstrapError, Result};
