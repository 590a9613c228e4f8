// (c) Copyright 2026 reposprout contributors. All rights reserved.

//! Configuration options recognized by the core (spec §6), plus the
//! scope/ignore filters and `--ignore-scripts` switch added in SPEC_FULL §B.

use serde::{Deserialize, Serialize};

/// The `hoist` option: either enabled for everything (`true`, meaning the
/// pattern `**`) or enabled for an explicit set of glob patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HoistSpec {
    /// `hoist = true`.
    All,
    /// `hoist = ["pattern", ...]`.
    Patterns(Vec<String>),
}

/// Options recognized by the planner and orchestrator (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Enables hoisting, optionally restricted to patterns.
    pub hoist: Option<HoistSpec>,
    /// Glob patterns excluded from hoisting even when `hoist` would match.
    pub nohoist: Vec<String>,
    /// Installer executable name (e.g. `npm`, `yarn`).
    pub npm_client: String,
    /// Registry URL passed through to the installer verbatim.
    pub registry: Option<String>,
    /// Opaque installer coordination token. Auto-allocated for clients that
    /// need it (spec §6) if left unset.
    pub mutex: Option<String>,
    /// Delegates all installation to a single root installer invocation.
    pub use_workspaces: bool,
    /// Phase-internal parallelism cap. Must be `>= 1`.
    pub concurrency: usize,
    /// Skips the preinstall/postinstall/prepublish/prepare lifecycle
    /// phases entirely; phase B (install) still runs (SPEC_FULL §B.2).
    pub ignore_scripts: bool,
    /// Only operate on packages whose name matches one of these patterns.
    /// Empty means "all packages" (SPEC_FULL §B.1).
    pub scope: Vec<String>,
    /// Exclude packages whose name matches one of these patterns
    /// (SPEC_FULL §B.1).
    pub ignore: Vec<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            hoist: None,
            nohoist: Vec::new(),
            npm_client: "npm".to_owned(),
            registry: None,
            mutex: None,
            use_workspaces: false,
            concurrency: default_concurrency(),
            ignore_scripts: false,
            scope: Vec::new(),
            ignore: Vec::new(),
        }
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl BootstrapConfig {
    /// True when the chosen installer requires a local TCP port for
    /// cross-invocation coordination and none was configured (spec §6).
    /// `yarn` is the canonical example in this ecosystem.
    pub fn needs_network_mutex(&self) -> bool {
        self.mutex.is_none() && self.npm_client == "yarn"
    }
}
