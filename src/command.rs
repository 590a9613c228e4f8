// (c) Copyright 2026 reposprout contributors. All rights reserved.

//! Top-level wiring: turns a repo fixture and [`BootstrapConfig`] into a
//! [`Plan`] and drives the [`Orchestrator`] against the real external
//! collaborators (spec §1 data flow: Graph + Root Manifest + Options ->
//! Planner -> Plan -> Orchestrator).

use std::path::Path;

use crate::{
    config::BootstrapConfig,
    errors::BootstrapError,
    fsops::RealFileSystem,
    graph::{PackageGraph, RootManifest},
    installer::ProcessInstaller,
    lifecycle::ProcessLifecycleRunner,
    manifest,
    orchestrator::Orchestrator,
    planner::{self, Plan},
    port,
    progress::TracingSink,
};

/// Coarse, presence-only installed probe (spec §4.4 step 4, §9 open
/// question 1): whether `<dir>/node_modules/<name>` exists, ignoring the
/// requested range entirely.
fn default_is_installed(dir: &Path, spec: &str) -> bool {
    let (name, _range) = split_spec(spec);
    dir.join("node_modules").join(name).is_dir()
}

/// Splits a `name@range` spec, handling scoped names (`@scope/name@range`)
/// whose own leading `@` must not be mistaken for the name/range separator.
fn split_spec(spec: &str) -> (&str, &str) {
    let search_from = if spec.starts_with('@') { 1 } else { 0 };

    match spec[search_from..].find('@') {
        Some(offset) => {
            let split_at = search_from + offset;
            (&spec[..split_at], &spec[split_at + 1..])
        }
        None => (spec, ""),
    }
}

/// Loads a repo fixture from `fixture_path`, plans it, and runs the
/// bootstrap against the real installer/filesystem/lifecycle collaborators.
/// Returns the computed [`Plan`] on success.
pub async fn bootstrap(fixture_path: &Path, config: BootstrapConfig) -> Result<Plan, BootstrapError> {
    let (graph, root) = manifest::load_repo_fixture(fixture_path).await?;
    bootstrap_graph(graph, root, config).await
}

/// Same as [`bootstrap`], for a graph and root manifest already assembled
/// by the caller (used directly by tests and by any future real
/// repository-discovery collaborator).
pub async fn bootstrap_graph(
    graph: PackageGraph,
    root: RootManifest,
    mut config: BootstrapConfig,
) -> Result<Plan, BootstrapError> {
    let sink = TracingSink;

    if config.needs_network_mutex() {
        config.mutex = Some(port::allocate_network_mutex()?);
    }

    let plan = planner::plan(&graph, &root, &config, &default_is_installed, &sink);

    let installer = ProcessInstaller;
    let lifecycle = ProcessLifecycleRunner::new(&config);
    let fs = RealFileSystem;

    let orchestrator = Orchestrator {
        graph: &graph,
        root: &root,
        config: &config,
        installer: &installer,
        lifecycle: &lifecycle,
        fs: &fs,
        sink: &sink,
    };

    orchestrator.run(&plan).await?;

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_spec_handles_scoped_names() {
        assert_eq!(split_spec("@babel/core@^7.0.0"), ("@babel/core", "^7.0.0"));
        assert_eq!(split_spec("left-pad@^1.0.0"), ("left-pad", "^1.0.0"));
        assert_eq!(split_spec("left-pad"), ("left-pad", ""));
    }
}
