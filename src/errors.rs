// (c) Copyright 2026 reposprout contributors. All rights reserved.

//! Error types for the planner and orchestrator.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::graph::PackageName;

/// Top level error produced by planning or bootstrapping a repository.
///
/// Every variant is fatal to the current run (spec §7): none are retried
/// internally. Script/install failures carry the offending package so
/// callers can report precisely which package broke the run.
#[derive(Error, Diagnostic, Debug)]
pub enum BootstrapError {
    /// The package graph contains a cycle and cannot be topologically batched.
    #[error("dependency cycle detected among: {0}")]
    DependencyCycle(String),

    /// A version or range string did not parse under semver grammar.
    #[error("invalid version specifier `{spec}`")]
    BadVersionSpec {
        /// The offending literal.
        spec: String,
        /// Underlying parser error, if available.
        #[source]
        source: Option<semver::Error>,
    },

    /// The external installer process exited with a failure.
    #[error("installer failed in `{dir}` for specs [{}]", specs.join(", "))]
    InstallerFailed {
        /// Directory the installer was invoked in.
        dir: PathBuf,
        /// The specs passed to the installer.
        specs: Vec<String>,
        /// Captured stderr, if any was produced.
        stderr: String,
    },

    /// A lifecycle script failed in a specific package.
    #[error("lifecycle script `{script}` failed in package `{package}`")]
    LifecycleScriptFailed {
        /// Package the script ran in.
        package: PackageName,
        /// Name of the lifecycle script (e.g. `postinstall`).
        script: String,
        /// Captured stderr, if any was produced.
        stderr: String,
    },

    /// A filesystem operation (remove, symlink, bin-link) failed.
    #[error("filesystem operation `{op}` failed at `{path}`")]
    FilesystemFailed {
        /// Short name of the operation (e.g. `prune`, `symlink`).
        op: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Allocating a free local TCP port for the installer mutex failed.
    #[error("failed to allocate a free local port for installer coordination")]
    PortAllocationFailed(#[source] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BootstrapError>;
