// (c) Copyright 2026 reposprout contributors. All rights reserved.

//! Lifecycle script execution (spec §4.5 phases A, D, E, F): running a
//! named npm-style script inside a single package. Its own subprocess
//! collaborator, distinct from [`crate::installer::Installer`] — a script
//! run takes a package and a script name, not a dependency spec list.

use async_trait::async_trait;

use crate::{config::BootstrapConfig, errors::BootstrapError, graph::Package};

/// Runs a named lifecycle script (`preinstall`, `postinstall`,
/// `prepublish`, `prepare`) inside a package.
#[async_trait]
pub trait LifecycleRunner: Send + Sync {
    /// Runs `script` in `package`. A package with no such script defined is
    /// not this trait's concern to detect — that distinction is made (or
    /// not) by the underlying client; absence of the script is treated the
    /// same as a successful no-op by every npm-compatible client this core
    /// targets.
    async fn run_script(&self, package: &Package, script: &str) -> Result<(), BootstrapError>;
}

/// Runs `<npm-client> run <script>` as a subprocess inside the package's
/// directory.
#[derive(Debug, Clone, Default)]
pub struct ProcessLifecycleRunner;

#[async_trait]
impl LifecycleRunner for ProcessLifecycleRunner {
    async fn run_script(&self, package: &Package, script: &str) -> Result<(), BootstrapError> {
        let output = tokio::process::Command::new("npm")
            .current_dir(&package.location)
            .arg("run")
            .arg(script)
            .arg("--if-present")
            .output()
            .await
            .map_err(|source| BootstrapError::FilesystemFailed {
                op: "spawn lifecycle script",
                path: package.location.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BootstrapError::LifecycleScriptFailed {
                package: package.name.clone(),
                script: script.to_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }
}

impl ProcessLifecycleRunner {
    /// Builds a runner, ignoring `config`'s `npm_client` in favor of the
    /// universal `npm run --if-present` invocation, since lifecycle scripts
    /// are an npm-manifest convention every client in this ecosystem honors
    /// identically.
    pub fn new(_config: &BootstrapConfig) -> Self {
        Self
    }
}
