// (c) Copyright 2026 reposprout contributors. All rights reserved.

//! The external package-installer subprocess contract (spec §6).
//!
//! This module only depends on the installer through the [`Installer`]
//! trait — materializing installs is out of scope for the core (spec §1);
//! [`ProcessInstaller`] is the concrete collaborator that actually spawns
//! the configured `npm-client` executable.

use std::path::Path;

use async_trait::async_trait;

use crate::{config::BootstrapConfig, errors::BootstrapError};

/// Installs packages by invoking an external package-manager executable.
///
/// A narrow `async_trait` seam between the core and a real external
/// collaborator, so tests can substitute a fake that never shells out.
#[async_trait]
pub trait Installer: Send + Sync {
    /// Installs `specs` in `dir`. An empty `specs` list is still a valid,
    /// meaningful call — some installers perform post-install linking even
    /// with nothing new to add (spec §4.5, §9).
    async fn install_in_dir(
        &self,
        dir: &Path,
        specs: &[String],
        config: &BootstrapConfig,
        global_style: bool,
    ) -> Result<(), BootstrapError>;

    /// Installs whatever dependencies are already declared in the manifest
    /// at `dir`, without passing an explicit spec list.
    async fn install_in_dir_original_manifest(
        &self,
        dir: &Path,
        config: &BootstrapConfig,
    ) -> Result<(), BootstrapError>;
}

/// Spawns the configured `npm-client` executable as a subprocess.
#[derive(Debug, Clone)]
pub struct ProcessInstaller;

impl ProcessInstaller {
    fn base_command(&self, dir: &Path, config: &BootstrapConfig) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&config.npm_client);
        command.current_dir(dir).arg("install");

        if let Some(registry) = &config.registry {
            command.arg("--registry").arg(registry);
        }

        if let Some(mutex) = &config.mutex {
            command.arg("--mutex").arg(mutex);
        }

        command
    }

    async fn run(
        &self,
        mut command: tokio::process::Command,
        dir: &Path,
        specs: &[String],
    ) -> Result<(), BootstrapError> {
        let output = command
            .output()
            .await
            .map_err(|source| BootstrapError::FilesystemFailed {
                op: "spawn installer",
                path: dir.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(BootstrapError::InstallerFailed {
                dir: dir.to_path_buf(),
                specs: specs.to_vec(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Installer for ProcessInstaller {
    async fn install_in_dir(
        &self,
        dir: &Path,
        specs: &[String],
        config: &BootstrapConfig,
        global_style: bool,
    ) -> Result<(), BootstrapError> {
        let mut command = self.base_command(dir, config);

        if global_style {
            command.arg("--global-style");
        }

        for spec in specs {
            command.arg(spec);
        }

        self.run(command, dir, specs).await
    }

    async fn install_in_dir_original_manifest(
        &self,
        dir: &Path,
        config: &BootstrapConfig,
    ) -> Result<(), BootstrapError> {
        let command = self.base_command(dir, config);
        self.run(command, dir, &[]).await
    }
}

#[cfg(test)]
pub mod fake {
    //! A non-shelling [`Installer`] for unit tests.
    use std::{
        path::PathBuf,
        sync::Mutex,
    };

    use super::*;

    /// Records every call it receives; never actually installs anything.
    #[derive(Default)]
    pub struct FakeInstaller {
        pub calls: Mutex<Vec<FakeCall>>,
        pub fail_for: Vec<PathBuf>,
    }

    #[derive(Debug, Clone)]
    pub enum FakeCall {
        WithSpecs {
            dir: PathBuf,
            specs: Vec<String>,
            global_style: bool,
        },
        OriginalManifest {
            dir: PathBuf,
        },
    }

    #[async_trait]
    impl Installer for FakeInstaller {
        async fn install_in_dir(
            &self,
            dir: &Path,
            specs: &[String],
            _config: &BootstrapConfig,
            global_style: bool,
        ) -> Result<(), BootstrapError> {
            self.calls.lock().unwrap().push(FakeCall::WithSpecs {
                dir: dir.to_path_buf(),
                specs: specs.to_vec(),
                global_style,
            });

            if self.fail_for.contains(&dir.to_path_buf()) {
                return Err(BootstrapError::InstallerFailed {
                    dir: dir.to_path_buf(),
                    specs: specs.to_vec(),
                    stderr: "simulated failure".to_owned(),
                });
            }

            Ok(())
        }

        async fn install_in_dir_original_manifest(
            &self,
            dir: &Path,
            _config: &BootstrapConfig,
        ) -> Result<(), BootstrapError> {
            self.calls
                .lock()
                .unwrap()
                .push(FakeCall::OriginalManifest { dir: dir.to_path_buf() });

            Ok(())
        }
    }
}
