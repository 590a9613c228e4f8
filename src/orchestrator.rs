// (c) Copyright 2026 reposprout contributors. All rights reserved.

//! Bootstrap Orchestrator (spec §4.5): executes a [`Plan`] across phases
//! A–F, or delegates to a single root install in workspaces-managed mode.
//! Phase-internal parallelism is bounded by `config.concurrency`; batch
//! boundaries in the lifecycle phases are plain barriers (await the whole
//! batch before starting the next).

use std::{collections::BTreeSet, path::PathBuf, pin::Pin};

use futures::{
    future::Future,
    stream::{self, StreamExt},
};

use crate::{
    config::BootstrapConfig,
    errors::BootstrapError,
    fsops::FileSystem,
    graph::{Package, PackageGraph, PackageName, RootManifest},
    hoist::package_is_selected,
    installer::Installer,
    lifecycle::LifecycleRunner,
    planner::{LeafInstall, Plan},
    progress::{Phase, ProgressEvent, ProgressSink},
};

type BoxedAction<'a> = Pin<Box<dyn Future<Output = Result<(), BootstrapError>> + Send + 'a>>;

/// Collaborators the orchestrator drives (spec §6): all externally
/// provided, the orchestrator itself holds no state beyond these borrows.
pub struct Orchestrator<'a> {
    pub graph: &'a PackageGraph,
    pub root: &'a RootManifest,
    pub config: &'a BootstrapConfig,
    pub installer: &'a dyn Installer,
    pub lifecycle: &'a dyn LifecycleRunner,
    pub fs: &'a dyn FileSystem,
    pub sink: &'a dyn ProgressSink,
}

impl<'a> Orchestrator<'a> {
    /// Runs the whole bootstrap state machine:
    /// `Idle -> Planning -> (WorkspacesInstall | PhaseA..PhaseF) -> Done|Failed`.
    /// `plan` is assumed already built (Planning has already happened);
    /// this only drives execution.
    pub async fn run(&self, plan: &Plan) -> Result<(), BootstrapError> {
        let selected = self.selected_packages();
        self.sink
            .emit(ProgressEvent::Info(format!("bootstrapping {} packages", selected.len())));

        if self.config.use_workspaces {
            return self
                .installer
                .install_in_dir_original_manifest(&self.root.root_path, self.config)
                .await;
        }

        let batches = self.selected_batches(&selected)?;

        if !self.config.ignore_scripts {
            self.run_lifecycle_phase(&batches, Phase::Preinstall, "preinstall").await?;
        }

        self.run_phase_b(plan).await?;
        self.run_symlink_siblings(&selected).await?;

        if !self.config.ignore_scripts {
            self.run_lifecycle_phase(&batches, Phase::Postinstall, "postinstall").await?;
            self.run_lifecycle_phase(&batches, Phase::Prepublish, "prepublish").await?;
            self.run_lifecycle_phase(&batches, Phase::Prepare, "prepare").await?;
        }

        Ok(())
    }

    fn selected_packages(&self) -> BTreeSet<PackageName> {
        self.graph
            .iter()
            .filter(|package| package_is_selected(&package.name, &self.config.scope, &self.config.ignore))
            .map(|package| package.name.clone())
            .collect()
    }

    fn selected_batches(
        &self,
        selected: &BTreeSet<PackageName>,
    ) -> Result<Vec<Vec<PackageName>>, BootstrapError> {
        let batches = self.graph.topological_batches()?;

        Ok(batches
            .into_iter()
            .map(|batch| {
                batch
                    .into_iter()
                    .filter(|name| selected.contains(name))
                    .collect::<Vec<_>>()
            })
            .filter(|batch| !batch.is_empty())
            .collect())
    }

    /// Phases A, D, E, F (spec §4.5): runs `script` in every selected
    /// package, batch by batch, aborting the whole bootstrap on the first
    /// script failure without starting the next batch.
    async fn run_lifecycle_phase(
        &self,
        batches: &[Vec<PackageName>],
        phase: Phase,
        script: &str,
    ) -> Result<(), BootstrapError> {
        self.sink.emit(ProgressEvent::PhaseBegin(phase));

        for batch in batches {
            let packages: Vec<&Package> = batch.iter().filter_map(|name| self.graph.get(name)).collect();
            if packages.is_empty() {
                continue;
            }

            self.sink
                .emit(ProgressEvent::WorkAdded { phase, count: packages.len() });

            let results: Vec<Result<(), BootstrapError>> = stream::iter(packages)
                .map(|package| self.lifecycle.run_script(package, script))
                .buffer_unordered(self.config.concurrency.max(1))
                .collect()
                .await;

            let completed = results.iter().filter(|r| r.is_ok()).count();
            self.sink
                .emit(ProgressEvent::WorkCompleted { phase, count: completed });

            if let Some(error) = results.into_iter().find_map(Result::err) {
                return Err(error);
            }
        }

        self.sink.emit(ProgressEvent::PhaseEnd(phase));
        Ok(())
    }

    /// Phase B (spec §4.5): root install + prune + per-requester leaf
    /// installs, run together with bounded concurrency and no ordering
    /// between them.
    async fn run_phase_b(&self, plan: &Plan) -> Result<(), BootstrapError> {
        self.sink.emit(ProgressEvent::PhaseBegin(Phase::Install));

        let mut actions: Vec<BoxedAction<'_>> = Vec::new();

        if !plan.root_installs.is_empty() {
            actions.push(Box::pin(self.run_root_install_action(plan)));
            actions.push(Box::pin(self.run_prune_action(plan)));
        }

        let global_style = self.config.hoist.is_some();
        for (requester_name, leaf_installs) in &plan.leaves {
            if !leaf_installs.iter().any(|leaf| !leaf.is_satisfied) {
                continue;
            }

            if let Some(requester) = self.graph.get(requester_name) {
                actions.push(Box::pin(self.run_leaf_install_action(requester, leaf_installs, global_style)));
            }
        }

        self.sink
            .emit(ProgressEvent::WorkAdded { phase: Phase::Install, count: actions.len() });

        let results: Vec<Result<(), BootstrapError>> = stream::iter(actions)
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let completed = results.iter().filter(|r| r.is_ok()).count();
        self.sink
            .emit(ProgressEvent::WorkCompleted { phase: Phase::Install, count: completed });

        if let Some(error) = results.into_iter().find_map(Result::err) {
            return Err(error);
        }

        self.sink.emit(ProgressEvent::PhaseEnd(Phase::Install));
        Ok(())
    }

    async fn run_root_install_action(&self, plan: &Plan) -> Result<(), BootstrapError> {
        self.sink
            .emit(ProgressEvent::Info("installing hoisted dependencies into root".to_owned()));

        let any_unsatisfied = plan.root_installs.iter().any(|install| !install.is_satisfied);
        let specs: Vec<String> = if any_unsatisfied {
            plan.root_installs.iter().map(|install| install.spec.clone()).collect()
        } else {
            Vec::new()
        };

        self.installer
            .install_in_dir(&self.root.root_path, &specs, self.config, false)
            .await?;

        self.sink
            .emit(ProgressEvent::Info("finished installing in root".to_owned()));

        for root_install in &plan.root_installs {
            if root_install.dependents.is_empty() {
                continue;
            }

            let installed_dir = self.root.root_module_dir.join(root_install.name.as_ref());
            let entries = self.fs.binary_entries(&installed_dir).await?;
            if entries.is_empty() {
                continue;
            }

            for dependent_name in &root_install.dependents {
                let Some(dependent) = self.graph.get(dependent_name) else { continue };
                let bin_dir = dependent.local_module_dir.join(".bin");

                for (bin_name, relative_path) in &entries {
                    let source = installed_dir.join(relative_path);
                    let dest = bin_dir.join(bin_name);
                    self.sink.emit(ProgressEvent::Info(format!(
                        "linking binary {bin_name} of {} into {dependent_name}",
                        root_install.name
                    )));
                    self.fs.symlink_binary(&source, &dest).await?;
                }
            }
        }

        Ok(())
    }

    async fn run_prune_action(&self, plan: &Plan) -> Result<(), BootstrapError> {
        self.sink
            .emit(ProgressEvent::Info("pruning hoisted dependencies".to_owned()));

        let mut shadow_dirs: Vec<PathBuf> = Vec::new();
        for root_install in &plan.root_installs {
            for dependent_name in &root_install.dependents {
                let Some(dependent) = self.graph.get(dependent_name) else { continue };
                if dependent.local_module_dir == self.root.root_module_dir {
                    continue;
                }
                shadow_dirs.push(dependent.local_module_dir.join(root_install.name.as_ref()));
            }
        }

        let results: Vec<Result<(), BootstrapError>> = stream::iter(shadow_dirs)
            .map(|dir| self.fs.remove_dir_all(dir.as_path()))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        if let Some(error) = results.into_iter().find_map(Result::err) {
            return Err(error);
        }

        self.sink.emit(ProgressEvent::Info("finished pruning".to_owned()));
        Ok(())
    }

    async fn run_leaf_install_action(
        &self,
        requester: &Package,
        leaf_installs: &[LeafInstall],
        global_style: bool,
    ) -> Result<(), BootstrapError> {
        let specs: Vec<String> = leaf_installs.iter().map(|leaf| leaf.spec.clone()).collect();
        self.installer
            .install_in_dir(&requester.location, &specs, self.config, global_style)
            .await
    }

    /// Phase C (spec §4.5): links every repo-local dependency into its
    /// dependent's local-module directory.
    async fn run_symlink_siblings(&self, selected: &BTreeSet<PackageName>) -> Result<(), BootstrapError> {
        self.sink.emit(ProgressEvent::PhaseBegin(Phase::SymlinkSiblings));

        let mut links: Vec<(PathBuf, PathBuf, PackageName, PackageName)> = Vec::new();
        for package in self.graph.iter() {
            if !selected.contains(&package.name) {
                continue;
            }

            for (name, range) in &package.dependencies {
                if let Some(local) = self.graph.find(name, Some(range)) {
                    let dest = package.local_module_dir.join(local.name.as_ref());
                    links.push((local.location.clone(), dest, local.name.clone(), package.name.clone()));
                }
            }
        }

        self.sink
            .emit(ProgressEvent::WorkAdded { phase: Phase::SymlinkSiblings, count: links.len() });

        let results: Vec<Result<(), BootstrapError>> = stream::iter(links)
            .map(|(source, dest, dep_name, dependent_name)| async move {
                self.sink
                    .emit(ProgressEvent::Info(format!("linking {dep_name} into {dependent_name}")));
                self.fs.symlink_package(&source, &dest).await
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let completed = results.iter().filter(|r| r.is_ok()).count();
        self.sink
            .emit(ProgressEvent::WorkCompleted { phase: Phase::SymlinkSiblings, count: completed });

        if let Some(error) = results.into_iter().find_map(Result::err) {
            return Err(error);
        }

        self.sink.emit(ProgressEvent::PhaseEnd(Phase::SymlinkSiblings));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet as Set;

    use semver::{Version, VersionReq};

    use super::*;
    use crate::{
        config::HoistSpec,
        fsops::fake::FakeFileSystem,
        graph::DependencyMap,
        installer::fake::{FakeCall as InstallerCall, FakeInstaller},
        lifecycle::fake::FakeLifecycleRunner,
        planner::RootInstall,
        progress::RecordingSink,
    };

    fn pkg(name: &str, version: &str, local_dir_under_root: bool) -> Package {
        Package {
            name: PackageName::unchecked(name),
            version: Version::parse(version).unwrap(),
            location: PathBuf::from(format!("/repo/packages/{name}")),
            local_module_dir: if local_dir_under_root {
                PathBuf::from("/repo/node_modules")
            } else {
                PathBuf::from(format!("/repo/packages/{name}/node_modules"))
            },
            dependencies: DependencyMap::new(),
            already_installed: Set::new(),
        }
    }

    fn root() -> RootManifest {
        RootManifest {
            dependencies: DependencyMap::new(),
            root_path: PathBuf::from("/repo"),
            root_module_dir: PathBuf::from("/repo/node_modules"),
        }
    }

    #[tokio::test]
    async fn workspaces_mode_skips_every_phase() {
        let graph = PackageGraph::new([pkg("a", "1.0.0", false)]);
        let root = root();
        let config = BootstrapConfig { use_workspaces: true, ..BootstrapConfig::default() };
        let installer = FakeInstaller::default();
        let lifecycle = FakeLifecycleRunner::default();
        let fs = FakeFileSystem::default();
        let sink = RecordingSink::default();

        let orchestrator = Orchestrator {
            graph: &graph,
            root: &root,
            config: &config,
            installer: &installer,
            lifecycle: &lifecycle,
            fs: &fs,
            sink: &sink,
        };

        orchestrator.run(&Plan::default()).await.expect("workspaces run succeeds");

        assert_eq!(lifecycle.calls.lock().unwrap().len(), 0);
        let calls = installer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], InstallerCall::OriginalManifest { .. }));
    }

    #[tokio::test]
    async fn root_install_runs_with_empty_specs_when_all_satisfied() {
        let graph = PackageGraph::new([pkg("a", "1.0.0", false)]);
        let root = root();
        let config = BootstrapConfig { hoist: Some(HoistSpec::All), ..BootstrapConfig::default() };
        let installer = FakeInstaller::default();
        let lifecycle = FakeLifecycleRunner::default();
        let fs = FakeFileSystem::default();
        let sink = RecordingSink::default();

        let orchestrator = Orchestrator {
            graph: &graph,
            root: &root,
            config: &config,
            installer: &installer,
            lifecycle: &lifecycle,
            fs: &fs,
            sink: &sink,
        };

        let plan = Plan {
            root_installs: vec![RootInstall {
                name: PackageName::unchecked("left-pad"),
                dependents: Vec::new(),
                spec: "left-pad@^1.0.0".to_owned(),
                is_satisfied: true,
            }],
            leaves: Default::default(),
        };

        orchestrator.run(&plan).await.expect("run succeeds");

        let calls = installer.calls.lock().unwrap();
        let root_call = calls
            .iter()
            .find(|call| matches!(call, InstallerCall::WithSpecs { dir, .. } if dir == &root.root_path))
            .expect("root install call recorded");

        match root_call {
            InstallerCall::WithSpecs { specs, .. } => assert!(specs.is_empty()),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn lifecycle_failure_in_a_batch_aborts_before_later_batches() {
        let mut leaf = pkg("leaf", "1.0.0", false);
        leaf.dependencies.insert(PackageName::unchecked("root-pkg"), VersionReq::parse("^1.0.0").unwrap());
        let root_pkg = pkg("root-pkg", "1.0.0", false);

        let graph = PackageGraph::new([leaf, root_pkg]);
        let root = root();
        let config = BootstrapConfig::default();
        let installer = FakeInstaller::default();
        let lifecycle = FakeLifecycleRunner {
            fail_for: vec![(PackageName::unchecked("root-pkg"), "preinstall".to_owned())],
            ..FakeLifecycleRunner::default()
        };
        let fs = FakeFileSystem::default();
        let sink = RecordingSink::default();

        let orchestrator = Orchestrator {
            graph: &graph,
            root: &root,
            config: &config,
            installer: &installer,
            lifecycle: &lifecycle,
            fs: &fs,
            sink: &sink,
        };

        let err = orchestrator.run(&Plan::default()).await.unwrap_err();
        assert!(matches!(err, BootstrapError::LifecycleScriptFailed { .. }));

        let calls = lifecycle.calls.lock().unwrap();
        assert!(!calls.iter().any(|call| call.package == PackageName::unchecked("leaf")));
    }

    #[tokio::test]
    async fn sibling_symlink_links_satisfying_local_dependency() {
        let mut a = pkg("a", "1.0.0", false);
        a.dependencies.insert(PackageName::unchecked("b"), VersionReq::parse("^1.0.0").unwrap());
        let b = pkg("b", "1.2.3", false);

        let graph = PackageGraph::new([a, b]);
        let root = root();
        let config = BootstrapConfig::default();
        let installer = FakeInstaller::default();
        let lifecycle = FakeLifecycleRunner::default();
        let fs = FakeFileSystem::default();
        let sink = RecordingSink::default();

        let orchestrator = Orchestrator {
            graph: &graph,
            root: &root,
            config: &config,
            installer: &installer,
            lifecycle: &lifecycle,
            fs: &fs,
            sink: &sink,
        };

        orchestrator.run(&Plan::default()).await.expect("run succeeds");

        let calls = fs.calls.lock().unwrap();
        assert!(calls.iter().any(|call| matches!(
            call,
            crate::fsops::fake::FakeCall::SymlinkPackage { dest, .. }
                if dest.ends_with("node_modules/b")
        )));
    }

    #[tokio::test]
    async fn root_install_links_binaries_for_each_dependent() {
        let a = pkg("a", "1.0.0", false);
        let graph = PackageGraph::new([a]);
        let root = root();
        let config = BootstrapConfig::default();
        let installer = FakeInstaller::default();
        let lifecycle = FakeLifecycleRunner::default();

        let installed_dir = root.root_module_dir.join("left-pad");
        let mut binaries = std::collections::HashMap::new();
        binaries.insert(installed_dir, vec![("left-pad".to_owned(), PathBuf::from("bin/left-pad.js"))]);
        let fs = FakeFileSystem { binaries, ..FakeFileSystem::default() };
        let sink = RecordingSink::default();

        let orchestrator = Orchestrator {
            graph: &graph,
            root: &root,
            config: &config,
            installer: &installer,
            lifecycle: &lifecycle,
            fs: &fs,
            sink: &sink,
        };

        let plan = Plan {
            root_installs: vec![RootInstall {
                name: PackageName::unchecked("left-pad"),
                dependents: vec![PackageName::unchecked("a")],
                spec: "left-pad@^1.0.0".to_owned(),
                is_satisfied: false,
            }],
            leaves: Default::default(),
        };

        orchestrator.run_root_install_action(&plan).await.expect("root install succeeds");

        let calls = fs.calls.lock().unwrap();
        assert!(calls.iter().any(|call| matches!(
            call,
            crate::fsops::fake::FakeCall::SymlinkBinary { source, dest }
                if source.ends_with("node_modules/left-pad/bin/left-pad.js")
                    && dest.ends_with("packages/a/node_modules/.bin/left-pad")
        )));
    }

    #[tokio::test]
    async fn prune_removes_only_shadowed_dependent_dirs() {
        let shadowed = pkg("shadowed", "1.0.0", false);
        let root_rooted = pkg("root-rooted", "1.0.0", true);
        let graph = PackageGraph::new([shadowed, root_rooted]);
        let root = root();
        let config = BootstrapConfig::default();
        let installer = FakeInstaller::default();
        let lifecycle = FakeLifecycleRunner::default();
        let fs = FakeFileSystem::default();
        let sink = RecordingSink::default();

        let orchestrator = Orchestrator {
            graph: &graph,
            root: &root,
            config: &config,
            installer: &installer,
            lifecycle: &lifecycle,
            fs: &fs,
            sink: &sink,
        };

        let plan = Plan {
            root_installs: vec![RootInstall {
                name: PackageName::unchecked("left-pad"),
                dependents: vec![
                    PackageName::unchecked("shadowed"),
                    PackageName::unchecked("root-rooted"),
                ],
                spec: "left-pad@^1.0.0".to_owned(),
                is_satisfied: true,
            }],
            leaves: Default::default(),
        };

        orchestrator.run_prune_action(&plan).await.expect("prune succeeds");

        let calls = fs.calls.lock().unwrap();
        assert!(calls.iter().any(|call| matches!(
            call,
            crate::fsops::fake::FakeCall::RemoveDirAll(path)
                if path.ends_with("packages/shadowed/node_modules/left-pad")
        )));
        assert!(!calls.iter().any(|call| matches!(
            call,
            crate::fsops::fake::FakeCall::RemoveDirAll(path)
                if path.starts_with("/repo/node_modules")
        )));
    }
}
