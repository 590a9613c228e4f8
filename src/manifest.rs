// (c) Copyright 2026 reposprout contributors. All rights reserved.

//! Fixture loader: assembles a [`PackageGraph`] and [`RootManifest`] from
//! an already-parsed TOML description.
//!
//! Discovering the repository layout and parsing every package's real
//! manifest is out of scope for this core (spec §1) — that is the job of
//! an external collaborator. This loader is the stand-in used by the CLI
//! and the integration tests (SPEC_FULL §A.4): a single TOML file
//! describing the root manifest and every repo-local package, as if some
//! other component had already walked the repository and parsed every
//! `package.json` for us.

use std::{collections::BTreeSet, path::{Path, PathBuf}};

use serde::Deserialize;

use crate::{
    errors::BootstrapError,
    graph::{DependencyMap, Package, PackageGraph, PackageName, RootManifest},
};

#[derive(Debug, Deserialize)]
struct RepoFixture {
    root: RootFixture,
    #[serde(default)]
    packages: Vec<PackageFixture>,
}

#[derive(Debug, Deserialize)]
struct RootFixture {
    root_path: PathBuf,
    root_module_dir: PathBuf,
    #[serde(default)]
    dependencies: RawDependencyMap,
}

#[derive(Debug, Deserialize)]
struct PackageFixture {
    name: String,
    version: String,
    location: PathBuf,
    local_module_dir: PathBuf,
    #[serde(default)]
    dependencies: RawDependencyMap,
    #[serde(default)]
    already_installed: BTreeSet<String>,
}

type RawDependencyMap = std::collections::BTreeMap<String, String>;

fn parse_dependency_map(raw: &RawDependencyMap) -> Result<DependencyMap, BootstrapError> {
    raw.iter()
        .map(|(name, range)| {
            let range = crate::version::parse_range(range)?;
            Ok((PackageName::unchecked(name.clone()), range))
        })
        .collect()
}

/// Reads and parses a repo fixture from `path`, returning the graph and
/// root manifest ready to hand to the planner.
pub async fn load_repo_fixture(
    path: &Path,
) -> Result<(PackageGraph, RootManifest), BootstrapError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BootstrapError::FilesystemFailed {
            op: "read repo fixture",
            path: path.to_path_buf(),
            source,
        })?;

    let fixture: RepoFixture = toml::from_str(&contents).map_err(|error| {
        BootstrapError::FilesystemFailed {
            op: "parse repo fixture",
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, error),
        }
    })?;

    let root = RootManifest {
        dependencies: parse_dependency_map(&fixture.root.dependencies)?,
        root_path: fixture.root.root_path,
        root_module_dir: fixture.root.root_module_dir,
    };

    let mut packages = Vec::with_capacity(fixture.packages.len());
    for package in fixture.packages {
        packages.push(Package {
            name: PackageName::unchecked(package.name),
            version: crate::version::parse_version(&package.version)?,
            location: package.location,
            local_module_dir: package.local_module_dir,
            dependencies: parse_dependency_map(&package.dependencies)?,
            already_installed: package
                .already_installed
                .into_iter()
                .map(PackageName::unchecked)
                .collect(),
        });
    }

    Ok((PackageGraph::new(packages), root))
}
