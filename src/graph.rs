// (c) Copyright 2026 reposprout contributors. All rights reserved.

//! The package graph: repo-local packages, their manifest-declared
//! dependencies, and the topological batching used to sequence lifecycle
//! phases (spec §3, §4.2).

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
    ops::Deref,
    path::PathBuf,
    str::FromStr,
};

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

use crate::errors::BootstrapError;

/// Name of a repo-local or external package.
///
/// npm package names are far more permissive than this crate needs to
/// validate (scopes, dots, underscores); we only reject the empty string
/// since it can never legally key a manifest's dependency map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageName(String);

impl PackageName {
    /// Builds a `PackageName` without validation, for tests and trusted
    /// internal construction.
    pub fn unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl FromStr for PackageName {
    type Err = miette::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(miette::miette!("package name must not be empty"));
        }

        Ok(Self(s.to_owned()))
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Map from dependency name to required range, as declared by a manifest.
pub type DependencyMap = BTreeMap<PackageName, VersionReq>;

/// A single repo-local package (spec §3).
#[derive(Debug, Clone)]
pub struct Package {
    /// Unique name within the repo.
    pub name: PackageName,
    /// Concrete version of this package.
    pub version: Version,
    /// Absolute path to the package on disk.
    pub location: PathBuf,
    /// Absolute path to the directory sibling packages are symlinked into
    /// (e.g. `<location>/node_modules`).
    pub local_module_dir: PathBuf,
    /// Dependency name -> required range, as declared in this package's manifest.
    pub dependencies: DependencyMap,
    /// Names of dependencies already materially present on disk at a
    /// satisfying version, per the external probe that built this graph.
    pub already_installed: BTreeSet<PackageName>,
}

impl Package {
    /// True if `name` is already installed locally for this package, per the
    /// coarse, presence-only check described in spec §4.4/§9.
    pub fn has_installed(&self, name: &PackageName) -> bool {
        self.already_installed.contains(name)
    }
}

/// The repository-level equivalent of a [`Package`] (spec §3).
#[derive(Debug, Clone)]
pub struct RootManifest {
    /// Dependency name -> required range, as declared in the root manifest.
    pub dependencies: DependencyMap,
    /// Absolute path to the repository root.
    pub root_path: PathBuf,
    /// Absolute path to the root's local module directory.
    pub root_module_dir: PathBuf,
}

/// A directed graph over repo-local packages, keyed by name (spec §3, §4.2).
#[derive(Debug, Clone, Default)]
pub struct PackageGraph {
    packages: BTreeMap<PackageName, Package>,
}

impl FromIterator<Package> for PackageGraph {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        let packages = iter.into_iter().map(|p| (p.name.clone(), p)).collect();
        Self { packages }
    }
}

impl PackageGraph {
    /// Builds a graph from an explicit list of packages.
    pub fn new(packages: impl IntoIterator<Item = Package>) -> Self {
        Self::from_iter(packages)
    }

    /// Number of packages in the graph.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// True if the graph has no packages.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Iterates over all packages in the graph, in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Looks up a package by name.
    pub fn get(&self, name: &PackageName) -> Option<&Package> {
        self.packages.get(name)
    }

    /// Returns the repo-local package named `name` iff it exists and,
    /// when `range` is given, its version satisfies `range` (spec §4.2).
    pub fn find(&self, name: &PackageName, range: Option<&VersionReq>) -> Option<&Package> {
        let package = self.packages.get(name)?;

        match range {
            Some(range) if !range.matches(&package.version) => None,
            _ => Some(package),
        }
    }

    /// True iff [`PackageGraph::find`] would return a package.
    pub fn has(&self, name: &PackageName, range: Option<&VersionReq>) -> bool {
        self.find(name, range).is_some()
    }

    /// Computes the topological batching of the graph (spec §4.2): an
    /// ordered sequence of batches where each batch holds packages with no
    /// intra-batch dependency edges, and later batches depend only on
    /// earlier ones. Only edges to other repo-local packages count; a
    /// dependency on a package absent from the graph (i.e. an external
    /// dependency) has no bearing on ordering.
    ///
    /// Uses Kahn's algorithm. Within a batch, packages are ordered
    /// lexicographically by name so that identical inputs always produce
    /// byte-identical batch sequences (spec §4.2, §8 "Plan purity").
    pub fn topological_batches(&self) -> Result<Vec<Vec<PackageName>>, BootstrapError> {
        let mut in_degree: HashMap<&PackageName, usize> = HashMap::new();
        let mut dependents: HashMap<&PackageName, Vec<&PackageName>> = HashMap::new();

        for package in self.packages.values() {
            in_degree.entry(&package.name).or_insert(0);

            for dep_name in package.dependencies.keys() {
                // Only local edges participate in batching.
                if let Some(dep_package) = self.packages.get(dep_name) {
                    *in_degree.entry(&package.name).or_insert(0) += 1;
                    dependents
                        .entry(&dep_package.name)
                        .or_default()
                        .push(&package.name);
                }
            }
        }

        let mut batches = Vec::new();
        let mut remaining = in_degree.clone();
        let mut processed = 0usize;

        loop {
            let mut ready: Vec<&PackageName> = remaining
                .iter()
                .filter(|&(_, &degree)| degree == 0)
                .map(|(&name, _)| name)
                .collect();

            if ready.is_empty() {
                break;
            }

            ready.sort();

            for name in &ready {
                remaining.remove(name);
            }

            for name in &ready {
                if let Some(deps) = dependents.get(name) {
                    for dependent in deps {
                        if let Some(degree) = remaining.get_mut(dependent) {
                            *degree -= 1;
                        }
                    }
                }
            }

            processed += ready.len();
            batches.push(ready.into_iter().cloned().collect());
        }

        if processed != self.packages.len() {
            let unprocessed: Vec<_> = remaining.keys().map(|n| n.to_string()).collect();
            return Err(BootstrapError::DependencyCycle(unprocessed.join(", ")));
        }

        Ok(batches)
    }
}
