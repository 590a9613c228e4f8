// (c) Copyright 2026 reposprout contributors. All rights reserved.

//! Placement Planner (spec §4.4): the core of this crate. Aggregates
//! version requirements across the repo, decides hoisting, picks a
//! winning version on disagreement, and classifies each installation as
//! satisfied or pending. Pure: the only I/O is through the injected
//! `is_installed` probe.

use std::{collections::BTreeMap, path::Path};

use semver::VersionReq;

use crate::{
    config::BootstrapConfig,
    graph::{PackageGraph, PackageName},
    hoist::{self, package_is_selected},
    progress::{ProgressEvent, ProgressSink, WarningCode},
};

/// One hoisted install destined for the repository root (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootInstall {
    /// Name of the hoisted dependency.
    pub name: PackageName,
    /// Repo-local packages that end up depending on the hoisted version,
    /// deduplicated and in name order.
    pub dependents: Vec<PackageName>,
    /// The `name@range` spec passed to the installer.
    pub spec: String,
    /// Whether this install is already satisfied on disk at plan time.
    pub is_satisfied: bool,
}

/// One per-package install of an external dependency (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafInstall {
    /// The `name@range` spec passed to the installer.
    pub spec: String,
    /// Whether this install is already satisfied on disk at plan time.
    pub is_satisfied: bool,
}

/// The output of the planner (spec §3): where every external dependency
/// will be installed, and whether each install is already satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Hoisted installs, one per dependency name that was hoisted.
    pub root_installs: Vec<RootInstall>,
    /// Per-requester leaf installs, keyed by requester package name.
    pub leaves: BTreeMap<PackageName, Vec<LeafInstall>>,
}

impl Plan {
    /// True iff no root or leaf installs were planned at all.
    pub fn is_empty(&self) -> bool {
        self.root_installs.is_empty() && self.leaves.values().all(Vec::is_empty)
    }
}

/// One (range, requesters) tally inside the Dependency Aggregate, keyed by
/// the range's canonical string form so ties can be broken
/// lexicographically (spec §4.4 step 3, open question 2).
#[derive(Debug, Clone, Default)]
struct Tally {
    count: usize,
    requesters: Vec<PackageName>,
}

/// The Dependency Aggregate (spec §3): for each external dependency name,
/// a mapping from requested range (by canonical string) to a [`Tally`].
type Aggregate = BTreeMap<PackageName, BTreeMap<String, Tally>>;

/// Probe for whether `spec` is already materially present at `location`.
/// Intentionally a coarse, presence-only check (spec §4.4 step 4, §9 open
/// question 1) — not a version probe.
pub type InstalledProbe<'a> = dyn Fn(&Path, &str) -> bool + 'a;

/// Builds the Plan for `graph` under `config`, seeded by `root`'s
/// declared dependencies, reporting diagnostics to `sink` (spec §4.4).
pub fn plan(
    graph: &PackageGraph,
    root: &crate::graph::RootManifest,
    config: &BootstrapConfig,
    is_installed: &InstalledProbe<'_>,
    sink: &dyn ProgressSink,
) -> Plan {
    let hoist_include = hoist::resolve_hoist_patterns(config.hoist.as_ref());
    let nohoist_exclude = hoist::NamePatterns::compile(&[], &config.nohoist);

    let mut aggregate = seed_aggregate(root);
    fill_aggregate(&mut aggregate, graph, config);

    let mut plan = Plan::default();

    for (name, ranges) in &aggregate {
        let hoistable = hoist::is_hoistable(name, hoist_include.as_ref(), &nohoist_exclude);

        if hoistable {
            plan_hoisted_dependency(name, ranges, root, graph, is_installed, sink, &mut plan);
        } else {
            for (range_str, tally) in ranges {
                for requester in &tally.requesters {
                    push_leaf(&mut plan.leaves, requester, graph, name, range_str);
                }
            }
        }
    }

    plan
}

fn seed_aggregate(root: &crate::graph::RootManifest) -> Aggregate {
    let mut aggregate = Aggregate::new();

    for (name, range) in &root.dependencies {
        aggregate
            .entry(name.clone())
            .or_default()
            .entry(range.to_string())
            .or_default();
    }

    aggregate
}

fn fill_aggregate(aggregate: &mut Aggregate, graph: &PackageGraph, config: &BootstrapConfig) {
    for requester in graph.iter() {
        if !package_is_selected(&requester.name, &config.scope, &config.ignore) {
            continue;
        }

        for (name, range) in &requester.dependencies {
            if graph.find(name, Some(range)).is_some() {
                continue;
            }

            let tally = aggregate
                .entry(name.clone())
                .or_default()
                .entry(range.to_string())
                .or_default();
            tally.count += 1;
            tally.requesters.push(requester.name.clone());
        }
    }
}

/// Picks the range string with the highest requester count, breaking ties
/// by taking the lexicographically smallest range (the first one a
/// `BTreeMap`'s ascending iteration encounters at the maximum).
fn most_common_range(ranges: &BTreeMap<String, Tally>) -> String {
    let mut best: Option<(&str, usize)> = None;

    for (range_str, tally) in ranges {
        match best {
            Some((_, best_count)) if tally.count <= best_count => {}
            _ => best = Some((range_str.as_str(), tally.count)),
        }
    }

    best.map(|(range_str, _)| range_str.to_owned())
        .expect("most_common_range called on an empty tally map")
}

#[allow(clippy::too_many_arguments)]
fn plan_hoisted_dependency(
    name: &PackageName,
    ranges: &BTreeMap<String, Tally>,
    root: &crate::graph::RootManifest,
    graph: &PackageGraph,
    is_installed: &InstalledProbe<'_>,
    sink: &dyn ProgressSink,
    plan: &mut Plan,
) {
    let common_version = most_common_range(ranges);
    let root_version = root
        .dependencies
        .get(name)
        .map(|r| r.to_string())
        .unwrap_or_else(|| common_version.clone());

    if root_version != common_version {
        sink.emit(ProgressEvent::Warning {
            code: WarningCode::HoistRootVersion,
            message: format!(
                "{name}: root requires {root_version}, most common requested version is {common_version}"
            ),
        });
    }

    let mut dependents: Vec<PackageName> = ranges
        .get(&root_version)
        .map(|tally| tally.requesters.clone())
        .unwrap_or_default();
    dependents.retain(|requester| graph.has(requester, None));
    dependents.sort();
    dependents.dedup();

    let spec = format!("{name}@{root_version}");
    plan.root_installs.push(RootInstall {
        name: name.clone(),
        dependents,
        is_satisfied: is_installed(&root.root_path, &spec),
        spec,
    });

    for (range_str, tally) in ranges {
        if *range_str == root_version {
            continue;
        }

        for requester in &tally.requesters {
            sink.emit(ProgressEvent::Warning {
                code: WarningCode::HoistPkgVersion,
                message: format!(
                    "{requester}: requires {name}@{range_str}, but {root_version} is hoisted to root"
                ),
            });
            push_leaf(&mut plan.leaves, requester, graph, name, range_str);
        }
    }
}

fn push_leaf(
    leaves: &mut BTreeMap<PackageName, Vec<LeafInstall>>,
    requester: &PackageName,
    graph: &PackageGraph,
    name: &PackageName,
    range_str: &str,
) {
    let is_satisfied = graph
        .get(requester)
        .map(|package| package.has_installed(name))
        .unwrap_or(false);

    leaves
        .entry(requester.clone())
        .or_default()
        .push(LeafInstall {
            spec: format!("{name}@{range_str}"),
            is_satisfied,
        });
}
