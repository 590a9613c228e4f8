//! Loads a repo fixture from disk and exercises the planner against it,
//! the way a caller assembling a `PackageGraph` from a real monorepo would.

use std::path::Path;

use reposprout::{config::{BootstrapConfig, HoistSpec}, manifest, planner, progress::RecordingSink};

#[tokio::test]
async fn hoists_react_and_leaves_the_outlier_requester() {
    let fixture_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/react-monorepo.toml");

    let (graph, root) = manifest::load_repo_fixture(&fixture_path)
        .await
        .expect("fixture should parse");

    let config = BootstrapConfig {
        hoist: Some(HoistSpec::All),
        ..BootstrapConfig::default()
    };
    let sink = RecordingSink::default();

    let plan = planner::plan(&graph, &root, &config, &|_, _| false, &sink);

    assert_eq!(plan.root_installs.len(), 1);
    assert_eq!(plan.root_installs[0].spec, "react@15.x");

    let outlier_leaves = plan
        .leaves
        .get(&reposprout::graph::PackageName::unchecked("outlier"))
        .expect("outlier requester gets a leaf install");
    assert_eq!(outlier_leaves.len(), 1);
    assert_eq!(outlier_leaves[0].spec, "react@^0.14.0");
}
