// (c) Copyright 2026 reposprout contributors. All rights reserved.

use std::path::PathBuf;

use clap::Parser;
use miette::IntoDiagnostic;
use reposprout::config::{BootstrapConfig, HoistSpec};

/// Dependency placement planner and parallel bootstrap orchestrator for
/// npm-compatible monorepos.
#[derive(Debug, Parser)]
#[command(name = "reposprout", version, about)]
struct Cli {
    /// Path to the repo fixture describing the root manifest and every
    /// repo-local package (see `src/manifest.rs`).
    fixture: PathBuf,

    /// Enables hoisting for every dependency (pattern `**`). Mutually
    /// exclusive with `--hoist-pattern`, which restricts hoisting instead
    /// of enabling it unconditionally.
    #[arg(long, conflicts_with = "hoist_pattern")]
    hoist: bool,

    /// Enables hoisting for names matching any of these comma-separated
    /// glob patterns.
    #[arg(long, value_delimiter = ',')]
    hoist_pattern: Vec<String>,

    /// Exempts names matching any of these comma-separated glob patterns
    /// from hoisting.
    #[arg(long, value_delimiter = ',')]
    nohoist: Vec<String>,

    /// Installer executable to invoke (e.g. `npm`, `yarn`).
    #[arg(long, default_value = "npm")]
    npm_client: String,

    /// Registry URL passed through to the installer verbatim.
    #[arg(long)]
    registry: Option<String>,

    /// Opaque installer coordination token; auto-allocated if needed and unset.
    #[arg(long)]
    mutex: Option<String>,

    /// Delegates all installation to a single root installer invocation.
    #[arg(long)]
    use_workspaces: bool,

    /// Phase-internal parallelism cap.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Skips the preinstall/postinstall/prepublish/prepare lifecycle phases.
    #[arg(long)]
    ignore_scripts: bool,

    /// Only operate on packages matching one of these comma-separated
    /// glob patterns.
    #[arg(long, value_delimiter = ',')]
    scope: Vec<String>,

    /// Excludes packages matching one of these comma-separated glob patterns.
    #[arg(long, value_delimiter = ',')]
    ignore: Vec<String>,
}

impl From<Cli> for BootstrapConfig {
    fn from(cli: Cli) -> Self {
        let hoist = if cli.hoist {
            Some(HoistSpec::All)
        } else if !cli.hoist_pattern.is_empty() {
            Some(HoistSpec::Patterns(cli.hoist_pattern))
        } else {
            None
        };

        let mut config = BootstrapConfig {
            hoist,
            nohoist: cli.nohoist,
            npm_client: cli.npm_client,
            registry: cli.registry,
            mutex: cli.mutex,
            use_workspaces: cli.use_workspaces,
            ignore_scripts: cli.ignore_scripts,
            scope: cli.scope,
            ignore: cli.ignore,
            ..BootstrapConfig::default()
        };

        if let Some(concurrency) = cli.concurrency {
            config.concurrency = concurrency.max(1);
        }

        config
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    human_panic::setup_panic!();
    tracing_subscriber::fmt().compact().init();

    let cli = Cli::parse();
    let fixture = cli.fixture.clone();
    let config = BootstrapConfig::from(cli);

    reposprout::command::bootstrap(&fixture, config)
        .await
        .into_diagnostic()?;

    Ok(())
}
