//! Command-line interface.
//!
//! Thin shell over [`plume_site`]: parse arguments, load configuration,
//! drive one engine operation, translate the report into human output and
//! an exit code. A build whose report contains any unit or aggregate
//! failure exits non-zero even though the rest of the site was written.

use clap::{Parser, Subcommand};
use plume_config::SiteConfig;
use plume_site::{BuildMode, BuildReport, Site};
use plume_storage::LocalBackend;
use plume_storage::backend::StorageBackend;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "plume", version, about = "Incremental static-blog build engine")]
pub struct Cli {
    /// Configuration file (default: plume.toml, then the platform config dir)
    #[arg(long, short, global = true, env = "PLUME_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render changed units and regenerate the aggregate artifacts
    Build {
        /// Ignore persisted state and rebuild everything
        #[arg(long)]
        full: bool,
    },
    /// Show what a build would do, without writing anything
    Plan,
    /// Create a starter site in the current directory
    Init,
}

impl Cli {
    pub async fn run(self) -> ExitCode {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("plume=info,warn")),
            )
            .with_writer(std::io::stderr)
            .init();

        let config = match SiteConfig::load(self.config.as_deref()) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(%err, "Could not load configuration");
                return ExitCode::FAILURE;
            },
        };

        let result = match self.command {
            Command::Build { full } => build(config, full).await,
            Command::Plan => plan(config).await,
            Command::Init => init(config).await,
        };
        match result {
            Ok(code) => code,
            Err(err) => {
                tracing::error!(%err, "Operation failed");
                ExitCode::FAILURE
            },
        }
    }
}

async fn build(config: SiteConfig, full: bool) -> plume_site::error::Result<ExitCode> {
    let site = Site::open(config)?;
    let mode = if full { BuildMode::Full } else { BuildMode::Incremental };
    let report = site.build(mode).await?;
    summarize(&report);
    Ok(if report.success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn plan(config: SiteConfig) -> plume_site::error::Result<ExitCode> {
    let site = Site::open(config)?;
    let plan = site.plan().await?;
    for planned in &plan.rebuild {
        println!("rebuild  {}", planned.unit.slug);
    }
    for planned in &plan.skipped {
        println!("skip     {}", planned.unit.slug);
    }
    for stale in &plan.stale {
        println!("stale    {} ({})", stale.slug, stale.record.output.display());
    }
    println!(
        "{} to rebuild, {} unchanged, {} stale; aggregates {}",
        plan.rebuild.len(),
        plan.skipped.len(),
        plan.stale.len(),
        if plan.aggregates { "will regenerate" } else { "unchanged" },
    );
    Ok(ExitCode::SUCCESS)
}

fn summarize(report: &BuildReport) {
    for failure in &report.failures {
        eprintln!("error: {} ({:?}): {}", failure.unit, failure.stage, failure.message);
    }
    for failure in &report.aggregate_failures {
        eprintln!("error: aggregate {}: {}", failure.name, failure.message);
    }
    for stale in &report.stale {
        let action = if stale.deleted { "deleted" } else { "kept" };
        println!("stale: {} ({action})", stale.output.display());
    }
    println!(
        "{:?} build: {} rebuilt, {} unchanged, aggregates {}{}",
        report.mode,
        report.rebuilt.len(),
        report.skipped,
        if report.aggregates_rebuilt { "regenerated" } else { "unchanged" },
        if report.state_recovered { " (state was unreadable, rebuilt from scratch)" } else { "" },
    );
}

const SAMPLE_CONFIG: &str = r#"[site]
title = "My Blog"
description = "Notes and essays"
base_url = "http://localhost:8000"
"#;

const SAMPLE_POST: &str = r#"---
title: Hello World
date: 2024-01-01
tags: [meta]
---
# Hello World

Welcome to your new blog. Edit this file, add more Markdown files next to
it, and run `plume build`.
"#;

/// Writes a starter configuration and first post, refusing to overwrite
/// anything that already exists.
async fn init(config: SiteConfig) -> plume_site::error::Result<ExitCode> {
    use exn::ResultExt;
    use plume_site::error::ErrorKind;

    let cwd = std::env::current_dir().or_raise(|| ErrorKind::Storage)?;
    let here = LocalBackend::new("site", &cwd).or_raise(|| ErrorKind::Storage)?;

    let post = config.paths.content.join("hello-world.md");
    for (path, body) in [(Path::new("plume.toml"), SAMPLE_CONFIG), (post.as_path(), SAMPLE_POST)] {
        if here.exists(path).await.or_raise(|| ErrorKind::Storage)? {
            println!("exists, skipping: {}", path.display());
            continue;
        }
        here.write(path, body.as_bytes()).await.or_raise(|| ErrorKind::Storage)?;
        println!("created: {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}
