//! CLI entry point for the harvester tool.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use harvester_core::authority::{AuthorityCache, AuthorityClassifier};
use harvester_core::harvest::{Harvester, LOG_FILE_NAME, RunLayout};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let config = args.run_config().context("failed to build run configuration")?;
    config.validate().context("invalid run configuration")?;

    let run_name = config.run_name_or(Utc::now());
    let layout = RunLayout::new(&config.output_root, &run_name);
    layout.create()?;

    // The guard flushes harvesting.log when main returns
    let _log_guard = init_tracing(&layout, args.verbose, args.quiet);

    debug!(?args, "CLI arguments parsed");
    info!(run_dir = %layout.run_dir().display(), "Harvester starting");

    let cache = match args.authority_cache_path(&config) {
        Some(path) => AuthorityCache::load(&path)
            .with_context(|| format!("failed to load authority cache {}", path.display()))?,
        None => AuthorityCache::in_memory(),
    };
    let classifier = Arc::new(AuthorityClassifier::new(cache));

    let harvester = Harvester::new(config, layout, Some(Arc::clone(&classifier)))?;
    let report = harvester.run().await?;

    // The harvester is gone, so this is the last reference
    match Arc::try_unwrap(classifier) {
        Ok(classifier) => {
            let mut cache = classifier.into_cache();
            if let Err(error) = cache.save() {
                warn!(%error, "failed to save authority cache");
            }
        }
        Err(_) => warn!("authority cache still shared, not saved"),
    }

    for summary in &report.compiled {
        info!(
            target = %summary.target,
            files = summary.files,
            output = %summary.output.display(),
            "Compiled"
        );
    }

    if report.success {
        info!("{report}");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{report}");
        Ok(ExitCode::FAILURE)
    }
}

/// Console logging plus `harvesting.log` in the run directory.
///
/// Priority: `RUST_LOG` > quiet flag > verbose flag > default (info). The
/// log file ignores the quiet flag.
fn init_tracing(layout: &RunLayout, verbose: u8, quiet: bool) -> WorkerGuard {
    let verbose_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let console_level = if quiet { "error" } else { verbose_level };

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(console_level));
    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbose_level));

    let file_appender = tracing_appender::rolling::never(layout.run_dir(), LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer)
                .with_filter(file_filter),
        )
        .try_init();
    guard
}
