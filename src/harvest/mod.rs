//! Crawling a paginated feed into per-target outputs.
//!
//! A [`Harvester`] walks a feed page by page, fetches every element the
//! page lists, maps each element into every requested [`OutputTarget`]
//! and finally compiles the per-element files into one artifact per
//! target.
//!
//! # Features
//!
//! - Politeness delay from `robots.txt`, or a fixed override
//! - Element URI rewrites (filter, replace, append)
//! - Missing and incompatible elements are reported, not fatal
//! - A failed feed page aborts the run; outputs are compiled anyway
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::harvest::{Harvester, RunConfig, RunLayout};
//! use harvester_core::mapper::OutputTarget;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = RunConfig::new("https://example.org/feed.ttl");
//! config.outputs = vec![OutputTarget::Cto, OutputTarget::Beacon];
//! config.validate()?;
//!
//! let layout = RunLayout::new(&config.output_root, "example-run");
//! layout.create()?;
//! let report = Harvester::new(config, layout, None)?.run().await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! [`OutputTarget`]: crate::mapper::OutputTarget

mod config;
mod harvester;
mod layout;
mod progress;
mod report;
mod rewrite;

use std::path::PathBuf;

use thiserror::Error;

use crate::compile::CompileError;
use crate::mapper::MappingError;

pub use config::{DEFAULT_MAX_PAGINATION, DEFAULT_OUTPUT_ROOT, HarvestProfile, RunConfig};
pub use harvester::{CrawlState, Harvester};
pub use layout::{LOG_FILE_NAME, RunLayout};
pub use progress::HarvestProgress;
pub use report::HarvestReport;
pub use rewrite::ElementRewrite;

/// Errors that stop a run.
///
/// Feed and element failures are not errors; they end up in the
/// [`HarvestReport`].
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The run configuration or profile is invalid.
    #[error("{message}")]
    Config {
        /// What is wrong and what was expected
        message: String,
    },

    /// Reading or writing run files failed.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The file or directory involved
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {source}")]
    HttpClient {
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl HarvestError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
