//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use harvester_core::harvest::{HarvestError, HarvestProfile, RunConfig};
use harvester_core::{Dialect, GraphFormat, OutputTarget};

/// Harvest a paginated metadata feed and map it into other vocabularies.
///
/// Harvester follows a feed page by page, fetches every element it lists
/// and writes one compiled artifact per requested output into
/// `<output-root>/<run-name>/`.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(author, version, about)]
pub struct Args {
    /// URL or path of the first feed page
    pub start: Option<String>,

    /// TOML profile supplying defaults; flags given here win
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Dialect of the feed pages (beacon, schema, cmif)
    #[arg(short = 'd', long)]
    pub feed_dialect: Option<Dialect>,

    /// Dialect of the elements; defaults to the feed dialect, or schema for BEACON feeds
    #[arg(long)]
    pub element_dialect: Option<Dialect>,

    /// Outputs to produce (files, triples, beacon, csv, cto), comma separated
    #[arg(short, long = "output", value_delimiter = ',')]
    pub outputs: Vec<OutputTarget>,

    /// Serialization of graph outputs (turtle, ntriples, rdfxml, jsonld)
    #[arg(short, long)]
    pub graph_format: Option<GraphFormat>,

    /// Parent directory of run directories
    #[arg(long, value_name = "DIR")]
    pub output_root: Option<PathBuf>,

    /// Run directory name (default: start timestamp)
    #[arg(short = 'n', long)]
    pub run_name: Option<String>,

    /// Content type to request and to assume when a response does not say
    #[arg(long)]
    pub content_type: Option<String>,

    /// Only fetch element URIs containing this text
    #[arg(long)]
    pub filter: Option<String>,

    /// Replace text in element URIs before fetching
    #[arg(long, num_args = 2, value_names = ["FROM", "TO"])]
    pub replace: Option<Vec<String>>,

    /// Append text to element URIs before fetching
    #[arg(long)]
    pub append: Option<String>,

    /// Feed URI to record instead of the one the feed declares
    #[arg(long = "feed")]
    pub feed_override: Option<String>,

    /// Data catalog URI to record on every element
    #[arg(long = "catalog")]
    pub catalog_override: Option<String>,

    /// Publisher URI or name to record on every element
    #[arg(long = "publisher")]
    pub publisher_override: Option<String>,

    /// Basic-Auth user name
    #[arg(short, long)]
    pub username: Option<String>,

    /// Basic-Auth password
    #[arg(short, long)]
    pub password: Option<String>,

    /// Maximum number of feed pages to follow
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_pagination: Option<u64>,

    /// Fixed delay between requests in milliseconds; skips robots.txt
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// File count at which graph outputs are merged by streaming
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub streaming_threshold: Option<u64>,

    /// Authority classification cache (default: <output-root>/authorities.json)
    #[arg(long, value_name = "FILE")]
    pub authority_cache: Option<PathBuf>,

    /// Keep the authority cache in memory only
    #[arg(long, conflicts_with = "authority_cache")]
    pub no_authority_cache: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output and the progress line
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Builds the run configuration: profile first, then flags.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] when the profile cannot be read or a numeric
    /// flag does not fit.
    pub fn run_config(&self) -> Result<RunConfig, HarvestError> {
        let mut config = match &self.profile {
            Some(path) => RunConfig::from_profile(HarvestProfile::load(path)?),
            None => RunConfig::new(""),
        };

        if let Some(start) = &self.start {
            config.start_location.clone_from(start);
        }
        if let Some(dialect) = self.feed_dialect {
            config.feed_dialect = dialect;
            if self.element_dialect.is_none() && dialect.reads_elements() {
                config.element_dialect = dialect;
            }
        }
        if let Some(dialect) = self.element_dialect {
            config.element_dialect = dialect;
        }
        if !self.outputs.is_empty() {
            config.outputs.clone_from(&self.outputs);
        }
        if let Some(format) = self.graph_format {
            config.graph_format = format;
        }
        if let Some(root) = &self.output_root {
            config.output_root.clone_from(root);
        }
        override_with(&mut config.run_name, self.run_name.as_deref());
        override_with(&mut config.content_type, self.content_type.as_deref());
        override_with(&mut config.rewrite.filter, self.filter.as_deref());
        override_with(&mut config.rewrite.append, self.append.as_deref());
        if let Some([from, to]) = self.replace.as_deref() {
            config.rewrite.replace = Some((from.clone(), to.clone()));
        }
        override_with(&mut config.feed_override, self.feed_override.as_deref());
        override_with(&mut config.catalog_override, self.catalog_override.as_deref());
        override_with(&mut config.publisher_override, self.publisher_override.as_deref());
        override_with(&mut config.username, self.username.as_deref());
        override_with(&mut config.password, self.password.as_deref());
        if let Some(max) = self.max_pagination {
            config.max_pagination = to_usize("max_pagination", max)?;
        }
        if let Some(ms) = self.delay_ms {
            config.delay_override = Some(Duration::from_millis(ms));
        }
        if let Some(threshold) = self.streaming_threshold {
            config.streaming_threshold = to_usize("streaming_threshold", threshold)?;
        }
        config.quiet |= self.quiet;
        Ok(config)
    }

    /// Where the authority cache lives, `None` for in-memory.
    #[must_use]
    pub fn authority_cache_path(&self, config: &RunConfig) -> Option<PathBuf> {
        if self.no_authority_cache {
            return None;
        }
        Some(
            self.authority_cache
                .clone()
                .unwrap_or_else(|| config.output_root.join("authorities.json")),
        )
    }
}

fn override_with(slot: &mut Option<String>, value: Option<&str>) {
    if let Some(value) = value {
        *slot = Some(value.to_string());
    }
}

fn to_usize(field: &str, value: u64) -> Result<usize, HarvestError> {
    usize::try_from(value).map_err(|_| {
        HarvestError::config(format!(
            "Invalid config value for `{field}`: {value}. Expected a number this platform can address"
        ))
    })
}
