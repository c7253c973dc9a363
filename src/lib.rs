//! Harvester Core Library
//!
//! This library harvests metadata published as paginated feeds (RDF,
//! JSON-LD, TEI/XML or flat link lists), normalizes what it finds into
//! canonical value types and maps those into other vocabularies.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - Retrieval and classification of remote and local sources
//! - [`query`] - Query facade over RDF graphs and XML trees
//! - [`model`] - Canonical normalized values and per-resource records
//! - [`extract`] - Source dialects (beacon, schema.org, CMIF)
//! - [`mapper`] - Output targets (beacon, CSV, CTO, triples)
//! - [`authority`] - Entity classification for authority URIs
//! - [`harvest`] - The crawl state machine and run configuration
//! - [`compile`] - Merging per-element files into final artifacts

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod authority;
pub mod compile;
pub mod extract;
pub mod fetch;
pub mod harvest;
pub mod mapper;
pub mod model;
pub mod query;
pub mod user_agent;

// Re-export commonly used types
pub use authority::{AuthorityCache, AuthorityClassifier, EntityCategory};
pub use compile::{CompileError, CompileSummary, compile_target};
pub use extract::{Dialect, ExtractionError, FormatExtractor, extractor};
pub use fetch::{FetchError, FileType, RateLimiter, Resource, SourceFetcher};
pub use harvest::{
    CrawlState, HarvestError, HarvestProfile, HarvestReport, Harvester, RunConfig, RunLayout,
};
pub use mapper::{GraphFormat, MapperOptions, MappingError, OutputMapper, OutputTarget, mapper};
pub use model::{Canonical, Date, ElementRecord, FeedRecord, Label, Uri, UriLabel, UriList};
