//! Retrieval layer for feed pages and elements.
//!
//! Fetches a location (HTTP/HTTPS URL or local path), classifies what came
//! back and parses it into an RDF graph or an XML tree.
//!
//! # Features
//!
//! - One code path for remote and local sources
//! - Content-type and extension based format detection
//! - Embedded JSON-LD discovery in HTML pages
//! - Politeness delay resolved from robots.txt
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::fetch::SourceFetcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = SourceFetcher::new(None)?;
//! let resource = fetcher.fetch("https://example.org/feed.ttl", None).await;
//! if resource.success {
//!     println!("{} parsed as {}", resource.location, resource.file_type);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod file_type;
mod parse;
pub mod rate_limiter;
mod resource;
mod robots;

pub use client::{Credentials, SourceFetcher, is_remote};
pub use error::FetchError;
pub use file_type::FileType;
pub use parse::{extract_embedded_json_ld, parse_document};
pub use rate_limiter::{RateLimiter, wait_if_needed};
pub use resource::{Document, Resource};
pub use robots::{origin_for_robots, resolve_politeness_delay};

// We do NOT define module-local Result aliases.
// Use `Result<T, FetchError>` explicitly in function signatures.
