//! Format extractors: from a fetched resource to canonical records.
//!
//! Every dialect implements [`FormatExtractor`] and only talks to the
//! document through the query facade, so an extractor never cares whether
//! its graph came from Turtle, JSON-LD or RDF/XML.
//!
//! # Dialects
//!
//! - [`Dialect::Beacon`] - flat link lists with `#KEY: value` meta lines
//! - [`Dialect::Schema`] - schema.org `DataFeed` documents, paged with Hydra
//! - [`Dialect::Cmif`] - TEI correspondence metadata, letters inline
//!
//! # Example
//!
//! ```
//! use harvester_core::extract::{Dialect, extractor};
//! use harvester_core::fetch::{FileType, Resource};
//!
//! let text = "#FORMAT: BEACON\n#TARGET: https://example.org/work/{ID}\n118540238\n";
//! let resource = Resource::from_text("beacon.txt", FileType::Text, text);
//! let feed = extractor(Dialect::Beacon).extract_feed(&resource).unwrap();
//! assert_eq!(feed.elements.len(), 1);
//! ```

mod beacon;
mod cmif;
mod error;
mod schema;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use beacon::BeaconExtractor;
pub use cmif::CmifExtractor;
pub use error::ExtractionError;
pub use schema::SchemaExtractor;

use crate::fetch::Resource;
use crate::model::{ElementRecord, FeedRecord};

/// Reads canonical records out of fetched resources.
///
/// Implementations never panic on malformed input; they return an
/// [`ExtractionError`] instead.
pub trait FormatExtractor: Send + Sync {
    /// The dialect this extractor reads.
    fn dialect(&self) -> Dialect;

    /// Reads the feed-level fields of one feed page.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] when the page is not a feed of this dialect.
    fn extract_feed(&self, resource: &Resource) -> Result<FeedRecord, ExtractionError>;

    /// Reads one element.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] when the resource is not an element of
    /// this dialect.
    fn extract_element(&self, resource: &Resource) -> Result<ElementRecord, ExtractionError>;
}

/// Source dialect selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Beacon,
    Schema,
    Cmif,
}

impl Dialect {
    /// Every dialect, in help-text order.
    pub const ALL: [Self; 3] = [Self::Beacon, Self::Schema, Self::Cmif];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beacon => "beacon",
            Self::Schema => "schema",
            Self::Cmif => "cmif",
        }
    }

    /// Content type to request when fetching documents of this dialect.
    #[must_use]
    pub fn preferred_content_type(&self) -> &'static str {
        match self {
            Self::Beacon => "text/plain",
            Self::Schema => "text/turtle, application/ld+json;q=0.9, application/rdf+xml;q=0.8",
            Self::Cmif => "application/tei+xml, application/xml;q=0.9",
        }
    }

    /// Whether elements can be read in this dialect. BEACON only lists
    /// element locations.
    #[must_use]
    pub fn reads_elements(&self) -> bool {
        !matches!(self, Self::Beacon)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beacon" => Ok(Self::Beacon),
            "schema" | "schema.org" => Ok(Self::Schema),
            "cmif" => Ok(Self::Cmif),
            other => Err(format!(
                "unknown dialect '{other}' (expected one of: beacon, schema, cmif)"
            )),
        }
    }
}

/// Returns the extractor for a dialect.
#[must_use]
pub fn extractor(dialect: Dialect) -> Box<dyn FormatExtractor> {
    match dialect {
        Dialect::Beacon => Box::new(BeaconExtractor),
        Dialect::Schema => Box::new(SchemaExtractor),
        Dialect::Cmif => Box::new(CmifExtractor),
    }
}
