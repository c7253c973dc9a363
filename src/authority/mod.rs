//! Classification of authority URIs into entity categories.
//!
//! Mappers that emit typed relations (person, place, concept...) ask an
//! [`AuthorityClassifier`] what an external URI stands for. The classifier
//! walks a ladder of strategies and stops at the first answer:
//!
//! 1. the persistent [`AuthorityCache`]
//! 2. namespace membership (GeoNames is always a location, ORCID a person)
//! 3. URI path hints (`/person/`, `/place/`, ...)
//! 4. caller-supplied [`ClassificationStrategy`] implementations
//!
//! The cache is loaded by the caller at start, injected into the
//! classifier and saved by the caller at the end of the run.

mod cache;
mod classifier;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cache::{AuthorityCache, CacheEntry};
pub use classifier::{AuthorityClassifier, ClassificationStrategy, StrategyOutcome};

/// What an authority URI identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Person,
    Organization,
    Location,
    Event,
    SubjectConcept,
    ElementType,
}

impl EntityCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Organization => "organization",
            Self::Location => "location",
            Self::Event => "event",
            Self::SubjectConcept => "subject_concept",
            Self::ElementType => "element_type",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "person" => Ok(Self::Person),
            "organization" => Ok(Self::Organization),
            "location" => Ok(Self::Location),
            "event" => Ok(Self::Event),
            "subject_concept" => Ok(Self::SubjectConcept),
            "element_type" => Ok(Self::ElementType),
            _ => Err(format!("invalid entity category: {s}")),
        }
    }
}

/// Errors raised while loading or saving the authority cache.
#[derive(Debug, Error)]
pub enum AuthorityError {
    /// Reading or writing the cache file failed.
    #[error("authority cache I/O error at {path}: {source}")]
    Io {
        /// The cache file
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// The cache file is not valid JSON of the expected shape.
    #[error("authority cache at {path} is malformed: {source}")]
    Json {
        /// The cache file
        path: PathBuf,
        /// The underlying error
        #[source]
        source: serde_json::Error,
    },
}

impl AuthorityError {
    /// Creates an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
