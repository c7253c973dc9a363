//! Error types for format extraction.

use thiserror::Error;

use super::Dialect;

/// Errors raised when a fetched resource does not yield a record.
///
/// All of these describe dirty input, never a bug: on a feed page they
/// abort the run, on an element they mark it incompatible.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    /// The resource did not parse into the kind of document the dialect reads.
    #[error("{location}: expected {expected} content")]
    MissingDocument {
        /// Location of the resource
        location: String,
        /// What the dialect needs ("RDF graph", "XML tree", "text")
        expected: &'static str,
    },

    /// The document parsed but lacks the structure the dialect describes.
    #[error("{location}: {reason}")]
    MissingStructure {
        /// Location of the resource
        location: String,
        /// Which part is missing
        reason: String,
    },

    /// The dialect has no notion of the requested record kind.
    #[error("the {dialect} dialect does not describe {what} records")]
    Unsupported {
        /// Dialect that was asked
        dialect: Dialect,
        /// "feed" or "element"
        what: &'static str,
    },
}

impl ExtractionError {
    /// Creates a `MissingDocument` error.
    #[must_use]
    pub fn missing_document(location: &str, expected: &'static str) -> Self {
        Self::MissingDocument {
            location: location.to_string(),
            expected,
        }
    }

    /// Creates a `MissingStructure` error.
    #[must_use]
    pub fn missing_structure(location: &str, reason: impl Into<String>) -> Self {
        Self::MissingStructure {
            location: location.to_string(),
            reason: reason.into(),
        }
    }
}
