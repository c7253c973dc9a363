//! Mapping errors.

use thiserror::Error;

use super::OutputTarget;

/// Errors raised while serializing a record.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The target keys its output on the element URI and the record has none.
    #[error("{target} output needs an element URI; the record read from {location} has none")]
    MissingUri {
        /// Target that needed the URI
        target: OutputTarget,
        /// Where the record was read from
        location: String,
    },

    /// The serializer rejected the output.
    #[error("failed to serialize {target} output: {message}")]
    Serialize {
        /// Target being written
        target: OutputTarget,
        /// What went wrong
        message: String,
    },

    /// Writing a CSV row failed.
    #[error("failed to write CSV row: {0}")]
    Csv(#[from] ::csv::Error),
}

impl MappingError {
    /// Creates a missing URI error.
    #[must_use]
    pub fn missing_uri(target: OutputTarget, location: &str) -> Self {
        Self::MissingUri {
            target,
            location: location.to_string(),
        }
    }

    /// Creates a serialization error.
    pub fn serialize(target: OutputTarget, message: impl std::fmt::Display) -> Self {
        Self::Serialize {
            target,
            message: message.to_string(),
        }
    }
}
