//! Query facade over parsed documents.
//!
//! Extractors never touch the RDF or XML libraries directly. They ask the
//! questions in this module instead:
//! - [`rdf`] - object/subject/triple lookups over an RDF graph
//! - [`xml`] - an element tree with language-aware text lookups
//! - [`path`] - the constrained path language used by the XML queries
//! - [`broadcast`] - single-or-many arguments

pub mod broadcast;
pub mod path;
pub mod rdf;
pub mod xml;

use thiserror::Error;

pub use broadcast::IntoCandidates;
pub use path::{PathContext, XmlPath};
pub use rdf::{RdfGraph, TriplePattern};
pub use xml::{NodeId, XmlTree};

/// Errors raised while building a query or a queryable document.
///
/// Evaluating a compiled query never fails; it just finds nothing.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A path expression could not be compiled.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The path as written, placeholders substituted.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A path uses a namespace prefix the context does not declare.
    #[error("unknown namespace prefix '{prefix}' in path '{path}'")]
    UnknownPrefix {
        /// The offending path.
        path: String,
        /// The undeclared prefix.
        prefix: String,
    },

    /// A path references a placeholder the context does not define.
    #[error("unknown placeholder '{{{name}}}' in path '{path}'")]
    UnknownPlaceholder {
        /// The offending path.
        path: String,
        /// The placeholder name.
        name: String,
    },

    /// An XML document could not be read into a tree.
    #[error("malformed XML: {reason}")]
    Xml {
        /// Reader error message.
        reason: String,
    },
}

impl QueryError {
    /// Creates an invalid-path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a malformed-XML error.
    pub fn xml(reason: impl ToString) -> Self {
        Self::Xml {
            reason: reason.to_string(),
        }
    }
}
