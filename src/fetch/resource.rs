//! The outcome of fetching one location.

use super::error::FetchError;
use super::file_type::FileType;
use super::parse::parse_document;
use crate::query::{RdfGraph, XmlTree};

/// A parsed document.
#[derive(Debug, Clone)]
pub enum Document {
    Graph(RdfGraph),
    Xml(XmlTree),
}

/// Everything known about one fetched location.
///
/// `success` is true only when the bytes were retrieved and, for formats
/// that parse, parsed. On failure `failure` says why.
#[derive(Debug)]
pub struct Resource {
    pub location: String,
    pub success: bool,
    pub raw: Vec<u8>,
    pub text: String,
    pub content_type: Option<String>,
    pub file_type: FileType,
    /// HTTP status for remote locations.
    pub status: Option<u16>,
    pub document: Option<Document>,
    pub failure: Option<FetchError>,
}

impl Resource {
    pub(crate) fn failed(location: &str, status: Option<u16>, failure: FetchError) -> Self {
        Self {
            location: location.to_string(),
            success: false,
            raw: Vec::new(),
            text: String::new(),
            content_type: None,
            file_type: FileType::Text,
            status,
            document: None,
            failure: Some(failure),
        }
    }

    /// Parses text that is already in memory, as if it had been fetched
    /// from `location`.
    #[must_use]
    pub fn from_text(location: &str, file_type: FileType, text: &str) -> Self {
        let (success, file_type, document, failure) =
            match parse_document(location, file_type, text) {
                Ok((effective, document)) => (true, effective, document, None),
                Err(error) => (false, file_type, None, Some(error)),
            };
        Self {
            location: location.to_string(),
            success,
            raw: text.as_bytes().to_vec(),
            text: text.to_string(),
            content_type: Some(file_type.media_type().to_string()),
            file_type,
            status: None,
            document,
            failure,
        }
    }

    /// The RDF graph, when the document parsed into one.
    #[must_use]
    pub fn graph(&self) -> Option<&RdfGraph> {
        match &self.document {
            Some(Document::Graph(graph)) => Some(graph),
            _ => None,
        }
    }

    /// The XML tree, when the document parsed into one.
    #[must_use]
    pub fn xml(&self) -> Option<&XmlTree> {
        match &self.document {
            Some(Document::Xml(tree)) => Some(tree),
            _ => None,
        }
    }

    /// Short reason for logs and reports.
    #[must_use]
    pub fn failure_reason(&self) -> String {
        self.failure
            .as_ref()
            .map_or_else(|| "unknown failure".to_string(), ToString::to_string)
    }
}
