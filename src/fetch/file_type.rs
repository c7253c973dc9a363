//! Classification of retrieved bytes into document formats.

use std::fmt;

use oxrdfio::{JsonLdProfileSet, RdfFormat};

/// Document formats the fetcher can tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Turtle,
    NTriples,
    TriG,
    TriX,
    NQuads,
    JsonLd,
    HexTuples,
    RdfXml,
    /// HTML carrying an embedded JSON-LD block.
    RdfHtml,
    Xml,
    Text,
}

/// Media types, lower-case and without parameters.
const CONTENT_TYPES: [(&str, FileType); 21] = [
    ("text/turtle", FileType::Turtle),
    ("application/x-turtle", FileType::Turtle),
    ("application/n-triples", FileType::NTriples),
    ("application/trig", FileType::TriG),
    ("application/trix", FileType::TriX),
    ("application/trix+xml", FileType::TriX),
    ("application/n-quads", FileType::NQuads),
    ("text/x-nquads", FileType::NQuads),
    ("application/ld+json", FileType::JsonLd),
    ("application/json", FileType::JsonLd),
    ("application/hex+x-ndjson", FileType::HexTuples),
    ("application/rdf+xml", FileType::RdfXml),
    ("text/html", FileType::RdfHtml),
    ("application/xhtml+xml", FileType::RdfHtml),
    ("application/xml", FileType::Xml),
    ("text/xml", FileType::Xml),
    ("application/tei+xml", FileType::Xml),
    ("text/plain", FileType::Text),
    ("text/csv", FileType::Text),
    ("text/tab-separated-values", FileType::Text),
    ("text/x-beacon", FileType::Text),
];

const EXTENSIONS: [(&str, FileType); 16] = [
    ("ttl", FileType::Turtle),
    ("nt", FileType::NTriples),
    ("trig", FileType::TriG),
    ("trix", FileType::TriX),
    ("nq", FileType::NQuads),
    ("jsonld", FileType::JsonLd),
    ("json", FileType::JsonLd),
    ("hext", FileType::HexTuples),
    ("rdf", FileType::RdfXml),
    ("owl", FileType::RdfXml),
    ("html", FileType::RdfHtml),
    ("htm", FileType::RdfHtml),
    ("xml", FileType::Xml),
    ("tei", FileType::Xml),
    ("txt", FileType::Text),
    ("beacon", FileType::Text),
];

impl FileType {
    /// Looks up a `Content-Type` header value. Parameters and case are ignored;
    /// for `Accept`-style lists the first entry counts.
    #[must_use]
    pub fn from_content_type(value: &str) -> Option<Self> {
        let essence = value
            .split([';', ','])
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        CONTENT_TYPES
            .iter()
            .find(|(media_type, _)| *media_type == essence)
            .map(|(_, file_type)| *file_type)
    }

    /// Looks up the extension of a path or URL path.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let last = path.rsplit('/').next().unwrap_or(path);
        let (_, extension) = last.rsplit_once('.')?;
        let extension = extension.to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(known, _)| *known == extension)
            .map(|(_, file_type)| *file_type)
    }

    /// Preferred media type, used as `Content-Type` label on local files.
    #[must_use]
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Turtle => "text/turtle",
            Self::NTriples => "application/n-triples",
            Self::TriG => "application/trig",
            Self::TriX => "application/trix",
            Self::NQuads => "application/n-quads",
            Self::JsonLd => "application/ld+json",
            Self::HexTuples => "application/hex+x-ndjson",
            Self::RdfXml => "application/rdf+xml",
            Self::RdfHtml => "text/html",
            Self::Xml => "application/xml",
            Self::Text => "text/plain",
        }
    }

    /// File extension used when storing raw bytes of this type.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Turtle => "ttl",
            Self::NTriples => "nt",
            Self::TriG => "trig",
            Self::TriX => "trix",
            Self::NQuads => "nq",
            Self::JsonLd => "jsonld",
            Self::HexTuples => "hext",
            Self::RdfXml => "rdf",
            Self::RdfHtml => "html",
            Self::Xml => "xml",
            Self::Text => "txt",
        }
    }

    /// The parser format for serializations `oxrdfio` reads directly.
    #[must_use]
    pub fn rdf_format(self) -> Option<RdfFormat> {
        match self {
            Self::Turtle => Some(RdfFormat::Turtle),
            Self::NTriples => Some(RdfFormat::NTriples),
            Self::TriG => Some(RdfFormat::TriG),
            Self::NQuads => Some(RdfFormat::NQuads),
            Self::RdfXml => Some(RdfFormat::RdfXml),
            Self::JsonLd => Some(RdfFormat::JsonLd {
                profile: JsonLdProfileSet::default(),
            }),
            Self::TriX | Self::HexTuples | Self::RdfHtml | Self::Xml | Self::Text => None,
        }
    }

    /// Whether documents of this type parse into a graph.
    #[must_use]
    pub fn is_rdf(self) -> bool {
        !matches!(self, Self::Xml | Self::Text)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Turtle => "Turtle",
            Self::NTriples => "N-Triples",
            Self::TriG => "TriG",
            Self::TriX => "TriX",
            Self::NQuads => "N-Quads",
            Self::JsonLd => "JSON-LD",
            Self::HexTuples => "HexTuples",
            Self::RdfXml => "RDF/XML",
            Self::RdfHtml => "RDF in HTML",
            Self::Xml => "XML",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_ignores_parameters_and_case() {
        assert_eq!(
            FileType::from_content_type("Text/Turtle; charset=UTF-8"),
            Some(FileType::Turtle)
        );
        assert_eq!(
            FileType::from_content_type("application/ld+json;profile=\"x\""),
            Some(FileType::JsonLd)
        );
        assert_eq!(FileType::from_content_type("image/png"), None);
    }

    #[test]
    fn test_extension_lookup() {
        assert_eq!(FileType::from_path("feeds/page-1.TTL"), Some(FileType::Turtle));
        assert_eq!(FileType::from_path("/data/letters.xml"), Some(FileType::Xml));
        assert_eq!(FileType::from_path("https://example.org/a.b/feed"), None);
        assert_eq!(FileType::from_path("README"), None);
    }

    #[test]
    fn test_media_type_roundtrips_through_table() {
        for file_type in [
            FileType::Turtle,
            FileType::NTriples,
            FileType::TriX,
            FileType::JsonLd,
            FileType::RdfHtml,
            FileType::Xml,
            FileType::Text,
        ] {
            assert_eq!(FileType::from_content_type(file_type.media_type()), Some(file_type));
        }
    }

    #[test]
    fn test_rdf_format_only_for_direct_serializations() {
        assert!(FileType::Turtle.rdf_format().is_some());
        assert!(FileType::TriX.rdf_format().is_none());
        assert!(FileType::TriX.is_rdf());
        assert!(!FileType::Xml.is_rdf());
    }
}
