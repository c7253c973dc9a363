//! Graph serialization shared by the triple-producing mappers and the
//! compile step.

use std::fmt;
use std::str::FromStr;

use oxrdf::{IriParseError, Literal, NamedNode, Term, Triple};
use oxrdfio::{JsonLdProfileSet, RdfFormat, RdfSerializer};
use serde::{Deserialize, Serialize};

use super::{MappingError, OutputTarget};
use crate::fetch::FileType;
use crate::model::Canonical;
use crate::model::namespaces::OUTPUT_PREFIXES;

/// Serialization used for graph outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphFormat {
    #[default]
    Turtle,
    NTriples,
    RdfXml,
    JsonLd,
}

impl GraphFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Turtle => "ttl",
            Self::NTriples => "nt",
            Self::RdfXml => "rdf",
            Self::JsonLd => "jsonld",
        }
    }

    #[must_use]
    pub fn rdf_format(self) -> RdfFormat {
        match self {
            Self::Turtle => RdfFormat::Turtle,
            Self::NTriples => RdfFormat::NTriples,
            Self::RdfXml => RdfFormat::RdfXml,
            Self::JsonLd => RdfFormat::JsonLd {
                profile: JsonLdProfileSet::default(),
            },
        }
    }

    /// Fetch-side file type, used to parse files of this format back.
    #[must_use]
    pub fn file_type(self) -> FileType {
        match self {
            Self::Turtle => FileType::Turtle,
            Self::NTriples => FileType::NTriples,
            Self::RdfXml => FileType::RdfXml,
            Self::JsonLd => FileType::JsonLd,
        }
    }

    /// A serializer for this format with the output prefixes declared.
    ///
    /// # Errors
    ///
    /// Returns the IRI error if a prefix IRI is rejected.
    pub fn serializer(self) -> Result<RdfSerializer, IriParseError> {
        let mut serializer = RdfSerializer::from_format(self.rdf_format());
        for (prefix, iri) in OUTPUT_PREFIXES {
            serializer = serializer.with_prefix(prefix, iri)?;
        }
        Ok(serializer)
    }
}

impl fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Turtle => "turtle",
            Self::NTriples => "ntriples",
            Self::RdfXml => "rdfxml",
            Self::JsonLd => "jsonld",
        };
        f.write_str(name)
    }
}

impl FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "turtle" | "ttl" => Ok(Self::Turtle),
            "ntriples" | "n-triples" | "nt" => Ok(Self::NTriples),
            "rdfxml" | "rdf/xml" | "rdf-xml" | "xml" | "rdf" => Ok(Self::RdfXml),
            "jsonld" | "json-ld" | "json" => Ok(Self::JsonLd),
            _ => Err(format!("invalid graph format: {s}")),
        }
    }
}

/// Writes `triples` in `format`.
pub(crate) fn serialize_triples(
    target: OutputTarget,
    triples: &[Triple],
    format: GraphFormat,
) -> Result<Vec<u8>, MappingError> {
    let serializer = format
        .serializer()
        .map_err(|e| MappingError::serialize(target, e))?;
    let mut writer = serializer.for_writer(Vec::new());
    for triple in triples {
        writer
            .serialize_triple(triple)
            .map_err(|e| MappingError::serialize(target, e))?;
    }
    writer.finish().map_err(|e| MappingError::serialize(target, e))
}

/// Accumulates triples about records, skipping empty values.
#[derive(Debug, Default)]
pub(crate) struct TripleSink {
    triples: Vec<Triple>,
}

impl TripleSink {
    pub fn add(&mut self, subject: &NamedNode, predicate: &NamedNode, object: impl Into<Term>) {
        let triple = Triple::new(subject.clone(), predicate.clone(), object.into());
        if !self.triples.contains(&triple) {
            self.triples.push(triple);
        }
    }

    /// Adds one triple per term of `value`.
    pub fn add_value(&mut self, subject: &NamedNode, predicate: &NamedNode, value: &impl Canonical) {
        for term in value.to_terms() {
            self.add(subject, predicate, term);
        }
    }

    pub fn add_literal(&mut self, subject: &NamedNode, predicate: &NamedNode, literal: Option<Literal>) {
        if let Some(literal) = literal {
            self.add(subject, predicate, literal);
        }
    }

    pub fn into_triples(self) -> Vec<Triple> {
        self.triples
    }
}

/// A named node in `namespace`. Callers pass vocabulary constants, so the
/// IRI is always valid.
pub(crate) fn term(namespace: &str, local: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("{namespace}{local}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::namespaces::SCHEMA;

    fn sample() -> Vec<Triple> {
        vec![Triple::new(
            term("https://example.org/", "work/1"),
            term(SCHEMA, "name"),
            Literal::new_simple_literal("Work"),
        )]
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("TTL".parse::<GraphFormat>(), Ok(GraphFormat::Turtle));
        assert_eq!("json-ld".parse::<GraphFormat>(), Ok(GraphFormat::JsonLd));
        assert_eq!("rdf/xml".parse::<GraphFormat>(), Ok(GraphFormat::RdfXml));
        assert!("n3".parse::<GraphFormat>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for format in [
            GraphFormat::Turtle,
            GraphFormat::NTriples,
            GraphFormat::RdfXml,
            GraphFormat::JsonLd,
        ] {
            assert_eq!(format.to_string().parse::<GraphFormat>(), Ok(format));
        }
    }

    #[test]
    fn test_turtle_uses_prefixes() {
        let bytes = serialize_triples(OutputTarget::Triples, &sample(), GraphFormat::Turtle).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("@prefix schema:"));
        assert!(text.contains("schema:name"));
    }

    #[test]
    fn test_ntriples_is_one_line_per_triple() {
        let bytes =
            serialize_triples(OutputTarget::Triples, &sample(), GraphFormat::NTriples).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text.trim(),
            "<https://example.org/work/1> <http://schema.org/name> \"Work\" ."
        );
    }

    #[test]
    fn test_sink_drops_duplicates_and_empties() {
        let subject = term("https://example.org/", "work/1");
        let name = term(SCHEMA, "name");
        let mut sink = TripleSink::default();
        sink.add_value(&subject, &name, &crate::model::Label::new("Work"));
        sink.add_value(&subject, &name, &crate::model::Label::new("Work"));
        sink.add_value(&subject, &name, &crate::model::Label::empty());
        assert_eq!(sink.into_triples().len(), 1);
    }
}
