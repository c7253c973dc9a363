//! Turning fetched text into a queryable document.

use std::sync::LazyLock;

use oxrdf::{BlankNode, Literal, NamedNode, NamedOrBlankNode, Term, Triple};
use oxrdfio::RdfParser;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::FetchError;
use super::file_type::FileType;
use super::resource::Document;
use crate::model::namespaces::{RDF, SCHEMA, TRIX};
use crate::query::path::XML_NAMESPACE;
use crate::query::{RdfGraph, XmlTree};

/// First JSON-LD script block of an HTML page.
#[allow(clippy::expect_used)]
static JSON_LD_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("JSON-LD script regex is valid") // Static pattern, safe to panic
});

/// Remote `@context` values that are replaced by an inline vocabulary.
const SCHEMA_CONTEXTS: [&str; 4] = [
    "http://schema.org",
    "http://schema.org/",
    "https://schema.org",
    "https://schema.org/",
];

/// Returns the content of the first `<script type="application/ld+json">`.
#[must_use]
pub fn extract_embedded_json_ld(html: &str) -> Option<String> {
    JSON_LD_SCRIPT
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|block| block.as_str().trim().to_string())
        .filter(|block| !block.is_empty())
}

/// Parses `text` according to `file_type`.
///
/// Returns the effective file type, which differs from the input when an
/// XML document turns out to be RDF/XML, and the parsed document (none
/// for plain text).
///
/// # Errors
///
/// Returns [`FetchError::Parse`] when the text does not parse as the format.
pub fn parse_document(
    location: &str,
    file_type: FileType,
    text: &str,
) -> Result<(FileType, Option<Document>), FetchError> {
    match file_type {
        FileType::Text => Ok((file_type, None)),
        FileType::RdfHtml => {
            let block = extract_embedded_json_ld(text).ok_or_else(|| {
                FetchError::parse(location, file_type.to_string(), "no embedded JSON-LD block")
            })?;
            parse_document(location, FileType::JsonLd, &block)
        }
        FileType::JsonLd => {
            let repaired = repair_json_ld(text);
            let graph = parse_rdf(location, file_type, &repaired)?;
            Ok((file_type, Some(Document::Graph(graph))))
        }
        FileType::HexTuples => {
            let graph = parse_hex_tuples(location, text)?;
            Ok((file_type, Some(Document::Graph(graph))))
        }
        FileType::TriX => {
            let tree = XmlTree::parse(text)
                .map_err(|e| FetchError::parse(location, file_type.to_string(), e))?;
            let graph = trix_to_graph(location, &tree)?;
            Ok((file_type, Some(Document::Graph(graph))))
        }
        FileType::Xml => parse_xml(location, text),
        FileType::Turtle
        | FileType::NTriples
        | FileType::TriG
        | FileType::NQuads
        | FileType::RdfXml => {
            let graph = parse_rdf(location, file_type, text)?;
            Ok((file_type, Some(Document::Graph(graph))))
        }
    }
}

/// Generic XML: RDF/XML when it declares the RDF namespace and parses as
/// such, an element tree otherwise.
fn parse_xml(location: &str, text: &str) -> Result<(FileType, Option<Document>), FetchError> {
    if text.contains(RDF) {
        match parse_rdf(location, FileType::RdfXml, text) {
            Ok(graph) if !graph.is_empty() => {
                debug!(location, "XML document parsed as RDF/XML");
                return Ok((FileType::RdfXml, Some(Document::Graph(graph))));
            }
            Ok(_) => {}
            Err(error) => debug!(location, %error, "XML document is not RDF/XML"),
        }
    }
    let tree = XmlTree::parse(text)
        .map_err(|e| FetchError::parse(location, FileType::Xml.to_string(), e))?;
    Ok((FileType::Xml, Some(Document::Xml(tree))))
}

fn parse_rdf(location: &str, file_type: FileType, text: &str) -> Result<RdfGraph, FetchError> {
    let unsupported =
        || FetchError::parse(location, file_type.to_string(), "not an RDF serialization");
    let mut parser = file_type
        .rdf_format()
        .map(RdfParser::from_format)
        .ok_or_else(unsupported)?;
    if let Some(base) = base_iri(location) {
        parser = match parser.with_base_iri(base) {
            Ok(with_base) => with_base,
            Err(error) => {
                debug!(location, %error, "ignoring unusable base IRI");
                file_type
                    .rdf_format()
                    .map(RdfParser::from_format)
                    .ok_or_else(unsupported)?
            }
        };
    }

    let mut graph = RdfGraph::new();
    for quad in parser.for_reader(text.as_bytes()) {
        let quad = quad.map_err(|e| FetchError::parse(location, file_type.to_string(), e))?;
        graph.insert(&Triple::new(quad.subject, quad.predicate, quad.object));
    }
    Ok(graph)
}

/// Base IRI for resolving relative references: the URL itself, or the
/// `file:` URL of a local path.
fn base_iri(location: &str) -> Option<String> {
    if let Ok(url) = url::Url::parse(location) {
        if matches!(url.scheme(), "http" | "https" | "file") {
            return Some(url.into());
        }
    }
    let absolute = std::path::absolute(location).ok()?;
    url::Url::from_file_path(absolute).ok().map(Into::into)
}

/// Rewrites a bare schema.org `@context` into an inline vocabulary so the
/// document parses without fetching the remote context.
fn repair_json_ld(text: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<Value>(text) else {
        return text.to_string();
    };
    let mut repaired = false;
    match &mut value {
        Value::Array(items) => {
            for item in items {
                repaired |= repair_context(item);
            }
        }
        item => repaired = repair_context(item),
    }
    if !repaired {
        return text.to_string();
    }
    debug!("replaced remote schema.org context with inline vocabulary");
    serde_json::to_string(&value).unwrap_or_else(|_| text.to_string())
}

fn repair_context(item: &mut Value) -> bool {
    let Some(context) = item.as_object_mut().and_then(|o| o.get_mut("@context")) else {
        return false;
    };
    let inline = || serde_json::json!({ "@vocab": SCHEMA });
    match context {
        Value::String(iri) if SCHEMA_CONTEXTS.contains(&iri.as_str()) => {
            *context = inline();
            true
        }
        Value::Array(entries) => {
            let mut changed = false;
            for entry in entries {
                if entry.as_str().is_some_and(|iri| SCHEMA_CONTEXTS.contains(&iri)) {
                    *entry = inline();
                    changed = true;
                }
            }
            changed
        }
        _ => false,
    }
}

/// HexTuples: one JSON array per line,
/// `[subject, predicate, value, datatype, language, graph]`.
fn parse_hex_tuples(location: &str, text: &str) -> Result<RdfGraph, FetchError> {
    let format = FileType::HexTuples.to_string();
    let mut graph = RdfGraph::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<String> = serde_json::from_str(line)
            .map_err(|e| FetchError::parse(location, &format, format!("line {}: {e}", number + 1)))?;
        let [subject, predicate, value, datatype, language, ..] = fields.as_slice() else {
            return Err(FetchError::parse(
                location,
                &format,
                format!("line {}: expected six fields", number + 1),
            ));
        };
        let bad = |what: &str| {
            FetchError::parse(location, &format, format!("line {}: invalid {what}", number + 1))
        };

        let subject: NamedOrBlankNode = match subject.strip_prefix("_:") {
            Some(id) => BlankNode::new(id).map_err(|_| bad("subject"))?.into(),
            None => NamedNode::new(subject).map_err(|_| bad("subject"))?.into(),
        };
        let predicate = NamedNode::new(predicate).map_err(|_| bad("predicate"))?;
        let object: Term = match datatype.as_str() {
            "globalId" => NamedNode::new(value).map_err(|_| bad("object"))?.into(),
            "localId" => BlankNode::new(value.trim_start_matches("_:"))
                .map_err(|_| bad("object"))?
                .into(),
            _ if !language.is_empty() => Literal::new_language_tagged_literal(value, language)
                .map_err(|_| bad("language tag"))?
                .into(),
            "" => Literal::new_simple_literal(value).into(),
            datatype => Literal::new_typed_literal(
                value,
                NamedNode::new(datatype).map_err(|_| bad("datatype"))?,
            )
            .into(),
        };
        graph.insert(&Triple::new(subject, predicate, object));
    }
    Ok(graph)
}

/// TriX: `<TriX><graph><triple>` with three term children each.
fn trix_to_graph(location: &str, tree: &XmlTree) -> Result<RdfGraph, FetchError> {
    let format = FileType::TriX.to_string();
    let mut graph = RdfGraph::new();
    let mut pending = vec![tree.root()];
    while let Some(id) = pending.pop() {
        let Some(element) = tree.element(id) else {
            continue;
        };
        if element.namespace() != Some(TRIX) {
            warn!(location, element = element.local_name(), "skipping non-TriX element");
            continue;
        }
        if element.local_name() != "triple" {
            let children: Vec<_> = element.children().collect();
            pending.extend(children.into_iter().rev());
            continue;
        }

        let terms: Vec<_> = element.children().collect();
        let [s, p, o] = terms.as_slice() else {
            return Err(FetchError::parse(location, &format, "triple without three terms"));
        };
        let term = |id| trix_term(tree, id).ok_or_else(|| FetchError::parse(location, &format, "invalid term"));
        let subject = match term(*s)? {
            Term::NamedNode(node) => NamedOrBlankNode::from(node),
            Term::BlankNode(node) => NamedOrBlankNode::from(node),
            _ => return Err(FetchError::parse(location, &format, "literal subject")),
        };
        let Term::NamedNode(predicate) = term(*p)? else {
            return Err(FetchError::parse(location, &format, "predicate is not a URI"));
        };
        graph.insert(&Triple::new(subject, predicate, term(*o)?));
    }
    Ok(graph)
}

fn trix_term(tree: &XmlTree, id: usize) -> Option<Term> {
    let element = tree.element(id)?;
    let text = tree.own_text(id);
    match element.local_name() {
        "uri" => NamedNode::new(text).ok().map(Term::from),
        "id" => BlankNode::new(text).ok().map(Term::from),
        "plainLiteral" => match element.attribute(Some(XML_NAMESPACE), "lang") {
            Some(lang) => Literal::new_language_tagged_literal(text, lang).ok().map(Term::from),
            None => Some(Literal::new_simple_literal(text).into()),
        },
        "typedLiteral" => {
            let datatype = NamedNode::new(element.attribute(None, "datatype")?).ok()?;
            Some(Literal::new_typed_literal(text, datatype).into())
        }
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use oxrdf::NamedNodeRef;

    use super::*;

    const NAME: NamedNodeRef<'static> = NamedNodeRef::new_unchecked("http://schema.org/name");

    fn graph(result: Result<(FileType, Option<Document>), FetchError>) -> RdfGraph {
        match result.unwrap() {
            (_, Some(Document::Graph(graph))) => graph,
            other => panic!("expected graph, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_turtle_resolves_relative_iris() {
        let text = "@prefix schema: <http://schema.org/> .\n<e/1> schema:name \"One\" .\n";
        let graph = graph(parse_document("https://example.org/feed/", FileType::Turtle, text));
        let subject = NamedNode::new("https://example.org/feed/e/1").unwrap();
        assert!(graph.first_object(&subject, NAME).is_some());
    }

    #[test]
    fn test_parse_quads_fold_into_one_graph() {
        let text = "<http://a.org/s> <http://schema.org/name> \"x\" <http://a.org/g1> .\n\
                    <http://a.org/s> <http://schema.org/name> \"y\" <http://a.org/g2> .\n";
        let graph = graph(parse_document("https://a.org/q.nq", FileType::NQuads, text));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_parse_invalid_turtle_fails() {
        let result = parse_document("https://a.org/f.ttl", FileType::Turtle, "<a> <b> .");
        assert!(matches!(result, Err(FetchError::Parse { .. })));
    }

    #[test]
    fn test_json_ld_schema_context_repaired() {
        let text = r#"{"@context": "https://schema.org", "@id": "https://a.org/e/1", "name": "Eins"}"#;
        let graph = graph(parse_document("https://a.org/e/1", FileType::JsonLd, text));
        let subject = NamedNode::new("https://a.org/e/1").unwrap();
        assert!(graph.first_object(&subject, NAME).is_some());
    }

    #[test]
    fn test_embedded_json_ld_extraction() {
        let html = r#"<html><head>
            <script type="text/javascript">var x = 1;</script>
            <script type="application/ld+json">
              {"@context": {"@vocab": "http://schema.org/"}, "@id": "https://a.org/p", "name": "Page"}
            </script></head></html>"#;
        let block = extract_embedded_json_ld(html).unwrap();
        assert!(block.starts_with('{'));
        let (file_type, _) = parse_document("https://a.org/p", FileType::RdfHtml, html).unwrap();
        assert_eq!(file_type, FileType::JsonLd);
        assert!(extract_embedded_json_ld("<html></html>").is_none());
    }

    #[test]
    fn test_hex_tuples() {
        let text = concat!(
            r#"["https://a.org/s", "http://schema.org/name", "Eins", "", "de", ""]"#,
            "\n",
            r#"["https://a.org/s", "http://schema.org/about", "https://a.org/t", "globalId", "", ""]"#,
            "\n",
            r#"["_:b1", "http://schema.org/position", "1", "http://www.w3.org/2001/XMLSchema#integer", "", ""]"#,
        );
        let graph = graph(parse_document("local.hext", FileType::HexTuples, text));
        assert_eq!(graph.len(), 3);
        assert!(parse_document("x.hext", FileType::HexTuples, "[\"a\"]").is_err());
    }

    #[test]
    fn test_trix() {
        let text = r#"<TriX xmlns="http://www.w3.org/2004/03/trix/trix-1/">
          <graph>
            <triple>
              <uri>https://a.org/s</uri>
              <uri>http://schema.org/name</uri>
              <plainLiteral xml:lang="de">Eins</plainLiteral>
            </triple>
          </graph>
        </TriX>"#;
        let graph = graph(parse_document("x.trix", FileType::TriX, text));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_plain_xml_stays_tree() {
        let (file_type, document) =
            parse_document("x.xml", FileType::Xml, "<root><a>1</a></root>").unwrap();
        assert_eq!(file_type, FileType::Xml);
        assert!(matches!(document, Some(Document::Xml(_))));
    }

    #[test]
    fn test_xml_with_rdf_namespace_becomes_graph() {
        let text = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
                              xmlns:schema="http://schema.org/">
            <rdf:Description rdf:about="https://a.org/s"><schema:name>Eins</schema:name></rdf:Description>
          </rdf:RDF>"#;
        let (file_type, document) = parse_document("https://a.org/x.xml", FileType::Xml, text).unwrap();
        assert_eq!(file_type, FileType::RdfXml);
        assert!(matches!(document, Some(Document::Graph(_))));
    }

    #[test]
    fn test_text_is_not_parsed() {
        let (_, document) = parse_document("x.txt", FileType::Text, "#FORMAT: BEACON").unwrap();
        assert!(document.is_none());
    }
}
