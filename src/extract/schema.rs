//! schema.org `DataFeed` documents.
//!
//! A feed page is a `schema:DataFeed` whose `schema:dataFeedElement` values
//! are either element IRIs or `DataFeedItem`s wrapping one in `schema:item`.
//! Items that are blank nodes are described on the page itself and become
//! inline records. Pages link onwards with `hydra:next`.
//!
//! Both `http://schema.org/` and `https://schema.org/` terms are accepted.

use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{NamedNode, NamedOrBlankNode, Term};
use tracing::{debug, warn};

use super::{Dialect, ExtractionError, FormatExtractor};
use crate::fetch::Resource;
use crate::model::namespaces::{CTO, HYDRA, SCHEMA, SCHEMA_HTTPS};
use crate::model::{
    Canonical, Date, ElementRecord, FeedRecord, Incipit, Label, Uri, UriLabel, UriLabelList,
};
use crate::query::rdf::as_subject;
use crate::query::{RdfGraph, TriplePattern};

/// Extractor for schema.org feeds and elements in any RDF serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaExtractor;

impl FormatExtractor for SchemaExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::Schema
    }

    fn extract_feed(&self, resource: &Resource) -> Result<FeedRecord, ExtractionError> {
        let graph = resource
            .graph()
            .ok_or_else(|| ExtractionError::missing_document(&resource.location, "RDF graph"))?;
        let feed = graph
            .first_subject(rdf::TYPE, schema("DataFeed"))
            .ok_or_else(|| {
                ExtractionError::missing_structure(&resource.location, "no schema:DataFeed resource")
            })?;

        let mut record = FeedRecord {
            feed_uri: node_uri(&feed),
            title: graph.labels(&feed, schema("name")),
            modified: first_date(graph, &feed, schema("dateModified")),
            same_as: graph.uris(&feed, schema("sameAs")).into_iter().collect(),
            publisher: first_entity(graph, &feed, schema("publisher")),
            catalog: first_uri(graph, &feed, schema("includedInDataCatalog")),
            next_page: next_page(graph),
            ..FeedRecord::default()
        };
        if !record.feed_uri.has_content() {
            record.feed_uri = Uri::new(&resource.location);
        }

        for entry in graph.all_objects(&feed, schema("dataFeedElement")) {
            let item = as_subject(&entry)
                .and_then(|node| graph.first_object(&node, schema("item")))
                .unwrap_or(entry);
            match &item {
                Term::NamedNode(node) => {
                    record.elements.push(Uri::new(node.as_str()));
                }
                Term::Literal(literal) => {
                    record.elements.push(Uri::new(literal.value()));
                }
                Term::BlankNode(node) => {
                    let subject = NamedOrBlankNode::from(node.clone());
                    let element = read_element(graph, &subject, &resource.location);
                    if element.uri.has_content() {
                        record.inline_elements.push(element);
                    } else {
                        warn!(location = %resource.location, "skipping inline feed item without URI");
                    }
                }
                #[allow(unreachable_patterns)]
                _ => {}
            }
        }

        debug!(
            location = %resource.location,
            elements = record.elements.len(),
            inline = record.inline_elements.len(),
            has_next = record.next_page.has_content(),
            "read schema.org feed"
        );
        Ok(record)
    }

    fn extract_element(&self, resource: &Resource) -> Result<ElementRecord, ExtractionError> {
        let graph = resource
            .graph()
            .ok_or_else(|| ExtractionError::missing_document(&resource.location, "RDF graph"))?;
        let subject = main_subject(graph, &resource.location).ok_or_else(|| {
            ExtractionError::missing_structure(&resource.location, "no described resource")
        })?;

        let mut element = read_element(graph, &subject, &resource.location);
        if !element.uri.has_content() {
            element.uri = Uri::new(&resource.location);
        }
        Ok(element)
    }
}

// ==================== Vocabulary ====================

/// The term in both schema.org namespaces.
fn schema(local: &str) -> Vec<NamedNode> {
    vec![
        NamedNode::new_unchecked(format!("{SCHEMA}{local}")),
        NamedNode::new_unchecked(format!("{SCHEMA_HTTPS}{local}")),
    ]
}

fn schema_any(locals: &[&str]) -> Vec<NamedNode> {
    locals.iter().flat_map(|local| schema(local)).collect()
}

fn cto(local: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("{CTO}{local}"))
}

fn hydra(local: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("{HYDRA}{local}"))
}

fn label_predicates() -> Vec<NamedNode> {
    let mut predicates = schema("name");
    predicates.push(rdfs::LABEL.into_owned());
    predicates
}

// ==================== Readers ====================

/// The resource an element document describes.
///
/// Prefer the fetched location itself; otherwise the first typed resource
/// nothing else points at; otherwise any root subject.
fn main_subject(graph: &RdfGraph, location: &str) -> Option<NamedOrBlankNode> {
    let by_location = [NamedNode::new(location).ok(), Uri::new(location).named_node()];
    for node in by_location.into_iter().flatten() {
        if graph.count_triples(&TriplePattern::any().subject(&node)) > 0 {
            return Some(node.into());
        }
    }

    let is_root =
        |subject: &NamedOrBlankNode| graph.count_triples(&TriplePattern::any().object(subject)) == 0;
    graph
        .iter()
        .filter(|triple| triple.predicate == rdf::TYPE)
        .map(|triple| triple.subject.into_owned())
        .find(|subject| is_root(subject))
        .or_else(|| {
            graph
                .iter()
                .map(|triple| triple.subject.into_owned())
                .find(|subject| is_root(subject))
        })
}

fn read_element(graph: &RdfGraph, subject: &NamedOrBlankNode, location: &str) -> ElementRecord {
    let uri = match subject {
        NamedOrBlankNode::NamedNode(node) => Uri::new(node.as_str()),
        _ => first_uri(graph, subject, schema("url")),
    };

    let mut type_predicates = vec![rdf::TYPE.into_owned()];
    type_predicates.extend(schema("additionalType"));

    let mut element = ElementRecord::new(uri);
    element.source = location.to_string();
    element.element_type = first_entity(graph, subject, type_predicates);
    element.names = graph.labels(subject, schema_any(&["name", "alternateName", "headline"]));
    element.descriptions = graph.labels(subject, schema_any(&["description", "abstract"]));
    element.dates = graph
        .labels(
            subject,
            schema_any(&["dateCreated", "datePublished", "temporalCoverage", "temporal"]),
        )
        .iter()
        .filter_map(Label::text)
        .map(Date::parse)
        .collect();
    element.same_as = graph.uris(subject, schema("sameAs")).into_iter().collect();
    element.creators = entities(graph, subject, schema_any(&["creator", "author", "composer"]));
    element.persons = entities(graph, subject, schema_any(&["contributor", "mentions", "character"]));
    element.subjects = entities(graph, subject, schema_any(&["about", "keywords", "genre"]));
    element.locations = entities(
        graph,
        subject,
        schema_any(&["contentLocation", "locationCreated", "spatialCoverage", "spatial"]),
    );
    element.incipits = incipits(graph, subject);
    element.publisher = first_entity(graph, subject, schema("publisher"));
    element.catalog = first_uri(graph, subject, schema("includedInDataCatalog"));
    element
}

fn node_uri(node: &NamedOrBlankNode) -> Uri {
    match node {
        NamedOrBlankNode::NamedNode(named) => Uri::new(named.as_str()),
        _ => Uri::empty(),
    }
}

fn first_uri(graph: &RdfGraph, subject: &NamedOrBlankNode, predicates: Vec<NamedNode>) -> Uri {
    graph
        .uris(subject, predicates)
        .into_iter()
        .next()
        .unwrap_or_default()
}

fn first_date(graph: &RdfGraph, subject: &NamedOrBlankNode, predicates: Vec<NamedNode>) -> Date {
    graph
        .labels(subject, predicates)
        .first()
        .and_then(Label::text)
        .map_or_else(Date::default, Date::parse)
}

fn first_entity(graph: &RdfGraph, subject: &NamedOrBlankNode, predicates: Vec<NamedNode>) -> UriLabel {
    graph
        .first_object(subject, predicates)
        .map(|node| graph.uri_and_label(&node, label_predicates()))
        .unwrap_or_default()
}

fn entities(graph: &RdfGraph, subject: &NamedOrBlankNode, predicates: Vec<NamedNode>) -> UriLabelList {
    graph
        .all_objects(subject, predicates)
        .iter()
        .map(|node| graph.uri_and_label(node, label_predicates()))
        .collect()
}

fn incipits(graph: &RdfGraph, subject: &NamedOrBlankNode) -> Vec<Incipit> {
    let mut found: Vec<Incipit> = Vec::new();
    for node in graph.all_objects(subject, cto("incipit")) {
        let Some(incipit) = as_subject(&node) else {
            continue;
        };
        let text = |local: &str| {
            graph
                .labels(&incipit, cto(local))
                .first()
                .and_then(Label::text)
                .unwrap_or_default()
                .to_string()
        };
        let value = Incipit::new(
            node_uri(&incipit),
            &text("clef"),
            &text("keySignature"),
            &text("timeSignature"),
            &text("pattern"),
        );
        if value.has_content() && !found.contains(&value) {
            found.push(value);
        }
    }
    found
}

/// Target of the first `hydra:next` (or legacy `hydra:nextPage`) link.
fn next_page(graph: &RdfGraph) -> Uri {
    graph
        .first_triple(&TriplePattern::any().predicate(vec![hydra("next"), hydra("nextPage")]))
        .map_or_else(Uri::empty, |triple| match triple.object {
            Term::NamedNode(node) => Uri::new(node.as_str()),
            Term::Literal(literal) => Uri::new(literal.value()),
            _ => Uri::empty(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fetch::FileType;

    const FEED: &str = r#"
@prefix schema: <http://schema.org/> .
@prefix hydra: <http://www.w3.org/ns/hydra/core#> .

<https://example.org/feed> a schema:DataFeed ;
    schema:name "Example feed"@en ;
    schema:dateModified "2024-02-01T10:00:00Z" ;
    schema:publisher <https://ror.org/012345678> ;
    schema:includedInDataCatalog <https://example.org/catalog> ;
    schema:dataFeedElement
        [ a schema:DataFeedItem ; schema:item <https://example.org/item/1> ] ,
        <https://example.org/item/2> ,
        [ a schema:DataFeedItem ;
          schema:item [ a schema:CreativeWork ;
                        schema:url <https://example.org/item/3> ;
                        schema:name "Inline work" ] ] .

<https://ror.org/012345678> schema:name "Example Archive" .

<https://example.org/feed?page=1> hydra:next <https://example.org/feed?page=2> .
"#;

    const ELEMENT: &str = r#"
@prefix schema: <https://schema.org/> .
@prefix cto: <https://nfdi4culture.de/ontology#> .

<https://example.org/item/1> a schema:MusicComposition ;
    schema:name "Sonate"@de , "Sonata"@en ;
    schema:description "For piano" ;
    schema:dateCreated "1799" ;
    schema:sameAs <http://www.wikidata.org/wiki/Q1> ;
    schema:composer <https://d-nb.info/gnd/118508288> ;
    schema:about [ schema:name "Piano music" ] ;
    schema:contentLocation <http://geonames.org/2950159/> ;
    cto:incipit [ cto:clef "G-2" ; cto:keySignature "bB" ;
                  cto:timeSignature "3/4" ; cto:pattern "4C8DE" ] .

<https://d-nb.info/gnd/118508288> schema:name "Beethoven, Ludwig van" .
"#;

    fn turtle(location: &str, text: &str) -> Resource {
        let resource = Resource::from_text(location, FileType::Turtle, text);
        assert!(resource.success, "{}", resource.failure_reason());
        resource
    }

    // ==================== Feed Tests ====================

    #[test]
    fn test_feed_fields() {
        let feed = SchemaExtractor
            .extract_feed(&turtle("https://example.org/feed?page=1", FEED))
            .unwrap();
        assert_eq!(feed.feed_uri.as_str(), Some("https://example.org/feed"));
        assert_eq!(feed.title.first().unwrap().language(), Some("en"));
        assert!(matches!(feed.modified, Date::Instant(_)));
        assert_eq!(feed.publisher.uri.as_str(), Some("https://ror.org/012345678"));
        assert_eq!(feed.publisher.to_text(), "Example Archive");
        assert_eq!(feed.catalog.as_str(), Some("https://example.org/catalog"));
    }

    #[test]
    fn test_feed_elements_and_inline_items() {
        let feed = SchemaExtractor
            .extract_feed(&turtle("https://example.org/feed?page=1", FEED))
            .unwrap();
        assert_eq!(feed.elements.len(), 2);
        assert!(feed.elements.contains(&Uri::new("https://example.org/item/1")));
        assert!(feed.elements.contains(&Uri::new("https://example.org/item/2")));

        assert_eq!(feed.inline_elements.len(), 1);
        let inline = &feed.inline_elements[0];
        assert_eq!(inline.uri.as_str(), Some("https://example.org/item/3"));
        assert_eq!(inline.names.first().unwrap().text(), Some("Inline work"));
        assert_eq!(feed.element_count(), 3);
    }

    #[test]
    fn test_feed_next_page() {
        let feed = SchemaExtractor
            .extract_feed(&turtle("https://example.org/feed?page=1", FEED))
            .unwrap();
        assert_eq!(feed.next_page.as_str(), Some("https://example.org/feed?page=2"));
    }

    #[test]
    fn test_feed_without_data_feed_fails() {
        let result = SchemaExtractor.extract_feed(&turtle("https://example.org/x", ELEMENT));
        assert!(matches!(result, Err(ExtractionError::MissingStructure { .. })));
    }

    #[test]
    fn test_feed_requires_graph() {
        let resource = Resource::from_text("feed.txt", FileType::Text, "hello");
        let result = SchemaExtractor.extract_feed(&resource);
        assert!(matches!(result, Err(ExtractionError::MissingDocument { .. })));
    }

    // ==================== Element Tests ====================

    #[test]
    fn test_element_fields() {
        let element = SchemaExtractor
            .extract_element(&turtle("https://example.org/item/1", ELEMENT))
            .unwrap();
        assert_eq!(element.uri.as_str(), Some("https://example.org/item/1"));
        assert_eq!(element.source, "https://example.org/item/1");
        // schema.org is a known namespace, so the https term is normalized
        assert_eq!(
            element.element_type.uri.as_str(),
            Some("http://schema.org/MusicComposition")
        );
        assert_eq!(element.names.len(), 2);
        assert_eq!(element.descriptions.first().unwrap().text(), Some("For piano"));
        assert!(matches!(element.dates.first(), Some(Date::Range { .. })));
        assert!(
            element
                .same_as
                .contains(&Uri::new("http://www.wikidata.org/entity/Q1"))
        );
    }

    #[test]
    fn test_element_entities() {
        let element = SchemaExtractor
            .extract_element(&turtle("https://example.org/item/1", ELEMENT))
            .unwrap();

        let creator = element.creators.iter().next().unwrap();
        assert_eq!(creator.uri.as_str(), Some("https://d-nb.info/gnd/118508288"));
        assert_eq!(creator.to_text(), "Beethoven, Ludwig van");

        let subject = element.subjects.iter().next().unwrap();
        assert!(!subject.uri.has_content());
        assert_eq!(subject.to_text(), "Piano music");

        let location = element.locations.iter().next().unwrap();
        assert_eq!(location.uri.as_str(), Some("https://sws.geonames.org/2950159"));
    }

    #[test]
    fn test_element_incipit() {
        let element = SchemaExtractor
            .extract_element(&turtle("https://example.org/item/1", ELEMENT))
            .unwrap();
        assert_eq!(element.incipits.len(), 1);
        let incipit = &element.incipits[0];
        assert_eq!(incipit.clef.text(), Some("G-2"));
        assert_eq!(incipit.pattern.text(), Some("4C8DE"));
    }

    #[test]
    fn test_element_found_without_matching_location() {
        let element = SchemaExtractor
            .extract_element(&turtle("https://mirror.example.net/copy", ELEMENT))
            .unwrap();
        assert_eq!(element.uri.as_str(), Some("https://example.org/item/1"));
    }

    #[test]
    fn test_element_empty_graph_fails() {
        let result = SchemaExtractor.extract_element(&turtle("https://example.org/empty", ""));
        assert!(matches!(result, Err(ExtractionError::MissingStructure { .. })));
    }
}
