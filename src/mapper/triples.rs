//! schema.org projection of the canonical record.

use oxrdf::vocab::rdf;
use oxrdf::NamedNode;

use super::graph::{TripleSink, serialize_triples, term};
use super::{MapperOptions, MappingError, OutputMapper, OutputTarget};
use crate::model::namespaces::SCHEMA;
use crate::model::{ElementRecord, UriLabel, UriLabelList};

#[derive(Debug, Clone, Copy, Default)]
pub struct TriplesMapper;

impl OutputMapper for TriplesMapper {
    fn target(&self) -> OutputTarget {
        OutputTarget::Triples
    }

    fn extension(&self, options: &MapperOptions) -> &'static str {
        options.graph_format.extension()
    }

    fn generate(
        &self,
        record: &ElementRecord,
        options: &MapperOptions,
    ) -> Result<Vec<u8>, MappingError> {
        let subject = record
            .uri
            .named_node()
            .ok_or_else(|| MappingError::missing_uri(OutputTarget::Triples, &record.source))?;

        let mut sink = TripleSink::default();
        let schema = |local: &str| term(SCHEMA, local);

        sink.add(&subject, &rdf::TYPE.into_owned(), schema("CreativeWork"));
        match record.element_type.uri.named_node() {
            Some(element_type) => {
                sink.add(&subject, &rdf::TYPE.into_owned(), element_type.clone());
                describe(&mut sink, &element_type, &record.element_type);
            }
            None => sink.add_value(&subject, &schema("additionalType"), &record.element_type.labels),
        }

        sink.add_value(&subject, &schema("name"), &record.names);
        sink.add_value(&subject, &schema("description"), &record.descriptions);
        sink.add_value(&subject, &schema("dateCreated"), &record.dates);
        sink.add_value(&subject, &schema("sameAs"), &record.same_as);
        sink.add_value(&subject, &schema("isPartOf"), &record.feed);
        sink.add_value(&subject, &schema("includedInDataCatalog"), &record.catalog);

        let relations: [(&str, &UriLabelList); 4] = [
            ("creator", &record.creators),
            ("contributor", &record.persons),
            ("about", &record.subjects),
            ("contentLocation", &record.locations),
        ];
        for (local, entities) in relations {
            let predicate = schema(local);
            for entity in entities {
                sink.add_value(&subject, &predicate, entity);
                if let Some(node) = entity.uri.named_node() {
                    describe(&mut sink, &node, entity);
                }
            }
        }

        sink.add_value(&subject, &schema("publisher"), &record.publisher);
        if let Some(node) = record.publisher.uri.named_node() {
            describe(&mut sink, &node, &record.publisher);
        }

        serialize_triples(OutputTarget::Triples, &sink.into_triples(), options.graph_format)
    }
}

/// Names an identified entity with its labels.
fn describe(sink: &mut TripleSink, node: &NamedNode, entity: &UriLabel) {
    let name = term(SCHEMA, "name");
    for label in &entity.labels {
        sink.add_literal(node, &name, label.literal());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mapper::GraphFormat;
    use crate::model::{Date, Label, LabelList, Uri};

    fn ntriples(record: &ElementRecord) -> String {
        let options = MapperOptions {
            graph_format: GraphFormat::NTriples,
            ..MapperOptions::default()
        };
        String::from_utf8(TriplesMapper.generate(record, &options).unwrap()).unwrap()
    }

    #[test]
    fn test_basic_projection() {
        let mut record = ElementRecord::new(Uri::new("https://example.org/work/1"));
        record.names.push(Label::with_language("Sinfonie", Some("de")));
        record.dates.push(Date::parse("1808-12-22"));
        record.feed = Uri::new("https://example.org/feed");

        let text = ntriples(&record);
        assert!(text.contains(
            "<https://example.org/work/1> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/CreativeWork> ."
        ));
        assert!(text.contains("<http://schema.org/name> \"Sinfonie\"@de ."));
        assert!(text.contains(
            "<http://schema.org/dateCreated> \"1808-12-22\"^^<http://www.w3.org/2001/XMLSchema#date> ."
        ));
        assert!(text.contains("<http://schema.org/isPartOf> <https://example.org/feed> ."));
    }

    #[test]
    fn test_entities_with_and_without_uri() {
        let mut record = ElementRecord::new(Uri::new("https://example.org/work/1"));
        record.creators.push(UriLabel::new(
            Uri::new("https://d-nb.info/gnd/118508288"),
            LabelList::from_iter([Label::new("Beethoven, Ludwig van")]),
        ));
        record.subjects.push(UriLabel::from_label(Label::new("Symphonies")));

        let text = ntriples(&record);
        assert!(text.contains(
            "<https://example.org/work/1> <http://schema.org/creator> <https://d-nb.info/gnd/118508288> ."
        ));
        assert!(text.contains(
            "<https://d-nb.info/gnd/118508288> <http://schema.org/name> \"Beethoven, Ludwig van\" ."
        ));
        assert!(text.contains("<http://schema.org/about> \"Symphonies\" ."));
    }

    #[test]
    fn test_type_label_without_uri_becomes_additional_type() {
        let mut record = ElementRecord::new(Uri::new("https://example.org/work/1"));
        record.element_type = UriLabel::from_label(Label::new("Score"));
        let text = ntriples(&record);
        assert!(text.contains("<http://schema.org/additionalType> \"Score\" ."));
    }

    #[test]
    fn test_missing_uri_is_an_error() {
        assert!(matches!(
            TriplesMapper.generate(&ElementRecord::default(), &MapperOptions::default()),
            Err(MappingError::MissingUri { .. })
        ));
    }
}
