//! NFDI4Culture ontology (CTO) output.
//!
//! Relations to authority records are typed by what the authority is, not
//! by the field it was read from: a GeoNames URI listed as a subject still
//! becomes `cto:relatedLocation`. Without a classifier, or when it has no
//! answer, the source field decides. Incipits get named nodes derived from
//! the element URI so repeated harvests produce identical graphs.

use oxrdf::vocab::{rdf, rdfs};
use oxrdf::NamedNode;

use super::graph::{TripleSink, serialize_triples, term};
use super::{MapperOptions, MappingError, OutputMapper, OutputTarget};
use crate::authority::EntityCategory;
use crate::model::namespaces::{CTO, NFDI, SCHEMA};
use crate::model::{Canonical, ElementRecord, Incipit, Uri, UriLabel, UriLabelList};

#[derive(Debug, Clone, Copy, Default)]
pub struct CtoMapper;

/// The record field an entity came from.
#[derive(Debug, Clone, Copy)]
enum Field {
    Creator,
    Person,
    Subject,
    Location,
}

impl Field {
    fn fallback(self) -> EntityCategory {
        match self {
            Self::Creator | Self::Person => EntityCategory::Person,
            Self::Subject => EntityCategory::SubjectConcept,
            Self::Location => EntityCategory::Location,
        }
    }
}

fn relation(category: EntityCategory) -> &'static str {
    match category {
        EntityCategory::Person => "relatedPerson",
        EntityCategory::Organization => "relatedOrganization",
        EntityCategory::Location => "relatedLocation",
        EntityCategory::Event => "relatedEvent",
        EntityCategory::SubjectConcept => "subjectConcept",
        EntityCategory::ElementType => "elementType",
    }
}

impl OutputMapper for CtoMapper {
    fn target(&self) -> OutputTarget {
        OutputTarget::Cto
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
            .ok_or_else(|| MappingError::missing_uri(OutputTarget::Cto, &record.source))?;
        let rdf_type = rdf::TYPE.into_owned();
        let label = rdfs::LABEL.into_owned();

        let mut sink = TripleSink::default();
        sink.add(&subject, &rdf_type, term(CTO, "Item"));
        sink.add_value(&subject, &label, &record.names);
        sink.add_value(&subject, &term(CTO, "abstract"), &record.descriptions);
        sink.add_value(&subject, &term(CTO, "creationDate"), &record.dates);
        sink.add_value(&subject, &term(SCHEMA, "sameAs"), &record.same_as);
        sink.add_value(&subject, &term(CTO, "elementOf"), &record.feed);
        sink.add_value(&subject, &term(SCHEMA, "includedInDataCatalog"), &record.catalog);
        sink.add_value(&subject, &term(NFDI, "publisher"), &record.publisher);

        if record.element_type.uri.has_content() {
            sink.add_value(&subject, &term(CTO, "elementType"), &record.element_type.uri);
        } else {
            sink.add_value(&subject, &term(CTO, "elementTypeLiteral"), &record.element_type.labels);
        }

        let fields: [(Field, &UriLabelList); 4] = [
            (Field::Creator, &record.creators),
            (Field::Person, &record.persons),
            (Field::Subject, &record.subjects),
            (Field::Location, &record.locations),
        ];
        for (field, entities) in fields {
            for entity in entities {
                add_entity(&mut sink, &subject, field, entity, options);
            }
        }

        for (index, incipit) in record.incipits.iter().enumerate() {
            add_incipit(&mut sink, &subject, index + 1, incipit);
        }

        serialize_triples(OutputTarget::Cto, &sink.into_triples(), options.graph_format)
    }
}

fn add_entity(
    sink: &mut TripleSink,
    subject: &NamedNode,
    field: Field,
    entity: &UriLabel,
    options: &MapperOptions,
) {
    match entity.uri.as_str() {
        Some(uri) => {
            let category = options
                .classifier
                .as_ref()
                .and_then(|classifier| classifier.classify(uri))
                .unwrap_or_else(|| field.fallback());
            sink.add_value(subject, &term(CTO, relation(category)), &entity.uri);
            if let Some(node) = entity.uri.named_node() {
                sink.add_value(&node, &rdfs::LABEL.into_owned(), &entity.labels);
            }
        }
        None => {
            let predicate = term(CTO, &format!("{}Literal", relation(field.fallback())));
            sink.add_value(subject, &predicate, &entity.labels);
        }
    }
}

fn add_incipit(sink: &mut TripleSink, subject: &NamedNode, position: usize, incipit: &Incipit) {
    if !incipit.has_content() {
        return;
    }
    let node = incipit
        .uri
        .named_node()
        .or_else(|| Uri::new(&format!("{}#incipit-{position}", subject.as_str())).named_node());
    let Some(node) = node else {
        return;
    };
    sink.add(subject, &term(CTO, "incipit"), node.clone());
    sink.add(&node, &rdf::TYPE.into_owned(), term(CTO, "Incipit"));
    sink.add_value(&node, &term(CTO, "clef"), &incipit.clef);
    sink.add_value(&node, &term(CTO, "keySignature"), &incipit.key_signature);
    sink.add_value(&node, &term(CTO, "timeSignature"), &incipit.time_signature);
    sink.add_value(&node, &term(CTO, "pattern"), &incipit.pattern);
}
