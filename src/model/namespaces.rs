//! Namespaces the harvester knows about.
//!
//! [`KNOWN`] lists the authority and vocabulary namespaces used for URI
//! normalization: a URI whose scheme-swapped form falls under one of these
//! is rewritten to the listed scheme. [`category_for_namespace`] feeds the
//! namespace strategy of the authority classifier.

use crate::authority::EntityCategory;

pub const WIKIDATA: &str = "http://www.wikidata.org/entity/";
pub const GND: &str = "https://d-nb.info/gnd/";
pub const VIAF: &str = "http://viaf.org/viaf/";
pub const GEONAMES: &str = "https://sws.geonames.org/";
pub const GETTY_AAT: &str = "http://vocab.getty.edu/aat/";
pub const GETTY_TGN: &str = "http://vocab.getty.edu/tgn/";
pub const GETTY_ULAN: &str = "http://vocab.getty.edu/ulan/";
pub const ICONCLASS: &str = "https://iconclass.org/";
pub const LOC_NAMES: &str = "http://id.loc.gov/authorities/names/";
pub const LOC_SUBJECTS: &str = "http://id.loc.gov/authorities/subjects/";
pub const ROR: &str = "https://ror.org/";
pub const ORCID: &str = "https://orcid.org/";
pub const ISNI: &str = "https://isni.org/isni/";
pub const RISM: &str = "https://rism.online/";
pub const DBPEDIA: &str = "http://dbpedia.org/resource/";
pub const CERL: &str = "https://data.cerl.org/thesaurus/";
pub const DCMI_TYPE: &str = "http://purl.org/dc/dcmitype/";
pub const SCHEMA: &str = "http://schema.org/";

/// Vocabulary namespaces used by extractors and mappers.
pub const SCHEMA_HTTPS: &str = "https://schema.org/";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const HYDRA: &str = "http://www.w3.org/ns/hydra/core#";
pub const CTO: &str = "https://nfdi4culture.de/ontology#";
pub const NFDI: &str = "https://nfdi.fiz-karlsruhe.de/ontology/";
pub const TEI: &str = "http://www.tei-c.org/ns/1.0";
pub const TRIX: &str = "http://www.w3.org/2004/03/trix/trix-1/";

/// Authority and vocabulary namespaces in their canonical scheme.
pub const KNOWN: [&str; 18] = [
    WIKIDATA,
    GND,
    VIAF,
    GEONAMES,
    GETTY_AAT,
    GETTY_TGN,
    GETTY_ULAN,
    ICONCLASS,
    LOC_NAMES,
    LOC_SUBJECTS,
    ROR,
    ORCID,
    ISNI,
    RISM,
    DBPEDIA,
    CERL,
    DCMI_TYPE,
    SCHEMA,
];

/// Prefixes written into compiled graph outputs.
pub const OUTPUT_PREFIXES: [(&str, &str); 6] = [
    ("schema", SCHEMA),
    ("cto", CTO),
    ("nfdicore", NFDI),
    ("rdf", RDF),
    ("rdfs", RDFS),
    ("xsd", XSD),
];

/// Category implied by membership in a namespace, when the namespace only
/// holds one kind of entity.
#[must_use]
pub fn category_for_namespace(uri: &str) -> Option<EntityCategory> {
    let table: [(&str, EntityCategory); 9] = [
        (GEONAMES, EntityCategory::Location),
        (GETTY_TGN, EntityCategory::Location),
        (GETTY_ULAN, EntityCategory::Person),
        (ORCID, EntityCategory::Person),
        (ROR, EntityCategory::Organization),
        (GETTY_AAT, EntityCategory::SubjectConcept),
        (ICONCLASS, EntityCategory::SubjectConcept),
        (LOC_SUBJECTS, EntityCategory::SubjectConcept),
        (DCMI_TYPE, EntityCategory::ElementType),
    ];
    table
        .iter()
        .find(|(namespace, _)| uri.starts_with(namespace))
        .map(|(_, category)| *category)
}
