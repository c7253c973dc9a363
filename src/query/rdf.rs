//! Pattern queries over parsed RDF graphs.
//!
//! [`RdfGraph`] wraps an [`oxrdf::Graph`] and answers the handful of
//! questions extractors ask: objects of a subject/predicate pair, subjects
//! of a predicate/object pair, whole triples matching a pattern, and the
//! URI plus labels of a node. Every node argument may be a single node or
//! a list (see [`IntoCandidates`]); lists are tried in the order given.

use oxrdf::{
    Graph, NamedNode, NamedOrBlankNode, NamedOrBlankNodeRef, Term, TermRef, Triple, TripleRef,
};

use super::broadcast::{IntoCandidates, cartesian};
use crate::model::{Label, LabelList, Uri, UriLabel};

/// Queryable RDF graph.
#[derive(Debug, Clone, Default)]
pub struct RdfGraph {
    graph: Graph,
}

impl From<Graph> for RdfGraph {
    fn from(graph: Graph) -> Self {
        Self { graph }
    }
}

impl RdfGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, triple: &Triple) -> bool {
        self.graph.insert(triple)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// The underlying graph.
    #[must_use]
    pub fn inner(&self) -> &Graph {
        &self.graph
    }

    pub fn iter(&self) -> impl Iterator<Item = TripleRef<'_>> {
        self.graph.iter()
    }

    /// First object found for any subject/predicate combination.
    pub fn first_object(
        &self,
        subjects: impl IntoCandidates<NamedOrBlankNode>,
        predicates: impl IntoCandidates<NamedNode>,
    ) -> Option<Term> {
        let subjects = subjects.into_candidates();
        let predicates = predicates.into_candidates();
        cartesian(&subjects, &predicates).find_map(|(s, p)| {
            self.graph
                .object_for_subject_predicate(s, p)
                .map(TermRef::into_owned)
        })
    }

    /// All distinct objects for every subject/predicate combination.
    pub fn all_objects(
        &self,
        subjects: impl IntoCandidates<NamedOrBlankNode>,
        predicates: impl IntoCandidates<NamedNode>,
    ) -> Vec<Term> {
        let subjects = subjects.into_candidates();
        let predicates = predicates.into_candidates();
        let mut found = Vec::new();
        for (s, p) in cartesian(&subjects, &predicates) {
            for object in self.graph.objects_for_subject_predicate(s, p) {
                push_distinct(&mut found, object.into_owned());
            }
        }
        found
    }

    /// First subject found for any predicate/object combination.
    pub fn first_subject(
        &self,
        predicates: impl IntoCandidates<NamedNode>,
        objects: impl IntoCandidates<Term>,
    ) -> Option<NamedOrBlankNode> {
        let predicates = predicates.into_candidates();
        let objects = objects.into_candidates();
        cartesian(&predicates, &objects).find_map(|(p, o)| {
            self.graph
                .subject_for_predicate_object(p, o)
                .map(NamedOrBlankNodeRef::into_owned)
        })
    }

    /// All distinct subjects for every predicate/object combination.
    pub fn all_subjects(
        &self,
        predicates: impl IntoCandidates<NamedNode>,
        objects: impl IntoCandidates<Term>,
    ) -> Vec<NamedOrBlankNode> {
        let predicates = predicates.into_candidates();
        let objects = objects.into_candidates();
        let mut found = Vec::new();
        for (p, o) in cartesian(&predicates, &objects) {
            for subject in self.graph.subjects_for_predicate_object(p, o) {
                push_distinct(&mut found, subject.into_owned());
            }
        }
        found
    }

    /// First triple matching the pattern.
    #[must_use]
    pub fn first_triple(&self, pattern: &TriplePattern) -> Option<Triple> {
        self.graph
            .iter()
            .find(|triple| pattern.matches(*triple))
            .map(TripleRef::into_owned)
    }

    /// All triples matching the pattern. Graph triples are unique already.
    #[must_use]
    pub fn all_triples(&self, pattern: &TriplePattern) -> Vec<Triple> {
        self.graph
            .iter()
            .filter(|triple| pattern.matches(*triple))
            .map(TripleRef::into_owned)
            .collect()
    }

    /// Number of triples matching the pattern.
    #[must_use]
    pub fn count_triples(&self, pattern: &TriplePattern) -> usize {
        self.graph
            .iter()
            .filter(|triple| pattern.matches(*triple))
            .count()
    }

    /// Literal objects of the subject/predicate combinations as labels.
    pub fn labels(
        &self,
        subjects: impl IntoCandidates<NamedOrBlankNode>,
        predicates: impl IntoCandidates<NamedNode>,
    ) -> LabelList {
        self.all_objects(subjects, predicates)
            .iter()
            .filter_map(|term| match term {
                Term::Literal(literal) => Some(Label::from_literal(literal)),
                _ => None,
            })
            .collect()
    }

    /// Objects of the subject/predicate combinations read as URIs. Literal
    /// objects count when they hold an absolute URI.
    pub fn uris(
        &self,
        subjects: impl IntoCandidates<NamedOrBlankNode>,
        predicates: impl IntoCandidates<NamedNode>,
    ) -> Vec<Uri> {
        self.all_objects(subjects, predicates)
            .iter()
            .filter_map(|term| match term {
                Term::NamedNode(node) => Some(Uri::new(node.as_str())),
                Term::Literal(literal) => Some(Uri::new(literal.value())),
                _ => None,
            })
            .filter(|uri| !uri.is_empty())
            .collect()
    }

    /// URI and labels of a node.
    ///
    /// Named nodes yield their URI plus the literal values of
    /// `label_predicates`; blank nodes yield labels only; literals become
    /// the label themselves.
    pub fn uri_and_label(
        &self,
        node: &Term,
        label_predicates: impl IntoCandidates<NamedNode>,
    ) -> UriLabel {
        match node {
            Term::NamedNode(named) => UriLabel::new(
                Uri::new(named.as_str()),
                self.labels(named, label_predicates),
            ),
            Term::BlankNode(blank) => UriLabel::new(
                Uri::empty(),
                self.labels(blank, label_predicates),
            ),
            Term::Literal(literal) => UriLabel::from_label(Label::from_literal(literal)),
            #[allow(unreachable_patterns)]
            _ => UriLabel::default(),
        }
    }
}

/// Converts an object term into a subject, when it can be one.
#[must_use]
pub fn as_subject(term: &Term) -> Option<NamedOrBlankNode> {
    match term {
        Term::NamedNode(node) => Some(node.clone().into()),
        Term::BlankNode(node) => Some(node.clone().into()),
        _ => None,
    }
}

fn push_distinct<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// Triple pattern; unset positions match anything.
#[derive(Debug, Clone, Default)]
pub struct TriplePattern {
    subjects: Option<Vec<NamedOrBlankNode>>,
    predicates: Option<Vec<NamedNode>>,
    objects: Option<Vec<Term>>,
}

impl TriplePattern {
    /// Pattern matching every triple.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn subject(mut self, subjects: impl IntoCandidates<NamedOrBlankNode>) -> Self {
        self.subjects = Some(subjects.into_candidates());
        self
    }

    #[must_use]
    pub fn predicate(mut self, predicates: impl IntoCandidates<NamedNode>) -> Self {
        self.predicates = Some(predicates.into_candidates());
        self
    }

    #[must_use]
    pub fn object(mut self, objects: impl IntoCandidates<Term>) -> Self {
        self.objects = Some(objects.into_candidates());
        self
    }

    fn matches(&self, triple: TripleRef<'_>) -> bool {
        let subject_ok = self
            .subjects
            .as_ref()
            .is_none_or(|subjects| subjects.iter().any(|s| s.as_ref() == triple.subject));
        let predicate_ok = self
            .predicates
            .as_ref()
            .is_none_or(|predicates| predicates.iter().any(|p| p.as_ref() == triple.predicate));
        let object_ok = self
            .objects
            .as_ref()
            .is_none_or(|objects| objects.iter().any(|o| o.as_ref() == triple.object));
        subject_ok && predicate_ok && object_ok
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use oxrdf::{BlankNode, Literal, NamedNodeRef};

    use super::*;
    use crate::model::Canonical;

    const NAME: NamedNodeRef<'static> = NamedNodeRef::new_unchecked("http://schema.org/name");
    const ALT: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://schema.org/alternateName");
    const ABOUT: NamedNodeRef<'static> = NamedNodeRef::new_unchecked("http://schema.org/about");

    fn node(iri: &str) -> NamedNode {
        NamedNode::new(iri).unwrap()
    }

    fn sample() -> RdfGraph {
        let mut graph = RdfGraph::new();
        let letter = node("http://example.org/letter/1");
        let person = node("http://example.org/person/goethe");
        let topic = BlankNode::default();
        graph.insert(&Triple::new(
            letter.clone(),
            ALT,
            Literal::new_simple_literal("Brief an Schiller"),
        ));
        graph.insert(&Triple::new(letter.clone(), ABOUT, person.clone()));
        graph.insert(&Triple::new(letter.clone(), ABOUT, topic.clone()));
        graph.insert(&Triple::new(
            person,
            NAME,
            Literal::new_language_tagged_literal("Goethe", "de").unwrap(),
        ));
        graph.insert(&Triple::new(
            topic,
            NAME,
            Literal::new_simple_literal("Weimar"),
        ));
        graph
    }

    // ==================== Object/Subject Tests ====================

    #[test]
    fn test_first_object_broadcasts_predicates_in_order() {
        let graph = sample();
        let letter = node("http://example.org/letter/1");
        let found = graph.first_object(&letter, [NAME, ALT]).unwrap();
        assert!(matches!(found, Term::Literal(ref l) if l.value() == "Brief an Schiller"));
    }

    #[test]
    fn test_first_object_missing_is_none() {
        let graph = sample();
        assert!(graph.first_object(node("http://example.org/nothing"), NAME).is_none());
    }

    #[test]
    fn test_all_objects_distinct() {
        let graph = sample();
        let letter = node("http://example.org/letter/1");
        assert_eq!(graph.all_objects(&letter, [ABOUT, ABOUT]).len(), 2);
    }

    #[test]
    fn test_all_subjects() {
        let graph = sample();
        let person = node("http://example.org/person/goethe");
        let subjects = graph.all_subjects(ABOUT, &person);
        assert_eq!(subjects, vec![NamedOrBlankNode::from(node("http://example.org/letter/1"))]);
        assert!(graph.first_subject(NAME, &person).is_none());
    }

    // ==================== Triple Pattern Tests ====================

    #[test]
    fn test_triple_pattern_wildcards() {
        let graph = sample();
        assert_eq!(graph.count_triples(&TriplePattern::any()), 5);
        assert_eq!(graph.count_triples(&TriplePattern::any().predicate(NAME)), 2);
        let pattern = TriplePattern::any()
            .subject(node("http://example.org/letter/1"))
            .predicate(ABOUT);
        assert_eq!(graph.all_triples(&pattern).len(), 2);
        assert!(graph.first_triple(&pattern).is_some());
    }

    // ==================== URI/Label Tests ====================

    #[test]
    fn test_uri_and_label_named_node() {
        let graph = sample();
        let person: Term = node("http://example.org/person/goethe").into();
        let entry = graph.uri_and_label(&person, NAME);
        assert_eq!(entry.uri.as_str(), Some("http://example.org/person/goethe"));
        assert_eq!(entry.to_text(), "Goethe");
        assert_eq!(entry.labels.first().unwrap().language(), Some("de"));
    }

    #[test]
    fn test_uri_and_label_blank_node_has_labels_only() {
        let graph = sample();
        let letter = node("http://example.org/letter/1");
        let blank = graph
            .all_objects(&letter, ABOUT)
            .into_iter()
            .find(|t| matches!(t, Term::BlankNode(_)))
            .unwrap();
        let entry = graph.uri_and_label(&blank, NAME);
        assert!(entry.uri.is_empty());
        assert_eq!(entry.to_text(), "Weimar");
    }

    #[test]
    fn test_uri_and_label_literal() {
        let graph = sample();
        let literal: Term = Literal::new_simple_literal("Jena").into();
        assert_eq!(graph.uri_and_label(&literal, NAME).to_text(), "Jena");
    }
}
