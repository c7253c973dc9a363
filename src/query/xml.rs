//! Namespace-aware XML element tree.
//!
//! [`XmlTree`] is an arena of elements built from a `quick-xml` event stream.
//! Elements keep their resolved namespace, attributes, mixed content and a
//! parent link, which is what language inheritance and `..` need.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::trace;

use super::QueryError;
use super::broadcast::IntoCandidates;
use super::path::{Axis, NodeTest, Predicate, QName, Step, Target, XML_NAMESPACE, XmlPath};
use crate::model::{Label, LabelList, Uri, UriLabel};

/// Index of an element inside its tree.
pub type NodeId = usize;

/// One attribute with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
enum Content {
    Text(String),
    Child(NodeId),
}

/// One element of the tree.
#[derive(Debug, Clone)]
pub struct XmlElement {
    namespace: Option<String>,
    name: String,
    attributes: Vec<XmlAttribute>,
    content: Vec<Content>,
    parent: Option<NodeId>,
}

impl XmlElement {
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    /// Value of the attribute `name` in `namespace`.
    #[must_use]
    pub fn attribute(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.namespace.as_deref() == namespace)
            .map(|a| a.value.as_str())
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child element ids in document order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.content.iter().filter_map(|c| match c {
            Content::Child(id) => Some(*id),
            Content::Text(_) => None,
        })
    }

    fn is(&self, name: &QName) -> bool {
        self.name == name.local && self.namespace == name.namespace
    }
}

/// A parsed XML document.
#[derive(Debug, Clone)]
pub struct XmlTree {
    elements: Vec<XmlElement>,
}

impl XmlTree {
    /// Parses a document.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Xml`] for malformed markup or a document
    /// without a root element.
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let mut reader = Reader::from_str(text);
        let mut elements: Vec<XmlElement> = Vec::new();
        let mut open: Vec<NodeId> = Vec::new();
        let mut scopes: Vec<HashMap<String, String>> = vec![HashMap::from([(
            "xml".to_string(),
            XML_NAMESPACE.to_string(),
        )])];

        loop {
            match reader.read_event().map_err(QueryError::xml)? {
                Event::Start(start) => {
                    let id = open_element(&start, &mut elements, &mut scopes, open.last().copied())?;
                    open.push(id);
                }
                Event::Empty(start) => {
                    open_element(&start, &mut elements, &mut scopes, open.last().copied())?;
                    scopes.pop();
                }
                Event::End(_) => {
                    open.pop();
                    scopes.pop();
                }
                Event::Text(text) => {
                    let value = text.unescape().map_err(QueryError::xml)?;
                    push_text(&mut elements, open.last().copied(), &value);
                }
                Event::CData(data) => {
                    let bytes = data.into_inner();
                    push_text(&mut elements, open.last().copied(), &String::from_utf8_lossy(&bytes));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if elements.is_empty() {
            return Err(QueryError::xml("document has no root element"));
        }
        if !open.is_empty() {
            return Err(QueryError::xml("unclosed element at end of document"));
        }
        trace!(elements = elements.len(), "parsed XML tree");
        Ok(Self { elements })
    }

    /// The document element.
    #[must_use]
    pub fn root(&self) -> NodeId {
        0
    }

    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&XmlElement> {
        self.elements.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Descendant text with whitespace runs collapsed.
    #[must_use]
    pub fn text(&self, id: NodeId) -> String {
        let mut raw = String::new();
        self.collect_text(id, &mut raw);
        normalize_space(&raw)
    }

    /// Direct text children only, whitespace collapsed.
    #[must_use]
    pub fn own_text(&self, id: NodeId) -> String {
        let Some(element) = self.elements.get(id) else {
            return String::new();
        };
        let raw: String = element
            .content
            .iter()
            .filter_map(|c| match c {
                Content::Text(text) => Some(text.as_str()),
                Content::Child(_) => None,
            })
            .collect();
        normalize_space(&raw)
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(element) = self.elements.get(id) else {
            return;
        };
        for content in &element.content {
            match content {
                Content::Text(text) => out.push_str(text),
                Content::Child(child) => self.collect_text(*child, out),
            }
        }
    }

    /// Language of an element: the nearest `xml:lang` (or `lang`) on the
    /// element or its ancestors.
    #[must_use]
    pub fn language(&self, id: NodeId) -> Option<&str> {
        let mut current = Some(id);
        while let Some(node) = current {
            let element = self.elements.get(node)?;
            if let Some(lang) = element
                .attribute(Some(XML_NAMESPACE), "lang")
                .or_else(|| element.attribute(None, "lang"))
                .filter(|lang| !lang.trim().is_empty())
            {
                return Some(lang.trim());
            }
            current = element.parent;
        }
        None
    }

    // ==================== Path evaluation ====================

    /// Elements selected by a path, in document order per context.
    fn select(&self, context: Option<NodeId>, path: &XmlPath) -> Vec<NodeId> {
        // `None` stands for the document node, whose only child is the root.
        let start = if path.absolute { None } else { context };
        let mut current: Vec<Option<NodeId>> = vec![start];
        for step in &path.steps {
            let mut next: Vec<Option<NodeId>> = Vec::new();
            for node in &current {
                for found in self.apply_step(*node, step) {
                    if !next.contains(&found) {
                        next.push(found);
                    }
                }
            }
            current = next;
        }
        current.into_iter().flatten().collect()
    }

    fn apply_step(&self, node: Option<NodeId>, step: &Step) -> Vec<Option<NodeId>> {
        let candidates: Vec<Option<NodeId>> = match (&step.test, step.axis) {
            (NodeTest::SelfNode, Axis::Descendant) => {
                let mut all = vec![node];
                all.extend(self.descendants(node).into_iter().map(Some));
                all
            }
            (NodeTest::SelfNode, Axis::Child) => vec![node],
            (NodeTest::Parent, _) => match node {
                Some(id) => vec![self.elements.get(id).and_then(|e| e.parent)],
                None => Vec::new(),
            },
            (test, axis) => {
                let pool = match axis {
                    Axis::Child => self.children_of(node),
                    Axis::Descendant => self.descendants(node),
                };
                pool.into_iter()
                    .filter(|id| self.matches_test(*id, test))
                    .map(Some)
                    .collect()
            }
        };

        let mut selected = candidates;
        for predicate in &step.predicates {
            selected = match predicate {
                Predicate::Position(position) => selected
                    .get(position - 1)
                    .copied()
                    .into_iter()
                    .collect(),
                Predicate::HasAttribute(name) => selected
                    .into_iter()
                    .filter(|n| self.attribute_of(*n, name).is_some())
                    .collect(),
                Predicate::AttributeEquals(name, value) => selected
                    .into_iter()
                    .filter(|n| self.attribute_of(*n, name) == Some(value.as_str()))
                    .collect(),
            };
        }
        selected
    }

    fn matches_test(&self, id: NodeId, test: &NodeTest) -> bool {
        match test {
            NodeTest::AnyElement => true,
            NodeTest::Name(name) => self.elements.get(id).is_some_and(|e| e.is(name)),
            NodeTest::SelfNode | NodeTest::Parent => false,
        }
    }

    fn attribute_of(&self, node: Option<NodeId>, name: &QName) -> Option<&str> {
        self.elements
            .get(node?)?
            .attribute(name.namespace.as_deref(), &name.local)
    }

    fn children_of(&self, node: Option<NodeId>) -> Vec<NodeId> {
        match node {
            None => vec![self.root()],
            Some(id) => self
                .elements
                .get(id)
                .map(|e| e.children().collect())
                .unwrap_or_default(),
        }
    }

    fn descendants(&self, node: Option<NodeId>) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children_of(node).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(element) = self.elements.get(id) {
                let children: Vec<NodeId> = element.children().collect();
                stack.extend(children.into_iter().rev());
            }
        }
        out
    }

    /// String values selected by a path, paired with the element they were
    /// read from.
    fn values(&self, context: Option<NodeId>, path: &XmlPath) -> Vec<(NodeId, String)> {
        let elements = self.select(context, path);
        elements
            .into_iter()
            .filter_map(|id| {
                let value = match &path.target {
                    Target::Elements => self.text(id),
                    Target::Text => self.own_text(id),
                    Target::Attribute(name) => self
                        .attribute_of(Some(id), name)
                        .map(normalize_space)?,
                };
                (!value.is_empty()).then_some((id, value))
            })
            .collect()
    }

    fn label_for(&self, id: NodeId, value: &str, want_language: bool) -> Label {
        if want_language {
            Label::with_language(value, self.language(id))
        } else {
            Label::new(value)
        }
    }

    // ==================== Queries ====================

    /// First non-empty text found by any of the paths.
    pub fn first_text<'p>(
        &self,
        context: Option<NodeId>,
        paths: impl IntoCandidates<&'p XmlPath>,
        want_language: bool,
    ) -> Label {
        paths
            .into_candidates()
            .into_iter()
            .find_map(|path| self.values(context, path).into_iter().next())
            .map_or_else(Label::empty, |(id, value)| {
                self.label_for(id, &value, want_language)
            })
    }

    /// All distinct texts found by the paths.
    pub fn all_texts<'p>(
        &self,
        context: Option<NodeId>,
        paths: impl IntoCandidates<&'p XmlPath>,
        want_language: bool,
    ) -> LabelList {
        paths
            .into_candidates()
            .into_iter()
            .flat_map(|path| self.values(context, path))
            .map(|(id, value)| self.label_for(id, &value, want_language))
            .collect()
    }

    /// First element found by any of the paths.
    pub fn first_element<'p>(
        &self,
        context: Option<NodeId>,
        paths: impl IntoCandidates<&'p XmlPath>,
    ) -> Option<NodeId> {
        paths
            .into_candidates()
            .into_iter()
            .find_map(|path| self.select(context, path).into_iter().next())
    }

    /// All distinct elements found by the paths.
    pub fn all_elements<'p>(
        &self,
        context: Option<NodeId>,
        paths: impl IntoCandidates<&'p XmlPath>,
    ) -> Vec<NodeId> {
        let mut found = Vec::new();
        for path in paths.into_candidates() {
            for id in self.select(context, path) {
                if !found.contains(&id) {
                    found.push(id);
                }
            }
        }
        found
    }

    /// All distinct elements found by `path` from each of several contexts.
    #[must_use]
    pub fn all_elements_under(&self, contexts: &[NodeId], path: &XmlPath) -> Vec<NodeId> {
        let mut found = Vec::new();
        for context in contexts {
            for id in self.select(Some(*context), path) {
                if !found.contains(&id) {
                    found.push(id);
                }
            }
        }
        found
    }

    /// First value of `attribute` on the elements found by the paths.
    pub fn first_attribute<'p>(
        &self,
        context: Option<NodeId>,
        paths: impl IntoCandidates<&'p XmlPath>,
        attribute: &QualifiedAttribute,
    ) -> Option<String> {
        self.all_attributes(context, paths, attribute).into_iter().next()
    }

    /// All distinct values of `attribute` on the elements found by the paths.
    pub fn all_attributes<'p>(
        &self,
        context: Option<NodeId>,
        paths: impl IntoCandidates<&'p XmlPath>,
        attribute: &QualifiedAttribute,
    ) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for id in self.all_elements(context, paths) {
            if let Some(value) = self
                .elements
                .get(id)
                .and_then(|e| e.attribute(attribute.namespace.as_deref(), &attribute.name))
                .map(normalize_space)
                .filter(|v| !v.is_empty())
            {
                if !found.contains(&value) {
                    found.push(value);
                }
            }
        }
        found
    }

    /// Entity references read from a list of elements.
    ///
    /// For each element, `uri_path` and `label_path` are evaluated relative
    /// to it. With `is_multiple` the URI value is split on whitespace and
    /// each URI becomes its own entry carrying the element's labels;
    /// otherwise the first URI is used.
    #[must_use]
    pub fn uri_and_label(
        &self,
        elements: &[NodeId],
        uri_path: &XmlPath,
        label_path: &XmlPath,
        is_multiple: bool,
    ) -> Vec<UriLabel> {
        let mut entries = Vec::new();
        for &element in elements {
            let labels = self.all_texts(Some(element), label_path, true);
            let raw_uris: Vec<String> = self
                .values(Some(element), uri_path)
                .into_iter()
                .map(|(_, value)| value)
                .collect();
            let uris: Vec<Uri> = if is_multiple {
                raw_uris
                    .iter()
                    .flat_map(|value| value.split_whitespace())
                    .map(Uri::new)
                    .filter(|uri| !uri.is_empty())
                    .collect()
            } else {
                raw_uris
                    .iter()
                    .map(|value| Uri::new(value))
                    .find(|uri| !uri.is_empty())
                    .into_iter()
                    .collect()
            };

            if uris.is_empty() {
                entries.push(UriLabel::new(Uri::empty(), labels));
            } else {
                entries.extend(uris.into_iter().map(|uri| UriLabel::new(uri, labels.clone())));
            }
        }
        entries.retain(crate::model::Canonical::has_content);
        entries
    }
}

/// An attribute name for the attribute queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedAttribute {
    pub namespace: Option<String>,
    pub name: String,
}

impl QualifiedAttribute {
    /// An attribute without namespace.
    #[must_use]
    pub fn local(name: &str) -> Self {
        Self {
            namespace: None,
            name: name.to_string(),
        }
    }
}

fn open_element(
    start: &BytesStart<'_>,
    elements: &mut Vec<XmlElement>,
    scopes: &mut Vec<HashMap<String, String>>,
    parent: Option<NodeId>,
) -> Result<NodeId, QueryError> {
    let mut scope = scopes.last().cloned().unwrap_or_default();
    let mut raw_attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(QueryError::xml)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(QueryError::xml)?.into_owned();
        if key == "xmlns" {
            scope.insert(String::new(), value);
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.insert(prefix.to_string(), value);
        } else {
            raw_attributes.push((key, value));
        }
    }

    let qualified = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let (namespace, name) = resolve(&scope, &qualified, true);
    let attributes = raw_attributes
        .into_iter()
        .map(|(key, value)| {
            let (namespace, name) = resolve(&scope, &key, false);
            XmlAttribute {
                namespace,
                name,
                value,
            }
        })
        .collect();
    scopes.push(scope);

    let id = elements.len();
    elements.push(XmlElement {
        namespace,
        name,
        attributes,
        content: Vec::new(),
        parent,
    });
    if let Some(parent) = parent.and_then(|p| elements.get_mut(p)) {
        parent.content.push(Content::Child(id));
    }
    Ok(id)
}

/// Splits a qualified name and resolves its prefix. Unprefixed attributes
/// have no namespace; unprefixed elements take the default namespace.
fn resolve(
    scope: &HashMap<String, String>,
    qualified: &str,
    is_element: bool,
) -> (Option<String>, String) {
    match qualified.split_once(':') {
        Some((prefix, local)) => (scope.get(prefix).cloned(), local.to_string()),
        None if is_element => (
            scope.get("").filter(|ns| !ns.is_empty()).cloned(),
            qualified.to_string(),
        ),
        None => (None, qualified.to_string()),
    }
}

fn push_text(elements: &mut [XmlElement], parent: Option<NodeId>, text: &str) {
    if let Some(element) = parent.and_then(|p| elements.get_mut(p)) {
        element.content.push(Content::Text(text.to_string()));
    }
}

fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Canonical;
    use crate::query::PathContext;

    const TEI: &str = r#"<?xml version="1.0"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0" xml:lang="de">
  <teiHeader>
    <fileDesc>
      <titleStmt><title>Briefe</title><title xml:lang="en">Letters</title></titleStmt>
    </fileDesc>
    <profileDesc>
      <correspDesc ref="https://example.org/letter/1">
        <correspAction type="sent">
          <persName ref="https://d-nb.info/gnd/118540238 http://viaf.org/viaf/24602065">Goethe,  Johann
            Wolfgang</persName>
          <placeName ref="https://sws.geonames.org/2812482">Weimar</placeName>
          <date when="1799-03-14"/>
        </correspAction>
        <correspAction type="received">
          <persName>Schiller</persName>
        </correspAction>
      </correspDesc>
    </profileDesc>
  </teiHeader>
</TEI>"#;

    fn ctx() -> PathContext {
        PathContext::new().with_namespace("tei", "http://www.tei-c.org/ns/1.0")
    }

    fn tree() -> XmlTree {
        XmlTree::parse(TEI).unwrap()
    }

    // ==================== Parsing Tests ====================

    #[test]
    fn test_parse_resolves_default_namespace() {
        let tree = tree();
        let root = tree.element(tree.root()).unwrap();
        assert_eq!(root.local_name(), "TEI");
        assert_eq!(root.namespace(), Some("http://www.tei-c.org/ns/1.0"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(XmlTree::parse("<a><b></a>").is_err());
        assert!(XmlTree::parse("").is_err());
        assert!(XmlTree::parse("<a>").is_err());
    }

    // ==================== Language Tests ====================

    #[test]
    fn test_language_inherited_from_ancestor() {
        let tree = tree();
        let path = ctx().compile("//tei:placeName").unwrap();
        let place = tree.first_element(None, &path).unwrap();
        // placeName -> correspAction -> correspDesc -> profileDesc -> teiHeader -> TEI
        assert_eq!(tree.language(place), Some("de"));
    }

    #[test]
    fn test_language_overridden_locally() {
        let tree = tree();
        let path = ctx().compile("//tei:title").unwrap();
        let titles = tree.all_texts(None, &path, true);
        assert_eq!(titles.len(), 2);
        let languages: Vec<_> = titles.iter().map(|l| l.language()).collect();
        assert_eq!(languages, vec![Some("de"), Some("en")]);
    }

    #[test]
    fn test_language_none_without_attribute() {
        let tree = XmlTree::parse("<a><b>x</b></a>").unwrap();
        assert_eq!(tree.language(1), None);
    }

    // ==================== Query Tests ====================

    #[test]
    fn test_first_text_normalizes_whitespace() {
        let tree = tree();
        let path = ctx().compile("//tei:correspAction[@type='sent']/tei:persName").unwrap();
        let label = tree.first_text(None, &path, false);
        assert_eq!(label.text(), Some("Goethe, Johann Wolfgang"));
        assert_eq!(label.language(), None);
    }

    #[test]
    fn test_first_text_tries_paths_in_order() {
        let tree = tree();
        let missing = ctx().compile("//tei:nothing").unwrap();
        let title = ctx().compile("//tei:title").unwrap();
        assert_eq!(tree.first_text(None, [&missing, &title], false).text(), Some("Briefe"));
        assert!(!tree.first_text(None, &missing, false).has_content());
    }

    #[test]
    fn test_relative_paths_and_parent_step() {
        let tree = tree();
        let actions = tree.all_elements(None, &ctx().compile("//tei:correspAction").unwrap());
        assert_eq!(actions.len(), 2);

        let when = ctx().compile("./tei:date/@when").unwrap();
        assert_eq!(tree.first_text(Some(actions[0]), &when, false).text(), Some("1799-03-14"));

        let up = ctx().compile("../@ref").unwrap();
        assert_eq!(
            tree.first_text(Some(actions[1]), &up, false).text(),
            Some("https://example.org/letter/1")
        );
    }

    #[test]
    fn test_position_predicate() {
        let tree = tree();
        let second = ctx().compile("//tei:titleStmt/tei:title[2]").unwrap();
        assert_eq!(tree.first_text(None, &second, false).text(), Some("Letters"));
    }

    #[test]
    fn test_attributes() {
        let tree = tree();
        let path = ctx().compile("//tei:persName").unwrap();
        let refs = tree.all_attributes(None, &path, &QualifiedAttribute::local("ref"));
        assert_eq!(refs.len(), 1);
        assert!(tree
            .first_attribute(None, &path, &QualifiedAttribute::local("missing"))
            .is_none());
    }

    #[test]
    fn test_uri_and_label_multiple() {
        let tree = tree();
        let persons = tree.all_elements(None, &ctx().compile("//tei:persName").unwrap());
        let uri = ctx().compile("@ref").unwrap();
        let label = ctx().compile(".").unwrap();

        let multiple = tree.uri_and_label(&persons, &uri, &label, true);
        assert_eq!(multiple.len(), 3);
        assert_eq!(multiple[0].uri.as_str(), Some("https://d-nb.info/gnd/118540238"));
        assert_eq!(multiple[1].uri.as_str(), Some("http://viaf.org/viaf/24602065"));
        assert!(multiple[2].uri.is_empty());
        assert_eq!(multiple[2].to_text(), "Schiller");

        let single = tree.uri_and_label(&persons, &uri, &label, false);
        assert_eq!(single.len(), 2);
    }
}
