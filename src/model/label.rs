//! Labels, label lists and URI/label pairs.

use oxrdf::vocab::{rdf, xsd};
use oxrdf::{Literal, NamedNode, Term};

use super::uri::Uri;
use super::{Canonical, push_unique, same_members};

/// A trimmed, non-empty piece of text with optional language and datatype.
///
/// Language and datatype are only kept when there is text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Label {
    text: Option<String>,
    language: Option<String>,
    datatype: Option<String>,
}

impl Label {
    /// Builds a plain label.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self::build(text, None, None)
    }

    /// Builds a label with an optional language tag.
    #[must_use]
    pub fn with_language(text: &str, language: Option<&str>) -> Self {
        Self::build(text, language, None)
    }

    /// Builds a label with an explicit datatype IRI.
    #[must_use]
    pub fn typed(text: &str, datatype: &str) -> Self {
        Self::build(text, None, Some(datatype))
    }

    /// The empty label.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            text: None,
            language: None,
            datatype: None,
        }
    }

    /// Converts an RDF literal. `xsd:string` and `rdf:langString` are
    /// implied and not stored as datatypes.
    #[must_use]
    pub fn from_literal(literal: &Literal) -> Self {
        let datatype = literal.datatype();
        let explicit = (datatype != xsd::STRING && datatype != rdf::LANG_STRING)
            .then(|| datatype.as_str());
        Self::build(literal.value(), literal.language(), explicit)
    }

    fn build(text: &str, language: Option<&str>, datatype: Option<&str>) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self::empty();
        }
        let clean = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(String::from)
        };
        Self {
            text: Some(text.to_string()),
            language: clean(language),
            datatype: clean(datatype),
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    #[must_use]
    pub fn datatype(&self) -> Option<&str> {
        self.datatype.as_deref()
    }

    /// The label as an RDF literal.
    #[must_use]
    pub fn literal(&self) -> Option<Literal> {
        let text = self.text.as_deref()?;
        if let Some(language) = &self.language {
            if let Ok(literal) = Literal::new_language_tagged_literal(text, language) {
                return Some(literal);
            }
        }
        if let Some(datatype) = self.datatype.as_deref().and_then(|d| NamedNode::new(d).ok()) {
            return Some(Literal::new_typed_literal(text, datatype));
        }
        Some(Literal::new_simple_literal(text))
    }
}

impl Canonical for Label {
    fn has_content(&self) -> bool {
        self.text.is_some()
    }

    fn to_text(&self) -> String {
        self.text.clone().unwrap_or_default()
    }

    fn to_terms(&self) -> Vec<Term> {
        self.literal().map(Term::from).into_iter().collect()
    }
}

/// Ordered set of labels keyed on text, language and datatype.
#[derive(Debug, Clone, Default)]
pub struct LabelList {
    items: Vec<Label>,
}

impl LabelList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: Label) -> bool {
        push_unique(&mut self.items, label)
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Label>) {
        for label in other {
            self.push(label);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.items.iter()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Label> {
        self.items.first()
    }

    /// The first label in `language`, falling back to the first label.
    #[must_use]
    pub fn preferred(&self, language: Option<&str>) -> Option<&Label> {
        language
            .and_then(|wanted| {
                self.items
                    .iter()
                    .find(|label| label.language() == Some(wanted))
            })
            .or_else(|| self.items.first())
    }
}

impl PartialEq for LabelList {
    fn eq(&self, other: &Self) -> bool {
        same_members(&self.items, &other.items)
    }
}

impl Eq for LabelList {}

impl FromIterator<Label> for LabelList {
    fn from_iter<I: IntoIterator<Item = Label>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<'a> IntoIterator for &'a LabelList {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for LabelList {
    type Item = Label;
    type IntoIter = std::vec::IntoIter<Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl Canonical for LabelList {
    fn has_content(&self) -> bool {
        !self.items.is_empty()
    }

    fn to_text(&self) -> String {
        self.items
            .iter()
            .map(Label::to_text)
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn to_terms(&self) -> Vec<Term> {
        self.items.iter().flat_map(Label::to_terms).collect()
    }
}

/// An entity reference: a URI, its labels, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriLabel {
    pub uri: Uri,
    pub labels: LabelList,
}

impl UriLabel {
    #[must_use]
    pub fn new(uri: Uri, labels: LabelList) -> Self {
        Self { uri, labels }
    }

    /// A reference carrying only a URI.
    #[must_use]
    pub fn from_uri(uri: Uri) -> Self {
        Self::new(uri, LabelList::new())
    }

    /// A reference carrying only one label.
    #[must_use]
    pub fn from_label(label: Label) -> Self {
        Self::new(Uri::empty(), std::iter::once(label).collect())
    }
}

impl Canonical for UriLabel {
    fn has_content(&self) -> bool {
        self.uri.has_content() || self.labels.has_content()
    }

    /// The first label, or the URI when there is none.
    fn to_text(&self) -> String {
        self.labels
            .first()
            .map_or_else(|| self.uri.to_text(), Label::to_text)
    }

    /// The URI node, or the label literals for unidentified entities.
    fn to_terms(&self) -> Vec<Term> {
        if self.uri.has_content() {
            self.uri.to_terms()
        } else {
            self.labels.to_terms()
        }
    }
}

/// Collection of entity references. Entries sharing a URI are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriLabelList {
    items: Vec<UriLabel>,
}

impl UriLabelList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, merging labels into an existing entry with the same URI.
    pub fn push(&mut self, entry: UriLabel) {
        if !entry.has_content() {
            return;
        }
        if entry.uri.has_content() {
            if let Some(existing) = self.items.iter_mut().find(|item| item.uri == entry.uri) {
                existing.labels.extend(entry.labels);
                return;
            }
        }
        push_unique(&mut self.items, entry);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = UriLabel>) {
        for entry in other {
            self.push(entry);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UriLabel> {
        self.items.iter()
    }
}

impl FromIterator<UriLabel> for UriLabelList {
    fn from_iter<I: IntoIterator<Item = UriLabel>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<'a> IntoIterator for &'a UriLabelList {
    type Item = &'a UriLabel;
    type IntoIter = std::slice::Iter<'a, UriLabel>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Canonical for UriLabelList {
    fn has_content(&self) -> bool {
        !self.items.is_empty()
    }

    fn to_text(&self) -> String {
        self.items
            .iter()
            .map(UriLabel::to_text)
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn to_terms(&self) -> Vec<Term> {
        self.items.iter().flat_map(UriLabel::to_terms).collect()
    }
}
