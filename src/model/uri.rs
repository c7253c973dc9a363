//! Normalized URIs and ordered URI sets.

use std::fmt;
use std::sync::LazyLock;

use oxrdf::{NamedNode, Term};
use regex::Regex;
use url::Url;

use super::namespaces::{ICONCLASS, KNOWN};
use super::{Canonical, push_unique, same_members};

/// Legacy URI forms and their linked-data replacement.
#[allow(clippy::expect_used)]
static LEGACY_REWRITES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"^https?://(?:www\.)?wikidata\.org/(?:wiki|entity)/([QPL]\d+)$")
                .expect("wikidata regex is valid"), // Static pattern, safe to panic
            "http://www.wikidata.org/entity/$1",
        ),
        (
            Regex::new(r"^https?://(?:www\.|sws\.)?geonames\.org/(\d+)(?:/.*)?$")
                .expect("geonames regex is valid"), // Static pattern, safe to panic
            "https://sws.geonames.org/$1",
        ),
        (
            Regex::new(r"^https?://d-nb\.info/gnd/([0-9X-]+)/about(?:/.*)?$")
                .expect("gnd regex is valid"), // Static pattern, safe to panic
            "https://d-nb.info/gnd/$1",
        ),
    ]
});

/// A single absolute URI, or nothing.
///
/// Normalization runs once in [`Uri::new`] and is idempotent: feeding the
/// normalized string back in yields the same value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uri {
    value: Option<String>,
}

impl Uri {
    /// Builds a normalized URI. Anything that is not an absolute URI yields
    /// an empty value.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self {
            value: normalize(raw),
        }
    }

    /// The empty URI.
    #[must_use]
    pub const fn empty() -> Self {
        Self { value: None }
    }

    /// Builds from an optional string, treating `None` as empty.
    #[must_use]
    pub fn from_option(raw: Option<&str>) -> Self {
        raw.map_or_else(Self::empty, Self::new)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_deref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// The URI as an RDF named node.
    #[must_use]
    pub fn named_node(&self) -> Option<NamedNode> {
        self.value
            .as_deref()
            .and_then(|value| NamedNode::new(value).ok())
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value.as_deref().unwrap_or_default())
    }
}

impl Canonical for Uri {
    fn has_content(&self) -> bool {
        self.value.is_some()
    }

    fn to_text(&self) -> String {
        self.value.clone().unwrap_or_default()
    }

    fn to_terms(&self) -> Vec<Term> {
        self.named_node().map(Term::from).into_iter().collect()
    }
}

/// Applies the normalization rules to a raw URI string.
fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let (_, remainder) = trimmed.split_once(':')?;
    if remainder.is_empty() || Url::parse(trimmed).is_err() {
        return None;
    }

    let mut value = strip_trailing_slash(trimmed).to_string();

    for (pattern, replacement) in LEGACY_REWRITES.iter() {
        if pattern.is_match(&value) {
            value = pattern.replace(&value, *replacement).into_owned();
            break;
        }
    }

    if !is_known(&value) {
        if let Some(swapped) = swap_scheme(&value) {
            if is_known(&swapped) {
                value = swapped;
            }
        }
    }

    if let Some(local) = value.strip_prefix(ICONCLASS) {
        if let Ok(decoded) = urlencoding::decode(local) {
            value = format!("{ICONCLASS}{}", urlencoding::encode(&decoded));
        }
    }

    Some(value)
}

/// Drops exactly one trailing slash. A trailing `//` is kept so that a
/// second pass does not strip again, and so is a slash that is all there is
/// after the scheme.
fn strip_trailing_slash(value: &str) -> &str {
    if value.ends_with("//") {
        return value;
    }
    match value.strip_suffix('/') {
        Some(stripped) if !stripped.ends_with(':') => stripped,
        _ => value,
    }
}

fn is_known(value: &str) -> bool {
    KNOWN.iter().any(|namespace| value.starts_with(namespace))
}

fn swap_scheme(value: &str) -> Option<String> {
    if let Some(rest) = value.strip_prefix("https://") {
        Some(format!("http://{rest}"))
    } else {
        value
            .strip_prefix("http://")
            .map(|rest| format!("https://{rest}"))
    }
}

/// Ordered set of URIs: empties and duplicates are dropped on insert.
///
/// Equality ignores order.
#[derive(Debug, Clone, Default)]
pub struct UriList {
    items: Vec<Uri>,
}

impl UriList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URI; returns whether it was new.
    pub fn push(&mut self, uri: Uri) -> bool {
        push_unique(&mut self.items, uri)
    }

    /// Normalizes and adds a raw string.
    pub fn push_str(&mut self, raw: &str) -> bool {
        self.push(Uri::new(raw))
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Uri>) {
        for uri in other {
            self.push(uri);
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

    #[must_use]
    pub fn first(&self) -> Option<&Uri> {
        self.items.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Uri> {
        self.items.iter()
    }

    #[must_use]
    pub fn contains(&self, uri: &Uri) -> bool {
        self.items.contains(uri)
    }
}

impl PartialEq for UriList {
    fn eq(&self, other: &Self) -> bool {
        same_members(&self.items, &other.items)
    }
}

impl Eq for UriList {}

impl FromIterator<Uri> for UriList {
    fn from_iter<I: IntoIterator<Item = Uri>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<'a> IntoIterator for &'a UriList {
    type Item = &'a Uri;
    type IntoIter = std::slice::Iter<'a, Uri>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for UriList {
    type Item = Uri;
    type IntoIter = std::vec::IntoIter<Uri>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl Canonical for UriList {
    fn has_content(&self) -> bool {
        !self.items.is_empty()
    }

    fn to_text(&self) -> String {
        self.items
            .iter()
            .map(Uri::to_text)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn to_terms(&self) -> Vec<Term> {
        self.items.iter().flat_map(Uri::to_terms).collect()
    }
}
