//! Canonical value types produced by extractors and consumed by mappers.
//!
//! Every type normalizes its input at construction and never changes
//! afterwards. All of them implement [`Canonical`], which gives the three
//! projections mappers need: a truthiness check, a plain-text form and a
//! list of RDF terms.

pub mod date;
pub mod incipit;
pub mod label;
pub mod namespaces;
pub mod record;
pub mod uri;

use oxrdf::Term;

pub use date::{Date, DateList};
pub use incipit::Incipit;
pub use label::{Label, LabelList, UriLabel, UriLabelList};
pub use record::{ElementRecord, FeedRecord};
pub use uri::{Uri, UriList};

/// Projections shared by every canonical value.
pub trait Canonical {
    /// Whether the value carries anything worth emitting.
    fn has_content(&self) -> bool;

    /// Plain-text projection. Empty values produce an empty string.
    fn to_text(&self) -> String;

    /// Graph-node projection. Empty values produce no terms.
    fn to_terms(&self) -> Vec<Term>;
}

/// Pushes `item` unless it is empty or already present.
///
/// Shared by the list types so they all keep insertion order and drop
/// duplicates the same way.
pub(crate) fn push_unique<T: Canonical + PartialEq>(items: &mut Vec<T>, item: T) -> bool {
    if !item.has_content() || items.contains(&item) {
        return false;
    }
    items.push(item);
    true
}

/// Order-insensitive equality for de-duplicated lists.
pub(crate) fn same_members<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().all(|item| b.contains(item))
}
