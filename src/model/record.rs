//! Per-resource records handed from extractors to mappers.

use super::Canonical;
use super::date::{Date, DateList};
use super::incipit::Incipit;
use super::label::{LabelList, UriLabel, UriLabelList};
use super::uri::{Uri, UriList};

/// Everything an extractor reads from one feed page.
#[derive(Debug, Clone, Default)]
pub struct FeedRecord {
    /// Identifier of the feed itself.
    pub feed_uri: Uri,
    pub title: LabelList,
    /// Last modification of the feed.
    pub modified: Date,
    pub same_as: UriList,
    /// Element URIs listed on this page, in order.
    pub elements: UriList,
    /// Elements fully described on the page itself; these are not fetched.
    pub inline_elements: Vec<ElementRecord>,
    /// Following page, empty on the last page.
    pub next_page: Uri,
    pub publisher: UriLabel,
    pub catalog: Uri,
}

impl FeedRecord {
    /// Number of elements the page announces, inline ones included.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len() + self.inline_elements.len()
    }
}

/// Everything an extractor reads from one element.
#[derive(Debug, Clone, Default)]
pub struct ElementRecord {
    pub uri: Uri,
    /// Location the element was read from.
    pub source: String,
    pub element_type: UriLabel,
    pub names: LabelList,
    pub descriptions: LabelList,
    pub dates: DateList,
    pub same_as: UriList,
    pub creators: UriLabelList,
    pub persons: UriLabelList,
    pub subjects: UriLabelList,
    pub locations: UriLabelList,
    pub incipits: Vec<Incipit>,
    pub feed: Uri,
    pub catalog: Uri,
    pub publisher: UriLabel,
}

impl ElementRecord {
    #[must_use]
    pub fn new(uri: Uri) -> Self {
        Self {
            uri,
            ..Self::default()
        }
    }

    /// Copies feed, catalog and publisher into fields the source left empty.
    pub fn fill_missing(&mut self, feed: &Uri, catalog: &Uri, publisher: &UriLabel) {
        if !self.feed.has_content() {
            self.feed = feed.clone();
        }
        if !self.catalog.has_content() {
            self.catalog = catalog.clone();
        }
        if !self.publisher.has_content() {
            self.publisher = publisher.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Label;

    #[test]
    fn test_fill_missing_only_sets_empty_fields() {
        let mut record = ElementRecord::new(Uri::new("https://example.org/e/1"));
        record.catalog = Uri::new("https://example.org/own-catalog");

        let publisher = UriLabel::from_label(Label::new("Example Archive"));
        record.fill_missing(
            &Uri::new("https://example.org/feed"),
            &Uri::new("https://example.org/catalog"),
            &publisher,
        );

        assert_eq!(record.feed.as_str(), Some("https://example.org/feed"));
        assert_eq!(record.catalog.as_str(), Some("https://example.org/own-catalog"));
        assert_eq!(record.publisher, publisher);
    }

    #[test]
    fn test_element_count_includes_inline() {
        let mut feed = FeedRecord::default();
        feed.elements.push_str("https://example.org/e/1");
        feed.inline_elements.push(ElementRecord::default());
        assert_eq!(feed.element_count(), 2);
    }
}
