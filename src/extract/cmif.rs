//! CMIF: TEI-XML correspondence metadata.
//!
//! A CMIF file describes many letters in one document, so a feed page
//! carries all of its elements inline; each `correspDesc` becomes one
//! element record. There is no pagination.

use std::sync::LazyLock;

use tracing::debug;

use super::{Dialect, ExtractionError, FormatExtractor};
use crate::fetch::Resource;
use crate::model::namespaces::{SCHEMA, TEI};
use crate::model::{
    Canonical, Date, DateList, ElementRecord, FeedRecord, Label, LabelList, Uri, UriLabel,
    UriLabelList,
};
use crate::query::{NodeId, PathContext, XmlPath, XmlTree};

/// Compiled paths shared by every CMIF extraction.
struct CmifPaths {
    title: XmlPath,
    feed_id: XmlPath,
    modified: XmlPath,
    publisher: XmlPath,
    catalog: XmlPath,
    letters: XmlPath,
    sent: XmlPath,
    received: XmlPath,
    persons: XmlPath,
    organizations: XmlPath,
    places: XmlPath,
    date: XmlPath,
    note: XmlPath,
    reference: XmlPath,
    ref_target: XmlPath,
    this: XmlPath,
}

#[allow(clippy::expect_used)]
static PATHS: LazyLock<CmifPaths> = LazyLock::new(|| {
    let ctx = PathContext::new()
        .with_namespace("tei", TEI)
        .with_placeholder("header", "/tei:TEI/tei:teiHeader/tei:fileDesc");
    let compile = |raw: &str| ctx.compile(raw).expect("CMIF path is valid"); // Static pattern, safe to panic
    CmifPaths {
        title: compile("{header}/tei:titleStmt/tei:title"),
        feed_id: compile("{header}/tei:publicationStmt/tei:idno"),
        modified: compile("{header}/tei:publicationStmt/tei:date/@when"),
        publisher: compile("{header}/tei:publicationStmt/tei:publisher"),
        catalog: compile("{header}/tei:sourceDesc/tei:bibl/tei:ref/@target"),
        letters: compile("//tei:profileDesc/tei:correspDesc"),
        sent: compile("tei:correspAction[@type='sent']"),
        received: compile("tei:correspAction[@type='received']"),
        persons: compile("tei:persName"),
        organizations: compile("tei:orgName"),
        places: compile("tei:placeName"),
        date: compile("tei:date"),
        note: compile(".//tei:note"),
        reference: compile("@ref"),
        ref_target: compile(".//tei:ref/@target"),
        this: compile("."),
    }
});

/// Extractor for CMIF letter lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct CmifExtractor;

impl FormatExtractor for CmifExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::Cmif
    }

    fn extract_feed(&self, resource: &Resource) -> Result<FeedRecord, ExtractionError> {
        let tree = tei_tree(resource)?;
        let paths = &*PATHS;

        let mut record = FeedRecord {
            feed_uri: Uri::from_option(tree.first_text(None, &paths.feed_id, false).text()),
            title: tree.all_texts(None, &paths.title, true),
            modified: tree
                .first_text(None, &paths.modified, false)
                .text()
                .map_or_else(Date::default, Date::parse),
            catalog: Uri::from_option(tree.first_text(None, &paths.catalog, false).text()),
            ..FeedRecord::default()
        };
        if !record.feed_uri.has_content() {
            record.feed_uri = Uri::new(&resource.location);
        }
        if let Some(publisher) = tree.first_element(None, &paths.publisher) {
            record.publisher = tree
                .uri_and_label(&[publisher], &paths.ref_target, &paths.this, false)
                .into_iter()
                .next()
                .unwrap_or_default();
        }

        let mut without_uri = 0usize;
        for letter in tree.all_elements(None, &paths.letters) {
            let element = read_letter(tree, letter, &resource.location);
            if element.uri.has_content() {
                record.inline_elements.push(element);
            } else {
                without_uri += 1;
            }
        }

        debug!(
            location = %resource.location,
            letters = record.inline_elements.len(),
            without_uri,
            "read CMIF feed"
        );
        Ok(record)
    }

    fn extract_element(&self, resource: &Resource) -> Result<ElementRecord, ExtractionError> {
        let tree = tei_tree(resource)?;
        let letter = tree.first_element(None, &PATHS.letters).ok_or_else(|| {
            ExtractionError::missing_structure(&resource.location, "no tei:correspDesc")
        })?;
        let mut element = read_letter(tree, letter, &resource.location);
        if !element.uri.has_content() {
            element.uri = Uri::new(&resource.location);
        }
        Ok(element)
    }
}

/// The XML tree of a TEI document.
fn tei_tree(resource: &Resource) -> Result<&XmlTree, ExtractionError> {
    let tree = resource
        .xml()
        .ok_or_else(|| ExtractionError::missing_document(&resource.location, "XML tree"))?;
    let is_tei = tree
        .element(tree.root())
        .is_some_and(|root| root.local_name() == "TEI" && root.namespace() == Some(TEI));
    if !is_tei {
        return Err(ExtractionError::missing_structure(
            &resource.location,
            "root element is not tei:TEI",
        ));
    }
    Ok(tree)
}

fn read_letter(tree: &XmlTree, letter: NodeId, location: &str) -> ElementRecord {
    let paths = &*PATHS;
    let uri = Uri::from_option(tree.first_text(Some(letter), &paths.reference, false).text());
    let sent = tree.all_elements(Some(letter), &paths.sent);
    let received = tree.all_elements(Some(letter), &paths.received);

    let mut element = ElementRecord::new(uri);
    element.source = location.to_string();
    element.element_type = UriLabel::new(
        Uri::new(&format!("{SCHEMA}Message")),
        std::iter::once(Label::with_language("Letter", Some("en"))).collect(),
    );
    element.creators = correspondents(tree, &sent);
    element.persons = correspondents(tree, &received);
    element.locations = [&sent, &received]
        .into_iter()
        .flat_map(|actions| {
            let places = tree.all_elements_under(actions, &paths.places);
            tree.uri_and_label(&places, &paths.reference, &paths.this, true)
        })
        .collect();
    element.dates = sent
        .iter()
        .filter_map(|action| tree.first_element(Some(*action), &paths.date))
        .map(|date| letter_date(tree, date))
        .collect::<DateList>();
    element.descriptions = tree.all_texts(Some(letter), &paths.note, true);
    element.names = letter_name(&element.creators, &element.persons);
    element
}

/// Senders or receivers of the given correspondence actions.
fn correspondents(tree: &XmlTree, actions: &[NodeId]) -> UriLabelList {
    let paths = &*PATHS;
    let mut names = tree.all_elements_under(actions, &paths.persons);
    names.extend(tree.all_elements_under(actions, &paths.organizations));
    tree.uri_and_label(&names, &paths.reference, &paths.this, true)
        .into_iter()
        .collect()
}

/// `when`, else a `from`/`to` or `notBefore`/`notAfter` span.
fn letter_date(tree: &XmlTree, date: NodeId) -> Date {
    let Some(element) = tree.element(date) else {
        return Date::Empty;
    };
    let attribute = |name: &str| element.attribute(None, name).map(str::trim);
    if let Some(when) = attribute("when") {
        return Date::parse(when);
    }
    for (start, end) in [("from", "to"), ("notBefore", "notAfter")] {
        match (attribute(start), attribute(end)) {
            (Some(start), Some(end)) => return Date::range(start, end),
            (Some(single), None) | (None, Some(single)) => return Date::parse(single),
            (None, None) => {}
        }
    }
    Date::parse(&tree.text(date))
}

fn letter_name(senders: &UriLabelList, receivers: &UriLabelList) -> LabelList {
    let join = |list: &UriLabelList| {
        list.iter()
            .map(Canonical::to_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let (from, to) = (join(senders), join(receivers));
    let name = match (from.is_empty(), to.is_empty()) {
        (false, false) => format!("Letter from {from} to {to}"),
        (false, true) => format!("Letter from {from}"),
        (true, false) => format!("Letter to {to}"),
        (true, true) => return LabelList::new(),
    };
    std::iter::once(Label::with_language(&name, Some("en"))).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fetch::FileType;

    const CMIF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader>
    <fileDesc>
      <titleStmt><title>Briefe der Familie Example</title></titleStmt>
      <publicationStmt>
        <publisher><ref target="https://ror.org/012345678">Example Archive</ref></publisher>
        <idno type="url">https://example.org/cmif.xml</idno>
        <date when="2023-11-05T09:30:00Z"/>
      </publicationStmt>
      <sourceDesc>
        <bibl type="online">Briefedition <ref target="https://example.org/edition"/></bibl>
      </sourceDesc>
    </fileDesc>
    <profileDesc>
      <correspDesc ref="https://example.org/letter/1">
        <correspAction type="sent">
          <persName ref="http://d-nb.info/gnd/118540238/about/html">Goethe</persName>
          <placeName ref="http://www.geonames.org/2812482">Weimar</placeName>
          <date when="1799-03-14"/>
        </correspAction>
        <correspAction type="received">
          <persName ref="https://d-nb.info/gnd/118607626">Schiller</persName>
          <placeName>Jena</placeName>
        </correspAction>
        <note xml:lang="de">Mit Beilage</note>
      </correspDesc>
      <correspDesc ref="https://example.org/letter/2">
        <correspAction type="sent">
          <orgName>Verlag</orgName>
          <date notBefore="1800-01" notAfter="1800-03"/>
        </correspAction>
      </correspDesc>
      <correspDesc>
        <correspAction type="sent"><persName>Unknown</persName></correspAction>
      </correspDesc>
    </profileDesc>
  </teiHeader>
</TEI>"#;

    fn resource(text: &str) -> Resource {
        let resource = Resource::from_text("https://example.org/cmif.xml", FileType::Xml, text);
        assert!(resource.success, "{}", resource.failure_reason());
        resource
    }

    // ==================== Feed Tests ====================

    #[test]
    fn test_feed_header_fields() {
        let feed = CmifExtractor.extract_feed(&resource(CMIF)).unwrap();
        assert_eq!(feed.feed_uri.as_str(), Some("https://example.org/cmif.xml"));
        assert_eq!(
            feed.title.first().unwrap().text(),
            Some("Briefe der Familie Example")
        );
        assert!(matches!(feed.modified, Date::Instant(_)));
        assert_eq!(feed.publisher.uri.as_str(), Some("https://ror.org/012345678"));
        assert_eq!(feed.publisher.to_text(), "Example Archive");
        assert_eq!(feed.catalog.as_str(), Some("https://example.org/edition"));
        assert!(!feed.next_page.has_content());
    }

    #[test]
    fn test_feed_letters_are_inline() {
        let feed = CmifExtractor.extract_feed(&resource(CMIF)).unwrap();
        assert!(feed.elements.is_empty());
        // The third letter has no ref and is dropped
        assert_eq!(feed.inline_elements.len(), 2);
    }

    #[test]
    fn test_letter_correspondents_and_places() {
        let feed = CmifExtractor.extract_feed(&resource(CMIF)).unwrap();
        let letter = &feed.inline_elements[0];
        assert_eq!(letter.uri.as_str(), Some("https://example.org/letter/1"));

        let sender = letter.creators.iter().next().unwrap();
        assert_eq!(sender.uri.as_str(), Some("https://d-nb.info/gnd/118540238"));
        assert_eq!(sender.to_text(), "Goethe");

        let receiver = letter.persons.iter().next().unwrap();
        assert_eq!(receiver.to_text(), "Schiller");

        assert_eq!(letter.locations.len(), 2);
        let place = letter.locations.iter().next().unwrap();
        assert_eq!(place.uri.as_str(), Some("https://sws.geonames.org/2812482"));

        assert_eq!(
            letter.names.first().unwrap().text(),
            Some("Letter from Goethe to Schiller")
        );
        assert_eq!(letter.descriptions.first().unwrap().language(), Some("de"));
    }

    #[test]
    fn test_letter_dates() {
        let feed = CmifExtractor.extract_feed(&resource(CMIF)).unwrap();
        assert!(matches!(feed.inline_elements[0].dates.first(), Some(Date::Day(_))));
        assert!(matches!(
            feed.inline_elements[1].dates.first(),
            Some(Date::Range { .. })
        ));
        assert_eq!(
            feed.inline_elements[1].names.first().unwrap().text(),
            Some("Letter from Verlag")
        );
    }

    #[test]
    fn test_feed_rejects_non_tei() {
        let result = CmifExtractor.extract_feed(&resource("<rss><channel/></rss>"));
        assert!(matches!(result, Err(ExtractionError::MissingStructure { .. })));
    }

    #[test]
    fn test_feed_requires_xml() {
        let text = Resource::from_text("letters.txt", FileType::Text, "letters");
        assert!(matches!(
            CmifExtractor.extract_feed(&text),
            Err(ExtractionError::MissingDocument { .. })
        ));
    }

    // ==================== Element Tests ====================

    #[test]
    fn test_element_reads_first_letter() {
        let element = CmifExtractor.extract_element(&resource(CMIF)).unwrap();
        assert_eq!(element.uri.as_str(), Some("https://example.org/letter/1"));
        assert_eq!(element.creators.len(), 1);
    }
}
