//! BEACON link lists.
//!
//! A BEACON file is a list of `source|annotation|target` lines preceded by
//! `#KEY: value` meta lines. The targets are the elements; `#TARGET` builds
//! them from the source id when a line has no explicit target.

use tracing::debug;

use super::{Dialect, ExtractionError, FormatExtractor};
use crate::fetch::Resource;
use crate::model::{Canonical, Date, ElementRecord, FeedRecord, Label, Uri, UriLabel};

/// Placeholder for the source id in `#TARGET` and `#PREFIX` templates.
const ID_PLACEHOLDER: &str = "{ID}";

/// Extractor for BEACON feeds. Elements are always fetched separately.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeaconExtractor;

/// Meta lines read from the header.
#[derive(Debug, Default)]
struct BeaconMeta {
    prefix: Option<String>,
    target: Option<String>,
    feed: Option<String>,
    timestamp: Option<String>,
    name: Option<String>,
    institution: Option<String>,
}

impl BeaconMeta {
    fn set(&mut self, key: &str, value: &str) {
        let value = Some(value.to_string());
        match key.to_ascii_uppercase().as_str() {
            "PREFIX" => self.prefix = value,
            "TARGET" => self.target = value,
            "FEED" => self.feed = value,
            "TIMESTAMP" | "UPDATE" => self.timestamp = value,
            "NAME" | "DESCRIPTION" if self.name.is_none() => self.name = value,
            "INSTITUTION" => self.institution = value,
            _ => {}
        }
    }
}

impl FormatExtractor for BeaconExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::Beacon
    }

    fn extract_feed(&self, resource: &Resource) -> Result<FeedRecord, ExtractionError> {
        if resource.text.trim().is_empty() {
            return Err(ExtractionError::missing_document(&resource.location, "text"));
        }

        let mut meta = BeaconMeta::default();
        let mut links: Vec<(String, Option<String>)> = Vec::new();
        let mut saw_format = false;

        for line in resource.text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(meta_line) = line.strip_prefix('#') {
                if let Some((key, value)) = meta_line.split_once(':') {
                    let key = key.trim();
                    saw_format |= key.eq_ignore_ascii_case("FORMAT");
                    meta.set(key, value.trim());
                }
                continue;
            }
            if let Some(link) = parse_link(line) {
                links.push(link);
            }
        }

        if !saw_format && links.is_empty() {
            return Err(ExtractionError::missing_structure(
                &resource.location,
                "neither a #FORMAT line nor any link line",
            ));
        }

        let mut record = FeedRecord {
            feed_uri: Uri::from_option(meta.feed.as_deref()),
            modified: meta.timestamp.as_deref().map_or_else(Date::default, Date::parse),
            ..FeedRecord::default()
        };
        if !record.feed_uri.has_content() {
            record.feed_uri = Uri::new(&resource.location);
        }
        if let Some(name) = &meta.name {
            record.title.push(Label::new(name));
        }
        if let Some(institution) = &meta.institution {
            let uri = Uri::new(institution);
            record.publisher = if uri.has_content() {
                UriLabel::from_uri(uri)
            } else {
                UriLabel::from_label(Label::new(institution))
            };
        }

        let mut skipped = 0usize;
        for (source, target) in &links {
            let uri = element_uri(source, target.as_deref(), &meta);
            if !record.elements.push(uri) {
                skipped += 1;
            }
        }
        debug!(
            location = %resource.location,
            elements = record.elements.len(),
            skipped,
            "read beacon feed"
        );
        Ok(record)
    }

    fn extract_element(&self, _resource: &Resource) -> Result<ElementRecord, ExtractionError> {
        Err(ExtractionError::Unsupported {
            dialect: Dialect::Beacon,
            what: "element",
        })
    }
}

/// Splits a link line into source id and explicit target.
///
/// With two tokens the second one is the target when it is a URI and the
/// annotation otherwise.
fn parse_link(line: &str) -> Option<(String, Option<String>)> {
    let mut parts = line.split('|').map(str::trim);
    let source = parts.next().filter(|s| !s.is_empty())?.to_string();
    let second = parts.next().filter(|s| !s.is_empty());
    let third = parts.next().filter(|s| !s.is_empty());
    let target = match (second, third) {
        (_, Some(target)) => Some(target.to_string()),
        (Some(second), None) if Uri::new(second).has_content() => Some(second.to_string()),
        _ => None,
    };
    Some((source, target))
}

fn element_uri(source: &str, target: Option<&str>, meta: &BeaconMeta) -> Uri {
    if let Some(target) = target {
        return Uri::new(target);
    }
    if let Some(template) = &meta.target {
        return Uri::new(&expand(template, source));
    }
    let direct = Uri::new(source);
    if direct.has_content() {
        return direct;
    }
    meta.prefix
        .as_deref()
        .map_or_else(Uri::empty, |prefix| Uri::new(&expand(prefix, source)))
}

/// Substitutes the id into a template; templates without placeholder get
/// the id appended.
fn expand(template: &str, id: &str) -> String {
    if template.contains(ID_PLACEHOLDER) {
        template.replace(ID_PLACEHOLDER, id)
    } else {
        format!("{template}{id}")
    }
}
