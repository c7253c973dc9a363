//! BEACON link list output.
//!
//! Each element contributes one `authority||element` line per entity URI it
//! references, so the compiled list says which elements mention which
//! authority record. The feed header is emitted once.

use std::fmt::Write as _;

use super::{MapperOptions, MappingError, OutputMapper, OutputTarget};
use crate::model::{Canonical, ElementRecord, FeedRecord, UriLabelList};

#[derive(Debug, Clone, Copy, Default)]
pub struct BeaconMapper;

impl OutputMapper for BeaconMapper {
    fn target(&self) -> OutputTarget {
        OutputTarget::Beacon
    }

    fn extension(&self, _options: &MapperOptions) -> &'static str {
        "txt"
    }

    fn generate(
        &self,
        record: &ElementRecord,
        _options: &MapperOptions,
    ) -> Result<Vec<u8>, MappingError> {
        let element = record
            .uri
            .as_str()
            .ok_or_else(|| MappingError::missing_uri(OutputTarget::Beacon, &record.source))?;

        let mut authorities: Vec<&str> = Vec::new();
        let lists: [&UriLabelList; 4] = [
            &record.creators,
            &record.persons,
            &record.subjects,
            &record.locations,
        ];
        for entry in lists.into_iter().flat_map(UriLabelList::iter) {
            if let Some(uri) = entry.uri.as_str() {
                if !authorities.contains(&uri) {
                    authorities.push(uri);
                }
            }
        }
        for uri in record.same_as.iter().filter_map(|u| u.as_str()) {
            if !authorities.contains(&uri) {
                authorities.push(uri);
            }
        }

        let mut out = String::new();
        for authority in authorities {
            // Writing to a String cannot fail
            let _ = writeln!(out, "{authority}||{element}");
        }
        Ok(out.into_bytes())
    }

    fn header(
        &self,
        feed: &FeedRecord,
        options: &MapperOptions,
    ) -> Result<Option<Vec<u8>>, MappingError> {
        let mut out = String::from("#FORMAT: BEACON\n");
        if let Some(uri) = feed.feed_uri.as_str() {
            let _ = writeln!(out, "#FEED: {uri}");
        }
        let _ = writeln!(
            out,
            "#TIMESTAMP: {}",
            options.timestamp.format("%Y-%m-%dT%H:%M:%SZ")
        );
        out.push_str("#TARGET: {ID}\n");
        if let Some(name) = feed.title.first().and_then(|label| label.text()) {
            let _ = writeln!(out, "#NAME: {name}");
        }
        if feed.publisher.has_content() {
            let institution = feed
                .publisher
                .uri
                .as_str()
                .map_or_else(|| feed.publisher.to_text(), str::to_string);
            let _ = writeln!(out, "#INSTITUTION: {institution}");
        }
        Ok(Some(out.into_bytes()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Label, Uri, UriLabel};
    use chrono::TimeZone;

    fn options() -> MapperOptions {
        MapperOptions {
            timestamp: chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            ..MapperOptions::default()
        }
    }

    #[test]
    fn test_lines_per_authority() {
        let mut record = ElementRecord::new(Uri::new("https://example.org/letter/1"));
        record
            .creators
            .push(UriLabel::from_uri(Uri::new("https://d-nb.info/gnd/118540238")));
        record
            .persons
            .push(UriLabel::from_uri(Uri::new("https://d-nb.info/gnd/118540238")));
        record
            .locations
            .push(UriLabel::from_uri(Uri::new("https://sws.geonames.org/2950159")));
        record.subjects.push(UriLabel::from_label(Label::new("Poetry")));

        let text = String::from_utf8(BeaconMapper.generate(&record, &options()).unwrap()).unwrap();
        assert_eq!(
            text,
            "https://d-nb.info/gnd/118540238||https://example.org/letter/1\n\
             https://sws.geonames.org/2950159||https://example.org/letter/1\n"
        );
    }

    #[test]
    fn test_missing_uri_is_an_error() {
        let record = ElementRecord::default();
        assert!(matches!(
            BeaconMapper.generate(&record, &options()),
            Err(MappingError::MissingUri { .. })
        ));
    }

    #[test]
    fn test_header() {
        let mut feed = FeedRecord {
            feed_uri: Uri::new("https://example.org/feed"),
            publisher: UriLabel::from_label(Label::new("Example Archive")),
            ..FeedRecord::default()
        };
        feed.title.push(Label::new("Letters"));

        let header = BeaconMapper.header(&feed, &options()).unwrap().unwrap();
        let text = String::from_utf8(header).unwrap();
        assert_eq!(
            text,
            "#FORMAT: BEACON\n\
             #FEED: https://example.org/feed\n\
             #TIMESTAMP: 2024-03-01T12:00:00Z\n\
             #TARGET: {ID}\n\
             #NAME: Letters\n\
             #INSTITUTION: Example Archive\n"
        );
    }
}
