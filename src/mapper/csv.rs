//! CSV table output: one fully quoted row per element.
//!
//! Rows carry no header; the compile step prepends [`TABLE_HEADER`] once.

use ::csv::{QuoteStyle, Terminator, WriterBuilder};

use super::{MapperOptions, MappingError, OutputMapper, OutputTarget};
use crate::model::{Canonical, ElementRecord, UriLabel, UriLabelList};

/// Column header of the compiled table.
pub const TABLE_HEADER: &str = "\"uri\",\"type\",\"name\",\"description\",\"date\",\"creators\",\"persons\",\"subjects\",\"locations\",\"same_as\",\"feed\",\"catalog\",\"publisher\"\n";

/// Separator between values of a multi-valued cell.
const VALUE_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvMapper;

impl OutputMapper for CsvMapper {
    fn target(&self) -> OutputTarget {
        OutputTarget::Csv
    }

    fn extension(&self, _options: &MapperOptions) -> &'static str {
        "csv"
    }

    fn generate(
        &self,
        record: &ElementRecord,
        _options: &MapperOptions,
    ) -> Result<Vec<u8>, MappingError> {
        if !record.uri.has_content() {
            return Err(MappingError::missing_uri(OutputTarget::Csv, &record.source));
        }

        let row = [
            record.uri.to_text(),
            entity_text(&record.element_type),
            record.names.first().map(Canonical::to_text).unwrap_or_default(),
            record.descriptions.first().map(Canonical::to_text).unwrap_or_default(),
            record.dates.first().map(Canonical::to_text).unwrap_or_default(),
            entities_text(&record.creators),
            entities_text(&record.persons),
            entities_text(&record.subjects),
            entities_text(&record.locations),
            record
                .same_as
                .iter()
                .map(Canonical::to_text)
                .collect::<Vec<_>>()
                .join(VALUE_SEPARATOR),
            record.feed.to_text(),
            record.catalog.to_text(),
            entity_text(&record.publisher),
        ];

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(&row)?;
        writer
            .into_inner()
            .map_err(|e| MappingError::serialize(OutputTarget::Csv, e.error()))
    }
}

/// URI when known, else the first label.
fn entity_text(entity: &UriLabel) -> String {
    entity
        .uri
        .as_str()
        .map_or_else(|| entity.to_text(), str::to_string)
}

fn entities_text(entities: &UriLabelList) -> String {
    entities
        .iter()
        .map(entity_text)
        .collect::<Vec<_>>()
        .join(VALUE_SEPARATOR)
}
