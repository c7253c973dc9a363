//! Output mappers: canonical records in, serialized bytes out.
//!
//! Every output target except `files` has an [`OutputMapper`]. A mapper is
//! a pure function of the record and the [`MapperOptions`]; the harvester
//! writes whatever it returns to `<target>/<page>-<element>.<ext>` and the
//! compile step merges those files at the end of the run.
//!
//! # Features
//!
//! - **beacon**: `authority||element` link lines with a feed-level header
//! - **csv**: one quoted row per element under a fixed column header
//! - **cto**: NFDI4Culture ontology triples, relations typed through the
//!   authority classifier
//! - **triples**: schema.org projection of the record
//!
//! # Example
//!
//! ```
//! use harvester_core::mapper::{MapperOptions, OutputTarget, mapper};
//! use harvester_core::model::{ElementRecord, Label, Uri};
//!
//! let mut record = ElementRecord::new(Uri::new("https://example.org/work/1"));
//! record.names.push(Label::new("Symphony No. 1"));
//!
//! let triples = mapper(OutputTarget::Triples).unwrap();
//! let bytes = triples.generate(&record, &MapperOptions::default()).unwrap();
//! assert!(String::from_utf8(bytes).unwrap().contains("Symphony No. 1"));
//! ```

mod beacon;
mod csv;
mod cto;
mod error;
mod graph;
mod triples;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::authority::AuthorityClassifier;
use crate::model::{ElementRecord, FeedRecord};

pub use self::beacon::BeaconMapper;
pub use self::csv::{CsvMapper, TABLE_HEADER};
pub use self::cto::CtoMapper;
pub use self::error::MappingError;
pub use self::graph::GraphFormat;
pub use self::triples::TriplesMapper;

/// Serializes canonical records for one output target.
pub trait OutputMapper: Send + Sync {
    fn target(&self) -> OutputTarget;

    /// Extension of the per-element files, without the dot.
    fn extension(&self, options: &MapperOptions) -> &'static str;

    /// Serializes one element.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when the record lacks what the target needs
    /// or serialization fails.
    fn generate(
        &self,
        record: &ElementRecord,
        options: &MapperOptions,
    ) -> Result<Vec<u8>, MappingError>;

    /// Feed-level output written once, before the first element. Targets
    /// without a header return `None`.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when serialization fails.
    fn header(
        &self,
        _feed: &FeedRecord,
        _options: &MapperOptions,
    ) -> Result<Option<Vec<u8>>, MappingError> {
        Ok(None)
    }
}

/// Where the harvested data ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTarget {
    /// Raw element bytes, as fetched.
    Files,
    Triples,
    Beacon,
    Csv,
    Cto,
}

/// How the per-element files of a target are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    Lines,
    Graph,
}

impl OutputTarget {
    pub const ALL: [Self; 5] = [Self::Files, Self::Triples, Self::Beacon, Self::Csv, Self::Cto];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Triples => "triples",
            Self::Beacon => "beacon",
            Self::Csv => "csv",
            Self::Cto => "cto",
        }
    }

    /// Directory holding the per-element files.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        self.as_str()
    }

    /// Merge applied by the compile step; `None` for targets kept as-is.
    #[must_use]
    pub fn merge(self) -> Option<MergeKind> {
        match self {
            Self::Files => None,
            Self::Beacon | Self::Csv => Some(MergeKind::Lines),
            Self::Triples | Self::Cto => Some(MergeKind::Graph),
        }
    }

    /// File name of the compiled artifact.
    #[must_use]
    pub fn compiled_name(self, format: GraphFormat) -> Option<String> {
        match self {
            Self::Files => None,
            Self::Beacon => Some("beacon.txt".to_string()),
            Self::Csv => Some("table.csv".to_string()),
            Self::Triples | Self::Cto => Some(format!("{}.{}", self.as_str(), format.extension())),
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutputTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "files" => Ok(Self::Files),
            "triples" => Ok(Self::Triples),
            "beacon" => Ok(Self::Beacon),
            "csv" => Ok(Self::Csv),
            "cto" => Ok(Self::Cto),
            _ => Err(format!("invalid output target: {s}")),
        }
    }
}

/// Settings shared by all mappers of a run.
#[derive(Debug, Clone)]
pub struct MapperOptions {
    pub graph_format: GraphFormat,
    /// Run start, written into headers.
    pub timestamp: DateTime<Utc>,
    /// Types entity relations; without it mappers fall back to the field
    /// an entity was read from.
    pub classifier: Option<Arc<AuthorityClassifier>>,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            graph_format: GraphFormat::default(),
            timestamp: Utc::now(),
            classifier: None,
        }
    }
}

/// The mapper for `target`, or `None` for [`OutputTarget::Files`].
#[must_use]
pub fn mapper(target: OutputTarget) -> Option<Box<dyn OutputMapper>> {
    match target {
        OutputTarget::Files => None,
        OutputTarget::Triples => Some(Box::new(TriplesMapper)),
        OutputTarget::Beacon => Some(Box::new(BeaconMapper)),
        OutputTarget::Csv => Some(Box::new(CsvMapper)),
        OutputTarget::Cto => Some(Box::new(CtoMapper)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_str() {
        assert_eq!("CTO".parse::<OutputTarget>(), Ok(OutputTarget::Cto));
        assert_eq!(" files ".parse::<OutputTarget>(), Ok(OutputTarget::Files));
        assert!("lido".parse::<OutputTarget>().is_err());
    }

    #[test]
    fn test_compiled_names() {
        let format = GraphFormat::NTriples;
        assert_eq!(OutputTarget::Beacon.compiled_name(format).unwrap(), "beacon.txt");
        assert_eq!(OutputTarget::Csv.compiled_name(format).unwrap(), "table.csv");
        assert_eq!(OutputTarget::Cto.compiled_name(format).unwrap(), "cto.nt");
        assert_eq!(OutputTarget::Triples.compiled_name(format).unwrap(), "triples.nt");
        assert!(OutputTarget::Files.compiled_name(format).is_none());
    }

    #[test]
    fn test_every_target_but_files_has_a_mapper() {
        for target in OutputTarget::ALL {
            match mapper(target) {
                Some(m) => assert_eq!(m.target(), target),
                None => assert_eq!(target, OutputTarget::Files),
            }
        }
    }

    #[test]
    fn test_merge_kind() {
        assert_eq!(OutputTarget::Beacon.merge(), Some(MergeKind::Lines));
        assert_eq!(OutputTarget::Cto.merge(), Some(MergeKind::Graph));
        assert_eq!(OutputTarget::Files.merge(), None);
    }
}
