//! Run configuration and TOML run profiles.
//!
//! A [`RunConfig`] is everything one harvest needs. The CLI builds it from
//! an optional [`HarvestProfile`] file and its own flags, flags winning.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::HarvestError;
use super::rewrite::ElementRewrite;
use crate::compile::DEFAULT_STREAMING_THRESHOLD;
use crate::extract::Dialect;
use crate::fetch::Credentials;
use crate::mapper::{GraphFormat, OutputTarget};

/// Hard ceiling on feed pages per run.
pub const DEFAULT_MAX_PAGINATION: usize = 10_000;

/// Parent directory of all run directories.
pub const DEFAULT_OUTPUT_ROOT: &str = "downloads";

/// Everything one harvest run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// URL or path of the first feed page.
    pub start_location: String,
    pub feed_dialect: Dialect,
    pub element_dialect: Dialect,
    pub outputs: Vec<OutputTarget>,
    pub graph_format: GraphFormat,
    pub output_root: PathBuf,
    /// Run directory name; a timestamp when unset.
    pub run_name: Option<String>,
    /// Sent as `Accept` and used when a response does not reveal its format.
    pub content_type: Option<String>,
    pub rewrite: ElementRewrite,
    pub feed_override: Option<String>,
    pub catalog_override: Option<String>,
    pub publisher_override: Option<String>,
    /// Hides the progress spinner.
    pub quiet: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_pagination: usize,
    /// Fixed politeness delay; skips the robots.txt lookup.
    pub delay_override: Option<Duration>,
    /// File count at which graph outputs are merged by streaming.
    pub streaming_threshold: usize,
}

impl RunConfig {
    /// A configuration with defaults for everything but the start location.
    #[must_use]
    pub fn new(start_location: impl Into<String>) -> Self {
        Self {
            start_location: start_location.into(),
            feed_dialect: Dialect::Schema,
            element_dialect: Dialect::Schema,
            outputs: vec![OutputTarget::Triples],
            graph_format: GraphFormat::default(),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            run_name: None,
            content_type: None,
            rewrite: ElementRewrite::default(),
            feed_override: None,
            catalog_override: None,
            publisher_override: None,
            quiet: false,
            username: None,
            password: None,
            max_pagination: DEFAULT_MAX_PAGINATION,
            delay_override: None,
            streaming_threshold: DEFAULT_STREAMING_THRESHOLD,
        }
    }

    /// Builds a configuration from a profile, using defaults for what the
    /// profile leaves out.
    #[must_use]
    pub fn from_profile(profile: HarvestProfile) -> Self {
        let mut config = Self::new(profile.start_location.unwrap_or_default());
        if let Some(dialect) = profile.feed_dialect {
            config.feed_dialect = dialect;
            if dialect.reads_elements() {
                config.element_dialect = dialect;
            }
        }
        if let Some(dialect) = profile.element_dialect {
            config.element_dialect = dialect;
        }
        if let Some(outputs) = profile.outputs {
            config.outputs = outputs;
        }
        if let Some(format) = profile.graph_format {
            config.graph_format = format;
        }
        if let Some(root) = profile.output_root {
            config.output_root = root;
        }
        config.run_name = profile.run_name;
        config.content_type = profile.content_type;
        config.rewrite = ElementRewrite {
            filter: profile.filter,
            replace: profile.replace,
            append: profile.append,
        };
        config.feed_override = profile.feed;
        config.catalog_override = profile.catalog;
        config.publisher_override = profile.publisher;
        config.quiet = profile.quiet.unwrap_or(false);
        config.username = profile.username;
        config.password = profile.password;
        if let Some(max) = profile.max_pagination {
            config.max_pagination = max;
        }
        config.delay_override = profile.delay_ms.map(Duration::from_millis);
        if let Some(threshold) = profile.streaming_threshold {
            config.streaming_threshold = threshold;
        }
        config
    }

    /// Checks the invariants a run relies on.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.start_location.trim().is_empty() {
            return Err(HarvestError::config(
                "Missing start location. Pass a feed URL or path",
            ));
        }
        if self.outputs.is_empty() {
            return Err(HarvestError::config(
                "No outputs requested. Expected at least one of files, triples, beacon, csv, cto",
            ));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(HarvestError::config(
                "Basic authentication needs both a username and a password",
            ));
        }
        if self.max_pagination == 0 {
            return Err(HarvestError::config(
                "Invalid config value for `max_pagination`: 0. Expected at least 1",
            ));
        }
        if self.streaming_threshold == 0 {
            return Err(HarvestError::config(
                "Invalid config value for `streaming_threshold`: 0. Expected at least 1",
            ));
        }
        if let Some(name) = &self.run_name
            && (name.is_empty() || name.contains(['/', '\\']) || name == "." || name == "..")
        {
            return Err(HarvestError::config(format!(
                "Invalid run name `{name}`. Expected a plain directory name"
            )));
        }
        Ok(())
    }

    /// Basic-Auth credentials, when both parts are configured.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }

    /// The configured run name, or one derived from `started`.
    #[must_use]
    pub fn run_name_or(&self, started: DateTime<Utc>) -> String {
        self.run_name
            .clone()
            .unwrap_or_else(|| started.format("%Y%m%d-%H%M%S").to_string())
    }
}

/// Defaults read from a `--profile` TOML file. Every field is optional.
///
/// ```toml
/// start_location = "https://example.org/feed"
/// feed_dialect = "schema"
/// outputs = ["cto", "beacon"]
/// graph_format = "turtle"
/// replace = ["http://", "https://"]
/// delay_ms = 1000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarvestProfile {
    pub start_location: Option<String>,
    /// Also the element dialect unless that is set separately.
    pub feed_dialect: Option<Dialect>,
    pub element_dialect: Option<Dialect>,
    pub outputs: Option<Vec<OutputTarget>>,
    pub graph_format: Option<GraphFormat>,
    pub output_root: Option<PathBuf>,
    pub run_name: Option<String>,
    pub content_type: Option<String>,
    pub filter: Option<String>,
    pub replace: Option<(String, String)>,
    pub append: Option<String>,
    pub feed: Option<String>,
    pub catalog: Option<String>,
    pub publisher: Option<String>,
    pub quiet: Option<bool>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_pagination: Option<usize>,
    pub delay_ms: Option<u64>,
    pub streaming_threshold: Option<usize>,
}

impl HarvestProfile {
    /// Reads and parses a profile file.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Io`] when the file cannot be read and
    /// [`HarvestError::Config`] when it is not a valid profile.
    pub fn load(path: &Path) -> Result<Self, HarvestError> {
        let raw = std::fs::read_to_string(path).map_err(|e| HarvestError::io(path, e))?;
        Self::parse(&raw).map_err(|e| {
            HarvestError::config(format!("Invalid profile {}: {e}", path.display()))
        })
    }

    /// Parses profile text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for malformed or unknown keys.
    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== Validation Tests ====================

    #[test]
    fn test_defaults_validate() {
        let config = RunConfig::new("https://example.org/feed");
        assert!(config.validate().is_ok());
        assert_eq!(config.max_pagination, 10_000);
        assert_eq!(config.streaming_threshold, 15_000);
        assert_eq!(config.output_root, PathBuf::from("downloads"));
    }

    #[test]
    fn test_empty_start_location_rejected() {
        let config = RunConfig::new("  ");
        assert!(matches!(config.validate(), Err(HarvestError::Config { .. })));
    }

    #[test]
    fn test_no_outputs_rejected() {
        let mut config = RunConfig::new("https://example.org/feed");
        config.outputs.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_both_or_neither() {
        let mut config = RunConfig::new("https://example.org/feed");
        config.username = Some("harvest".to_string());
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("username and a password"));

        config.password = Some("secret".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(config.credentials().unwrap().username, "harvest");
    }

    #[test]
    fn test_zero_pagination_rejected() {
        let mut config = RunConfig::new("https://example.org/feed");
        config.max_pagination = 0;
        assert!(config.validate().unwrap_err().to_string().contains("max_pagination"));
    }

    #[test]
    fn test_run_name_must_be_plain() {
        let mut config = RunConfig::new("https://example.org/feed");
        config.run_name = Some("../escape".to_string());
        assert!(config.validate().is_err());
        config.run_name = Some("letters-2024".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_run_name_defaults_to_timestamp() {
        use chrono::TimeZone;
        let started = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        let config = RunConfig::new("https://example.org/feed");
        assert_eq!(config.run_name_or(started), "20240301-090507");
    }

    // ==================== Profile Tests ====================

    #[test]
    fn test_profile_parse_and_apply() {
        let profile = HarvestProfile::parse(
            r#"
start_location = "https://example.org/cmif.xml"
feed_dialect = "cmif"
outputs = ["cto", "beacon"]
graph_format = "n_triples"
replace = ["http://", "https://"]
delay_ms = 250
"#,
        )
        .unwrap();

        let config = RunConfig::from_profile(profile);
        assert_eq!(config.start_location, "https://example.org/cmif.xml");
        assert_eq!(config.feed_dialect, Dialect::Cmif);
        assert_eq!(config.element_dialect, Dialect::Cmif);
        assert_eq!(config.outputs, vec![OutputTarget::Cto, OutputTarget::Beacon]);
        assert_eq!(config.graph_format, GraphFormat::NTriples);
        assert_eq!(
            config.rewrite.replace,
            Some(("http://".to_string(), "https://".to_string()))
        );
        assert_eq!(config.delay_override, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_profile_unknown_key_rejected() {
        assert!(HarvestProfile::parse("concurrency = 4").is_err());
    }

    #[test]
    fn test_profile_load_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("profile.toml");
        std::fs::write(&path, "outputs = \"cto\"").unwrap();
        let error = HarvestProfile::load(&path).unwrap_err();
        assert!(error.to_string().contains("profile.toml"));
    }
}
