//! Helpers shared by the integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use std::path::{Path, PathBuf};
use std::time::Duration;

use harvester_core::harvest::RunConfig;

/// A run configuration for tests: quiet, no robots lookup, rooted in `root`.
#[must_use]
pub fn test_config(root: &Path, start: impl Into<String>) -> RunConfig {
    let mut config = RunConfig::new(start);
    config.output_root = root.to_path_buf();
    config.quiet = true;
    config.delay_override = Some(Duration::ZERO);
    config
}

/// File names in `dir`, sorted.
#[must_use]
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Writes `content` to `dir/name` and returns the path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("failed to write fixture");
    path
}
