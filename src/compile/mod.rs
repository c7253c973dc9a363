//! Merging per-element output files into one artifact per target.
//!
//! The harvester writes `<page>-<element>.<ext>` files into one directory per
//! target. After the crawl, [`compile_target`] merges each directory into
//! its compiled artifact and removes it:
//!
//! - link lists and tables are concatenated line by line ([`merge_lines`])
//! - graphs are parsed and re-serialized as one de-duplicated graph
//!   ([`GraphMerger`]), streaming once the file count reaches the threshold
//!
//! Files are always processed in numeric `(page, element)` order, so
//! `2-10` comes after `2-9`.

mod graph;
mod lines;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::mapper::{GraphFormat, MergeKind, OutputTarget, TABLE_HEADER};

pub use graph::{
    DEFAULT_STREAMING_THRESHOLD, GraphMerger, InMemoryMerger, StreamingMerger, merge_graphs,
    select_merger,
};
pub use lines::{COMMENT_MARKER, LineMergeOptions, merge_lines};

/// Errors that can occur while compiling outputs.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Reading, writing or removing a file failed.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The file or directory involved
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A per-element graph file does not parse.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// The offending file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// The merged graph could not be written.
    #[error("failed to serialize {path}: {message}")]
    Serialize {
        /// The compiled artifact
        path: PathBuf,
        /// Serializer message
        message: String,
    },
}

impl CompileError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Creates a serialization error.
    pub fn serialize(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Serialize {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// What one compile produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileSummary {
    pub target: OutputTarget,
    /// Per-element files merged.
    pub files: usize,
    pub output: PathBuf,
}

/// Compiles the per-element files of `target` under `run_dir`.
///
/// Returns `None` when the target is not compiled or nothing was written
/// for it.
///
/// # Errors
///
/// Returns [`CompileError`] when a file cannot be read, parsed or written.
/// The source directory is kept on error.
#[instrument(skip(run_dir), fields(run_dir = %run_dir.display()))]
pub fn compile_target(
    run_dir: &Path,
    target: OutputTarget,
    format: GraphFormat,
    streaming_threshold: usize,
) -> Result<Option<CompileSummary>, CompileError> {
    let (Some(kind), Some(name)) = (target.merge(), target.compiled_name(format)) else {
        return Ok(None);
    };
    let source_dir = run_dir.join(target.dir_name());
    if !source_dir.is_dir() {
        return Ok(None);
    }
    if ordered_files(&source_dir)?.is_empty() {
        debug!(%target, "nothing written, skipping compile");
        remove_source(&source_dir)?;
        return Ok(None);
    }
    let output = run_dir.join(name);

    let files = match kind {
        MergeKind::Lines => {
            let options = if target == OutputTarget::Csv {
                LineMergeOptions {
                    preamble: Some(TABLE_HEADER.to_string()),
                    blank_separator: false,
                    ..LineMergeOptions::default()
                }
            } else {
                LineMergeOptions::default()
            };
            merge_lines(&source_dir, &output, &options)?
        }
        MergeKind::Graph => merge_graphs(&source_dir, &output, format, streaming_threshold)?,
    };

    info!(%target, files, output = %output.display(), "compiled output");
    Ok(Some(CompileSummary {
        target,
        files,
        output,
    }))
}

/// Per-element files of `dir` in `(page, element)` order. Files whose stem
/// is not `<page>-<element>` are ignored.
///
/// # Errors
///
/// Returns [`CompileError::Io`] when the directory cannot be listed.
pub fn ordered_files(dir: &Path) -> Result<Vec<PathBuf>, CompileError> {
    let entries = std::fs::read_dir(dir).map_err(|e| CompileError::io(dir, e))?;
    let mut keyed = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CompileError::io(dir, e))?.path();
        if !path.is_file() {
            continue;
        }
        match position(&path) {
            Some(key) => keyed.push((key, path)),
            None => warn!(path = %path.display(), "ignoring unexpected file"),
        }
    }
    keyed.sort_by_key(|(key, _)| *key);
    Ok(keyed.into_iter().map(|(_, path)| path).collect())
}

fn position(path: &Path) -> Option<(u64, u64)> {
    let stem = path.file_stem()?.to_str()?;
    let (page, element) = stem.split_once('-')?;
    Some((page.parse().ok()?, element.parse().ok()?))
}

/// Removes a merged source directory.
fn remove_source(dir: &Path) -> Result<(), CompileError> {
    std::fs::remove_dir_all(dir).map_err(|e| CompileError::io(dir, e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ordered_files_numeric_order() {
        let dir = TempDir::new().unwrap();
        for name in ["2-10.txt", "1-2.txt", "2-9.txt", "10-1.txt", "notes.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        let names: Vec<_> = ordered_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["1-2.txt", "2-9.txt", "2-10.txt", "10-1.txt"]);
    }

    #[test]
    fn test_compile_target_skips_missing_dir() {
        let dir = TempDir::new().unwrap();
        let summary =
            compile_target(dir.path(), OutputTarget::Beacon, GraphFormat::Turtle, 10).unwrap();
        assert!(summary.is_none());
    }

    #[test]
    fn test_compile_target_files_is_not_compiled() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("files")).unwrap();
        let summary =
            compile_target(dir.path(), OutputTarget::Files, GraphFormat::Turtle, 10).unwrap();
        assert!(summary.is_none());
        assert!(dir.path().join("files").is_dir());
    }

    #[test]
    fn test_compile_target_empty_dir_writes_nothing() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("triples")).unwrap();
        let summary =
            compile_target(dir.path(), OutputTarget::Triples, GraphFormat::Turtle, 10).unwrap();
        assert!(summary.is_none());
        assert!(!dir.path().join("triples.ttl").exists());
        assert!(!dir.path().join("triples").exists());
    }

    #[test]
    fn test_compile_csv_prepends_header() {
        let dir = TempDir::new().unwrap();
        let csv_dir = dir.path().join("csv");
        std::fs::create_dir(&csv_dir).unwrap();
        std::fs::write(csv_dir.join("1-1.csv"), "\"a\"\n").unwrap();
        std::fs::write(csv_dir.join("1-2.csv"), "\"b\"\n").unwrap();

        let summary = compile_target(dir.path(), OutputTarget::Csv, GraphFormat::Turtle, 10)
            .unwrap()
            .unwrap();
        assert_eq!(summary.files, 2);
        let table = std::fs::read_to_string(dir.path().join("table.csv")).unwrap();
        assert_eq!(table, format!("{TABLE_HEADER}\"a\"\n\"b\"\n"));
        assert!(!csv_dir.exists());
    }
}
