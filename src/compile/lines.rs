//! Line-oriented merge for link lists and tables.

use std::fmt::Write as _;
use std::path::Path;

use tracing::debug;

use super::{CompileError, ordered_files, remove_source};

/// Lines starting with this are headers; only the first file keeps them.
pub const COMMENT_MARKER: &str = "#";

#[derive(Debug, Clone)]
pub struct LineMergeOptions {
    pub comment_marker: String,
    /// Written before the first file.
    pub preamble: Option<String>,
    /// Put one blank line between consecutive files.
    pub blank_separator: bool,
}

impl Default for LineMergeOptions {
    fn default() -> Self {
        Self {
            comment_marker: COMMENT_MARKER.to_string(),
            preamble: None,
            blank_separator: true,
        }
    }
}

/// Concatenates the files of `source_dir` into `destination` and removes
/// `source_dir`. Returns the number of files merged.
///
/// # Errors
///
/// Returns [`CompileError::Io`] when a file cannot be read or written.
pub fn merge_lines(
    source_dir: &Path,
    destination: &Path,
    options: &LineMergeOptions,
) -> Result<usize, CompileError> {
    let files = ordered_files(source_dir)?;
    let mut out = options.preamble.clone().unwrap_or_default();

    for (index, path) in files.iter().enumerate() {
        let content = std::fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
        if index > 0 && options.blank_separator {
            out.push('\n');
        }
        for line in content.lines() {
            if index > 0 && line.starts_with(&options.comment_marker) {
                continue;
            }
            // Writing to a String cannot fail
            let _ = writeln!(out, "{line}");
        }
    }

    std::fs::write(destination, out).map_err(|e| CompileError::io(destination, e))?;
    debug!(files = files.len(), destination = %destination.display(), "merged lines");
    remove_source(source_dir)?;
    Ok(files.len())
}
