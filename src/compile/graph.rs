//! Graph merge.
//!
//! Small runs are merged in memory into one `oxrdf::Graph` and written
//! sorted by subject. Large runs stream: every file is parsed and written
//! triple by triple, and duplicates are recognized by a 128-bit SHA-256
//! digest of the triple, so memory grows with the number of distinct
//! triples times 16 bytes instead of with the graph.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use oxrdf::{Graph, Triple};
use oxrdfio::RdfParser;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{CompileError, ordered_files, remove_source};
use crate::mapper::GraphFormat;

/// File count at which the streaming merger takes over.
pub const DEFAULT_STREAMING_THRESHOLD: usize = 15_000;

/// Merges per-element graph files into one serialization.
pub trait GraphMerger {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Writes the union of `files` to `destination`. Returns the number of
    /// distinct triples written.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] when a file cannot be read or parsed, or the
    /// output cannot be written.
    fn merge(&self, files: &[PathBuf], destination: &Path) -> Result<usize, CompileError>;
}

/// Collects everything into one graph before writing.
#[derive(Debug, Clone, Copy)]
pub struct InMemoryMerger {
    pub format: GraphFormat,
}

/// Writes triples as they are parsed, never holding the whole graph.
#[derive(Debug, Clone, Copy)]
pub struct StreamingMerger {
    pub format: GraphFormat,
}

/// Picks the streaming merger once `file_count` reaches `threshold`.
#[must_use]
pub fn select_merger(
    file_count: usize,
    threshold: usize,
    format: GraphFormat,
) -> Box<dyn GraphMerger> {
    if file_count >= threshold {
        Box::new(StreamingMerger { format })
    } else {
        Box::new(InMemoryMerger { format })
    }
}

/// Merges `source_dir` into `destination` and removes `source_dir`.
/// Returns the number of files merged.
///
/// # Errors
///
/// Returns [`CompileError`] when merging fails.
pub fn merge_graphs(
    source_dir: &Path,
    destination: &Path,
    format: GraphFormat,
    threshold: usize,
) -> Result<usize, CompileError> {
    let files = ordered_files(source_dir)?;
    let merger = select_merger(files.len(), threshold, format);
    let triples = merger.merge(&files, destination)?;
    info!(
        merger = merger.name(),
        files = files.len(),
        triples,
        destination = %destination.display(),
        "merged graphs"
    );
    remove_source(source_dir)?;
    Ok(files.len())
}

impl GraphMerger for InMemoryMerger {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    fn merge(&self, files: &[PathBuf], destination: &Path) -> Result<usize, CompileError> {
        let mut graph = Graph::new();
        for path in files {
            for_each_triple(path, self.format, |triple| {
                graph.insert(&triple);
                Ok(())
            })?;
        }

        let mut triples: Vec<Triple> = graph.iter().map(|t| t.into_owned()).collect();
        triples.sort_by_cached_key(|t| {
            (t.subject.to_string(), t.predicate.to_string(), t.object.to_string())
        });

        let mut writer = open_writer(destination, self.format)?;
        for triple in &triples {
            writer
                .serialize_triple(triple)
                .map_err(|e| CompileError::serialize(destination, e))?;
        }
        finish(writer, destination)?;
        Ok(triples.len())
    }
}

impl GraphMerger for StreamingMerger {
    fn name(&self) -> &'static str {
        "streaming"
    }

    fn merge(&self, files: &[PathBuf], destination: &Path) -> Result<usize, CompileError> {
        let mut seen: HashSet<u128> = HashSet::new();
        let mut writer = open_writer(destination, self.format)?;
        for path in files {
            for_each_triple(path, self.format, |triple| {
                if seen.insert(digest(&triple)) {
                    writer
                        .serialize_triple(&triple)
                        .map_err(|e| CompileError::serialize(destination, e))?;
                }
                Ok(())
            })?;
        }
        finish(writer, destination)?;
        debug!(distinct = seen.len(), "streamed graph merge");
        Ok(seen.len())
    }
}

type FileSerializer = oxrdfio::WriterQuadSerializer<BufWriter<File>>;

fn open_writer(destination: &Path, format: GraphFormat) -> Result<FileSerializer, CompileError> {
    let file = File::create(destination).map_err(|e| CompileError::io(destination, e))?;
    let serializer = format
        .serializer()
        .map_err(|e| CompileError::serialize(destination, e))?;
    Ok(serializer.for_writer(BufWriter::new(file)))
}

fn finish(writer: FileSerializer, destination: &Path) -> Result<(), CompileError> {
    let mut inner = writer
        .finish()
        .map_err(|e| CompileError::serialize(destination, e))?;
    inner.flush().map_err(|e| CompileError::io(destination, e))
}

/// Parses one file and hands each triple to `f`. Blank nodes are renamed
/// per file so that labels from different files never collide.
fn for_each_triple(
    path: &Path,
    format: GraphFormat,
    mut f: impl FnMut(Triple) -> Result<(), CompileError>,
) -> Result<(), CompileError> {
    let file = File::open(path).map_err(|e| CompileError::io(path, e))?;
    let parser = RdfParser::from_format(format.rdf_format()).rename_blank_nodes();
    for quad in parser.for_reader(BufReader::new(file)) {
        let quad = quad.map_err(|e| CompileError::parse(path, e))?;
        f(Triple::new(quad.subject, quad.predicate, quad.object))?;
    }
    Ok(())
}

/// First 128 bits of the SHA-256 of the N-Triples form.
fn digest(triple: &Triple) -> u128 {
    let hash = Sha256::digest(triple.to_string().as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);
    u128::from_be_bytes(bytes)
}
