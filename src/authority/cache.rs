//! Persistent authority lookups.
//!
//! A JSON object keyed by URI. Each entry is a category, a redirect to the
//! URI that should be classified instead, or an `invalid` marker for URIs
//! that could not be reached.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::{AuthorityError, EntityCategory};

/// One cached answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheEntry {
    Category { category: EntityCategory },
    Redirect { target: String },
    Invalid,
}

/// Authority lookups remembered across runs.
#[derive(Debug, Default)]
pub struct AuthorityCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, CacheEntry>,
    dirty: bool,
}

impl AuthorityCache {
    /// A cache that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the cache file; a missing file yields an empty cache bound to
    /// that path.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError`] when the file exists but cannot be read
    /// or parsed.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AuthorityError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| AuthorityError::Json {
                path: path.clone(),
                source,
            })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!("no authority cache yet");
                BTreeMap::new()
            }
            Err(error) => return Err(AuthorityError::io(path, error)),
        };
        info!(entries = entries.len(), "loaded authority cache");
        Ok(Self {
            path: Some(path),
            entries,
            dirty: false,
        })
    }

    /// Writes the cache back to the file it was loaded from, if anything
    /// changed. In-memory caches are never written.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::Io`] when the file cannot be written.
    pub fn save(&mut self) -> Result<(), AuthorityError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| AuthorityError::io(parent, e))?;
        }
        let raw = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            AuthorityError::Json {
                path: path.clone(),
                source,
            }
        })?;
        // Write next to the target and rename so a crash never leaves half a file.
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, raw).map_err(|e| AuthorityError::io(&staging, e))?;
        std::fs::rename(&staging, path).map_err(|e| AuthorityError::io(path, e))?;
        self.dirty = false;
        info!(path = %path.display(), entries = self.entries.len(), "saved authority cache");
        Ok(())
    }

    #[must_use]
    pub fn get(&self, uri: &str) -> Option<&CacheEntry> {
        self.entries.get(uri)
    }

    pub fn insert(&mut self, uri: &str, entry: CacheEntry) {
        if self.entries.get(uri) != Some(&entry) {
            self.entries.insert(uri.to_string(), entry);
            self.dirty = true;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether there are unsaved changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = AuthorityCache::load(dir.path().join("authorities.json")).unwrap();
        assert!(cache.is_empty());
        assert!(!cache.is_dirty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache").join("authorities.json");

        let mut cache = AuthorityCache::load(&path).unwrap();
        cache.insert(
            "https://d-nb.info/gnd/118540238",
            CacheEntry::Category {
                category: EntityCategory::Person,
            },
        );
        cache.insert(
            "http://example.org/old",
            CacheEntry::Redirect {
                target: "http://example.org/new".to_string(),
            },
        );
        cache.insert("http://example.org/gone", CacheEntry::Invalid);
        cache.save().unwrap();
        assert!(!cache.is_dirty());

        let reloaded = AuthorityCache::load(&path).unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(
            reloaded.get("https://d-nb.info/gnd/118540238"),
            Some(&CacheEntry::Category {
                category: EntityCategory::Person
            })
        );
        assert_eq!(reloaded.get("http://example.org/gone"), Some(&CacheEntry::Invalid));
    }

    #[test]
    fn test_file_format_is_tagged_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("authorities.json");
        let mut cache = AuthorityCache::load(&path).unwrap();
        cache.insert("http://example.org/gone", CacheEntry::Invalid);
        cache.save().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["http://example.org/gone"]["kind"], "invalid");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("authorities.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            AuthorityCache::load(&path),
            Err(AuthorityError::Json { .. })
        ));
    }

    #[test]
    fn test_in_memory_save_is_noop() {
        let mut cache = AuthorityCache::in_memory();
        cache.insert("http://example.org/a", CacheEntry::Invalid);
        assert!(cache.is_dirty());
        // In-memory caches accept save as a no-op
        cache.save().unwrap();
        assert!(cache.is_dirty());
    }
}
