//! On-disk layout of one run.
//!
//! ```text
//! <root>/<run>/
//!   harvesting.log
//!   files/1-1.jsonld ...      raw element bytes
//!   <target>/<page>-<element>.<ext>
//!   beacon.txt table.csv cto.<ext> triples.<ext>   after compile
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use super::HarvestError;
use crate::mapper::OutputTarget;

/// Name of the per-run log file.
pub const LOG_FILE_NAME: &str = "harvesting.log";

/// Paths of one run directory. The run owns the directory exclusively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    run_dir: PathBuf,
}

impl RunLayout {
    #[must_use]
    pub fn new(output_root: &Path, run_name: &str) -> Self {
        Self {
            run_dir: output_root.join(run_name),
        }
    }

    /// Creates the run directory. A run never reuses another run's
    /// directory, so an existing one is an error.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Config`] when the directory exists and
    /// [`HarvestError::Io`] when it cannot be created.
    pub fn create(&self) -> Result<(), HarvestError> {
        if self.run_dir.exists() {
            return Err(HarvestError::config(format!(
                "Run directory {} already exists. Choose another run name",
                self.run_dir.display()
            )));
        }
        std::fs::create_dir_all(&self.run_dir).map_err(|e| HarvestError::io(&self.run_dir, e))?;
        debug!(run_dir = %self.run_dir.display(), "created run directory");
        Ok(())
    }

    /// Creates the per-element directory of every target.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Io`] when a directory cannot be created.
    pub async fn create_target_dirs(&self, targets: &[OutputTarget]) -> Result<(), HarvestError> {
        for target in targets {
            let dir = self.target_dir(*target);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| HarvestError::io(&dir, e))?;
        }
        Ok(())
    }

    #[must_use]
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    #[must_use]
    pub fn target_dir(&self, target: OutputTarget) -> PathBuf {
        self.run_dir.join(target.dir_name())
    }

    /// `<target>/<page>-<element>.<extension>`
    #[must_use]
    pub fn element_path(
        &self,
        target: OutputTarget,
        page: usize,
        element: usize,
        extension: &str,
    ) -> PathBuf {
        self.target_dir(target)
            .join(format!("{page}-{element}.{extension}"))
    }

    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.run_dir.join(LOG_FILE_NAME)
    }

    /// Writes one per-element file.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Io`] when the file cannot be written.
    pub async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), HarvestError> {
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| HarvestError::io(path, e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let layout = RunLayout::new(Path::new("downloads"), "run-1");
        assert_eq!(layout.run_dir(), Path::new("downloads/run-1"));
        assert_eq!(
            layout.element_path(OutputTarget::Cto, 2, 10, "ttl"),
            PathBuf::from("downloads/run-1/cto/2-10.ttl")
        );
        assert_eq!(layout.log_path(), PathBuf::from("downloads/run-1/harvesting.log"));
    }

    #[test]
    fn test_create_refuses_existing_run() {
        let root = TempDir::new().unwrap();
        let layout = RunLayout::new(root.path(), "run");
        layout.create().unwrap();
        assert!(matches!(layout.create(), Err(HarvestError::Config { .. })));
    }

    #[tokio::test]
    async fn test_create_target_dirs_and_write() {
        let root = TempDir::new().unwrap();
        let layout = RunLayout::new(root.path(), "run");
        layout.create().unwrap();
        layout
            .create_target_dirs(&[OutputTarget::Beacon, OutputTarget::Files])
            .await
            .unwrap();

        let path = layout.element_path(OutputTarget::Beacon, 1, 1, "txt");
        layout.write(&path, b"a||b\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "a||b\n");
        assert!(layout.target_dir(OutputTarget::Files).is_dir());
    }
}
