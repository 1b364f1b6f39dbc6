//! Per-extraction output directories
//!
//! An [`OutputDir`] removes itself on drop unless the extraction completes
//! ([`OutputDir::finish`]) or the engine hands the partial files over to the
//! caller ([`OutputDir::abandon`]).

use folio_domain::names::sanitize_file_name;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub(crate) struct OutputDir {
    path: PathBuf,
    written: Vec<PathBuf>,
    armed: bool,
}

impl OutputDir {
    /// Create `<root>/<source>_<random>` for a new extraction
    pub(crate) async fn create(root: &Path, source_name: &str) -> io::Result<Self> {
        let dir_name = format!(
            "{}_{}",
            sanitize_file_name(source_name, "document"),
            Uuid::new_v4().simple()
        );
        let path = root.join(dir_name);
        tokio::fs::create_dir_all(&path).await?;

        Ok(Self {
            path,
            written: Vec::new(),
            armed: true,
        })
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Write one artifact, returning its path
    ///
    /// Names are reduced to a single component; a name that was already
    /// written gets a numeric suffix so earlier files are never overwritten.
    pub(crate) async fn write(&mut self, file_name: &str, contents: &[u8]) -> io::Result<PathBuf> {
        let safe = sanitize_file_name(file_name, "table.csv");
        let mut target = self.path.join(&safe);
        let mut n = 2;
        while self.written.contains(&target) {
            target = self.path.join(format!("{}_{}", n, safe));
            n += 1;
        }

        tokio::fs::write(&target, contents).await?;
        self.written.push(target.clone());
        Ok(target)
    }

    /// Keep the directory; the caller now owns it
    pub(crate) fn finish(mut self) -> (PathBuf, Vec<PathBuf>) {
        self.armed = false;
        (
            std::mem::take(&mut self.path),
            std::mem::take(&mut self.written),
        )
    }

    /// Leave the partial output on disk and report it as orphaned
    pub(crate) fn abandon(mut self) -> Vec<PathBuf> {
        self.armed = false;
        let mut orphans = std::mem::take(&mut self.written);
        orphans.push(std::mem::take(&mut self.path));
        orphans
    }
}

impl Drop for OutputDir {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.path.display(),
                    "Failed to remove partial extraction output: {}",
                    e
                );
            }
        }
    }
}
