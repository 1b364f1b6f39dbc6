//! Artifact packaging for downloads
//!
//! Bundles are built in their own scratch directory (never inside a job's
//! output directory) and live exactly as long as the [`BundleArchive`] or the
//! [`BundleStream`] made from it. Dropping either, whether the transfer
//! finished or was abandoned, removes the scratch directory. Bundle lifetime
//! is therefore independent of the job entry and of later evictions.

use crate::error::PackagerError;
use crate::store::JobStore;
use bytes::Bytes;
use folio_domain::names::sanitize_file_name;
use folio_domain::{artifact_name, JobId};
use futures::Stream;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tempfile::TempDir;
use tokio_util::io::ReaderStream;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Suffix appended to the source name to form the bundle file name
pub const BUNDLE_SUFFIX: &str = "_extracted_tables.zip";

/// Serves a job's artifacts, one at a time or bundled
pub struct ArtifactPackager {
    store: Arc<JobStore>,
    scratch_root: PathBuf,
}

impl ArtifactPackager {
    /// Create a packager building bundles under `scratch_root`
    pub fn new(store: Arc<JobStore>, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            scratch_root: scratch_root.into(),
        }
    }

    /// Directory under which bundle scratch directories are created
    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Build a zip containing every artifact of `id` under its base name
    ///
    /// Artifacts are added in production order; when two share a base name the
    /// later one wins. Files that have already disappeared from disk are
    /// skipped. This does blocking I/O and should run on a blocking thread.
    pub fn bundle(&self, id: JobId) -> Result<BundleArchive, PackagerError> {
        let entry = self.store.get(id)?;
        let record = &entry.record;

        if !record.has_artifacts() {
            return Err(PackagerError::NoArtifacts(id));
        }

        // Open everything up front: once open, a concurrent eviction can no
        // longer pull a file out from under the archive writer.
        let mut members: Vec<(String, File)> = Vec::new();
        for path in record.artifact_paths() {
            let Some(name) = artifact_name(path) else {
                tracing::warn!(job_id = %id, path = %path.display(), "Skipping artifact without a usable name");
                continue;
            };
            let file = match File::open(path) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::warn!(job_id = %id, path = %path.display(), "Artifact missing on disk, skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            match members.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = file,
                None => members.push((name, file)),
            }
        }

        if members.is_empty() {
            return Err(PackagerError::NoArtifacts(id));
        }

        std::fs::create_dir_all(&self.scratch_root)?;
        let scratch = tempfile::Builder::new()
            .prefix("folio-bundle-")
            .tempdir_in(&self.scratch_root)?;

        let file_name = format!(
            "{}{}",
            sanitize_file_name(&record.source_name, "document"),
            BUNDLE_SUFFIX
        );
        let path = scratch.path().join(&file_name);

        let mut zip = ZipWriter::new(File::create(&path)?);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, mut file) in members {
            zip.start_file(name.as_str(), options)?;
            io::copy(&mut file, &mut zip)?;
        }
        zip.finish()?;

        let size = std::fs::metadata(&path)?.len();

        tracing::debug!(job_id = %id, bundle = %file_name, size, "Bundle created");

        Ok(BundleArchive {
            file_name,
            path,
            size,
            scratch,
        })
    }

    /// Resolve the artifact of `id` whose base name is `name`
    ///
    /// Only the artifacts of that job are considered, so a colliding name in
    /// another job can never be returned.
    pub fn locate_artifact(&self, id: JobId, name: &str) -> Result<PathBuf, PackagerError> {
        let entry = self.store.get(id)?;

        let path = entry
            .record
            .find_artifact(name)
            .ok_or_else(|| PackagerError::NotFound("CSV file not found".to_string()))?;

        if !path.is_file() {
            return Err(PackagerError::NotFound("CSV file not found".to_string()));
        }

        Ok(path.to_path_buf())
    }
}

/// A freshly built bundle in its own scratch directory
#[derive(Debug)]
pub struct BundleArchive {
    file_name: String,
    path: PathBuf,
    size: u64,
    scratch: TempDir,
}

impl BundleArchive {
    /// Download name of the archive
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Location of the archive in scratch space
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archive size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Scratch directory holding the archive
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Open the archive as a byte stream that owns the scratch directory
    pub async fn into_stream(self) -> io::Result<BundleStream> {
        let file = tokio::fs::File::open(&self.path).await?;
        Ok(BundleStream {
            inner: ReaderStream::new(file),
            scratch: Some(self.scratch),
        })
    }
}

/// Byte stream of a bundle; removes the scratch directory when dropped
pub struct BundleStream {
    inner: ReaderStream<tokio::fs::File>,
    scratch: Option<TempDir>,
}

impl Stream for BundleStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for BundleStream {
    fn drop(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            let path = scratch.path().to_path_buf();
            if let Err(e) = scratch.close() {
                tracing::warn!(path = %path.display(), "Failed to remove bundle scratch directory: {}", e);
            }
        }
    }
}
