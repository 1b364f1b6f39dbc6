//! Request orchestration
//!
//! Ties the extraction engine, job store, packager and janitor together
//! behind the operations the HTTP layer exposes. The engine call never
//! happens under a store lock; packaging and sweeping run on the blocking
//! pool.

use crate::config::ServerConfig;
use crate::upload::ScratchUpload;
use bytes::Bytes;
use folio_domain::names::sanitize_file_name;
use folio_domain::{JobId, JobSummary};
use folio_engine::{EngineError, ExtractionEngine};
use folio_janitor::Janitor;
use folio_store::{ArtifactPackager, BundleArchive, JobStore, PackagerError, StoreError};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced to callers of the orchestrator
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The request itself is unusable (missing file or key, wrong type)
    #[error("{0}")]
    Validation(String),

    /// Unknown or evicted job, or no artifact of that name
    #[error("{0}")]
    NotFound(String),

    /// The job exists but produced no files
    #[error("No CSV files available for download")]
    NoArtifacts,

    /// The engine rejected the credential or failed
    #[error("Processing error: {0}")]
    Engine(#[from] EngineError),

    /// The upload could not be written to scratch space
    #[error("Upload error: {0}")]
    Upload(io::Error),

    /// Archive or artifact I/O failed
    #[error("Download error: {0}")]
    Download(String),

    /// Anything else (store id collision, task failure)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for OrchestratorError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => OrchestratorError::NotFound("Extraction not found".to_string()),
            other => OrchestratorError::Internal(other.to_string()),
        }
    }
}

impl From<PackagerError> for OrchestratorError {
    fn from(e: PackagerError) -> Self {
        match e {
            PackagerError::NotFound(msg) => OrchestratorError::NotFound(msg),
            PackagerError::NoArtifacts(_) => OrchestratorError::NoArtifacts,
            other => OrchestratorError::Download(other.to_string()),
        }
    }
}

/// A document received from a client
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied file name (untrusted)
    pub file_name: String,
    /// Document bytes
    pub contents: Bytes,
}

/// Outcome of a successful upload
#[derive(Debug, Clone)]
pub struct CreatedJob {
    /// Identifier to poll and download with
    pub id: JobId,
    /// Summary of the extraction
    pub summary: JobSummary,
}

/// A single artifact opened for download
#[derive(Debug)]
pub struct ArtifactDownload {
    /// Base name to present to the client
    pub file_name: String,
    /// Open handle on the artifact
    pub file: tokio::fs::File,
    /// Size in bytes
    pub size: u64,
}

/// Coordinates uploads, lookups, downloads and sweeps
pub struct Orchestrator {
    engine: Arc<dyn ExtractionEngine>,
    store: Arc<JobStore>,
    packager: Arc<ArtifactPackager>,
    janitor: Arc<Janitor>,
    upload_dir: PathBuf,
    allowed_extensions: Vec<String>,
}

impl Orchestrator {
    /// Wire an engine and a store together using `config`
    pub fn new(engine: Arc<dyn ExtractionEngine>, store: Arc<JobStore>, config: &ServerConfig) -> Self {
        let packager = Arc::new(ArtifactPackager::new(store.clone(), config.scratch_root()));
        let janitor = Arc::new(Janitor::new(store.clone(), config.janitor.clone()));
        Self {
            engine,
            store,
            packager,
            janitor,
            upload_dir: config.upload_dir.clone(),
            allowed_extensions: config.normalized_extensions(),
        }
    }

    /// The job store
    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// The janitor, shared with the background worker
    pub fn janitor(&self) -> &Arc<Janitor> {
        &self.janitor
    }

    /// Run an extraction and record its result
    ///
    /// The upload is written to scratch space, handed to the engine and
    /// deleted again whatever the outcome. On engine failure any files the
    /// engine reported as orphaned are removed and nothing is stored.
    ///
    /// Once validation passes the work runs on its own task, so a caller
    /// that goes away (a dropped connection) does not cut the extraction
    /// short; its job is still stored.
    pub async fn create_job(
        &self,
        upload: Option<Upload>,
        credential: &str,
    ) -> Result<CreatedJob, OrchestratorError> {
        let upload = upload
            .filter(|u| !u.file_name.trim().is_empty())
            .ok_or_else(|| OrchestratorError::Validation("No file selected".to_string()))?;

        let credential = credential.trim();
        if credential.is_empty() {
            return Err(OrchestratorError::Validation("API key is required".to_string()));
        }

        let file_name = sanitize_file_name(&upload.file_name, "");
        if !self.is_allowed(&file_name) {
            return Err(OrchestratorError::Validation(format!(
                "Please upload a {} file",
                self.allowed_extensions.join("/").to_ascii_uppercase()
            )));
        }

        let extraction = Extraction {
            engine: self.engine.clone(),
            store: self.store.clone(),
            upload_dir: self.upload_dir.clone(),
            file_name,
            contents: upload.contents,
            credential: credential.to_string(),
        };

        tokio::spawn(extraction.run())
            .await
            .map_err(|e| OrchestratorError::Internal(e.to_string()))?
    }

    /// Summary of a live job, including its creation time
    pub fn get_job(&self, id: &str) -> Result<JobSummary, OrchestratorError> {
        let id = parse_id(id)?;
        Ok(self.store.get(id)?.summary())
    }

    /// Build a zip archive of every artifact of a job
    pub async fn download_bundle(&self, id: &str) -> Result<BundleArchive, OrchestratorError> {
        let id = parse_id(id)?;
        let packager = self.packager.clone();
        let archive = tokio::task::spawn_blocking(move || packager.bundle(id))
            .await
            .map_err(|e| OrchestratorError::Internal(e.to_string()))??;

        tracing::debug!(job_id = %id, size = archive.size(), "Bundle ready");
        Ok(archive)
    }

    /// Open the artifact of a job with base name `name`
    pub async fn download_artifact(
        &self,
        id: &str,
        name: &str,
    ) -> Result<ArtifactDownload, OrchestratorError> {
        let id = parse_id(id)?;
        let path = self.packager.locate_artifact(id, name)?;

        // The sweeper may have removed it since it was located
        let file = tokio::fs::File::open(&path).await.map_err(artifact_io_error)?;
        let size = file.metadata().await.map_err(artifact_io_error)?.len();

        Ok(ArtifactDownload {
            file_name: name.to_string(),
            file,
            size,
        })
    }

    /// Evict expired jobs now, returning how many were removed
    pub async fn sweep(&self) -> Result<usize, OrchestratorError> {
        let janitor = self.janitor.clone();
        let report = tokio::task::spawn_blocking(move || janitor.sweep())
            .await
            .map_err(|e| OrchestratorError::Internal(e.to_string()))?;
        Ok(report.evicted_count())
    }

    /// Number of live jobs
    pub fn job_count(&self) -> usize {
        self.store.len()
    }

    fn is_allowed(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }
}

/// Everything one extraction needs, owned so it can outlive the request
struct Extraction {
    engine: Arc<dyn ExtractionEngine>,
    store: Arc<JobStore>,
    upload_dir: PathBuf,
    file_name: String,
    contents: Bytes,
    credential: String,
}

impl Extraction {
    async fn run(self) -> Result<CreatedJob, OrchestratorError> {
        let scratch = ScratchUpload::write(&self.upload_dir, &self.file_name, &self.contents)
            .await
            .map_err(OrchestratorError::Upload)?;

        let outcome = self.engine.extract(scratch.path(), &self.credential).await;
        scratch.remove().await;

        let record = match outcome {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(file = %self.file_name, "Extraction failed: {}", e);
                remove_orphans(e.orphaned_paths()).await;
                return Err(OrchestratorError::Engine(e));
            }
        };

        let summary = JobSummary::from_record(&record);
        let output_directory = record.output_directory.clone();
        let artifacts = record.artifact_paths().to_vec();

        let id = match self.store.insert(record) {
            Ok(id) => id,
            Err(e) => {
                // The record never became visible, so its files are ours to drop
                let mut orphans = artifacts;
                orphans.extend(output_directory);
                remove_orphans(&orphans).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            job_id = %id,
            source = %summary.source_name,
            tables = summary.table_count,
            "Extraction stored"
        );

        Ok(CreatedJob { id, summary })
    }
}

/// Ids are opaque; anything that does not parse simply does not exist
fn parse_id(id: &str) -> Result<JobId, OrchestratorError> {
    JobId::parse(id).ok_or_else(|| OrchestratorError::NotFound("Extraction not found".to_string()))
}

fn artifact_io_error(e: io::Error) -> OrchestratorError {
    if e.kind() == io::ErrorKind::NotFound {
        OrchestratorError::NotFound("CSV file not found".to_string())
    } else {
        OrchestratorError::Download(e.to_string())
    }
}

/// Best-effort removal of files or directories left behind by a failed job
async fn remove_orphans(paths: &[PathBuf]) {
    for path in paths {
        let result = match tokio::fs::symlink_metadata(path).await {
            Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(path).await,
            Ok(_) => tokio::fs::remove_file(path).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed orphaned output"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), "Failed to remove orphaned output: {}", e),
        }
    }
}
