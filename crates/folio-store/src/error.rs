//! Error types for the job store and packager

use folio_domain::JobId;
use thiserror::Error;

/// Errors returned by [`crate::JobStore`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No entry for this id (never existed or already evicted)
    #[error("Extraction not found: {0}")]
    NotFound(JobId),

    /// The id generator produced an id that is already live
    #[error("Job id collision: {0}")]
    IdCollision(JobId),
}

/// Errors returned by [`crate::ArtifactPackager`]
#[derive(Error, Debug)]
pub enum PackagerError {
    /// Unknown job, or the requested artifact is not part of it / gone from disk
    #[error("{0}")]
    NotFound(String),

    /// The job exists but has no files to download
    #[error("No CSV files available for download")]
    NoArtifacts(JobId),

    /// Scratch or artifact I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive writer failed
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl From<StoreError> for PackagerError {
    fn from(e: StoreError) -> Self {
        PackagerError::NotFound(e.to_string())
    }
}
