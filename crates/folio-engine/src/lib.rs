//! Folio Extraction Engines
//!
//! The extraction engine is the collaborator that turns an uploaded document
//! into a [`ResultRecord`] plus a set of generated files. Folio only relies on
//! its contract:
//!
//! - Input: a readable document path and an opaque credential
//! - Output: a record whose artifact paths all exist when the call returns
//! - Failure: a distinguishable [`EngineError`]; any file written before the
//!   failure is reported through [`EngineError::orphaned_paths`] so the caller
//!   can clean it up
//!
//! # Engines
//!
//! - [`MockEngine`]: Deterministic, writes scripted CSV tables locally
//! - [`RemoteEngine`]: Forwards the document to an HTTP extraction service
//!
//! # Examples
//!
//! ```no_run
//! use folio_engine::{ExtractionEngine, MockEngine};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = MockEngine::new("/tmp/folio-out").with_tables_per_page(vec![0, 2, 1]);
//! let record = engine.extract(Path::new("uploads/report.pdf"), "api-key").await?;
//! assert_eq!(record.table_count, 3);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod mock;
mod output;
pub mod remote;

use async_trait::async_trait;
use folio_domain::ResultRecord;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use mock::MockEngine;
pub use remote::RemoteEngine;

/// Errors that can occur while running an extraction
#[derive(Error, Debug)]
pub enum EngineError {
    /// The credential was rejected by the engine
    #[error("Invalid API key")]
    InvalidCredential,

    /// The document could not be read or is not supported
    #[error("Unsupported document: {0}")]
    UnsupportedDocument(String),

    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The engine answered with something we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The engine gave up part way; `orphans` were written before it stopped
    #[error("Extraction aborted: {reason}")]
    Aborted {
        /// Why the extraction stopped
        reason: String,
        /// Files created before the failure, now owned by the caller
        orphans: Vec<PathBuf>,
    },

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Files the engine created and abandoned before failing
    pub fn orphaned_paths(&self) -> &[PathBuf] {
        match self {
            EngineError::Aborted { orphans, .. } => orphans,
            _ => &[],
        }
    }
}

/// An engine that extracts tables from documents
///
/// Implementations may block for a long time (remote model calls); callers
/// must not hold locks across [`ExtractionEngine::extract`].
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    /// Run an extraction over `document` using `credential`
    async fn extract(&self, document: &Path, credential: &str)
        -> Result<ResultRecord, EngineError>;
}
