//! Folio Job Store
//!
//! In-memory registry of completed extractions and the packager that serves
//! their artifacts.
//!
//! # Architecture
//!
//! - [`JobStore`]: `JobId → JobEntry` map behind a single `RwLock`. Entries are
//!   immutable and shared as `Arc<JobEntry>`, so readers never hold the lock
//!   while touching the file system.
//! - [`ArtifactPackager`]: Resolves single artifacts and builds zip bundles in
//!   a scratch directory that is removed once the download stream is dropped.
//!
//! # Examples
//!
//! ```
//! use folio_domain::ResultRecord;
//! use folio_store::JobStore;
//!
//! let store = JobStore::new();
//! let id = store.insert(ResultRecord::new("report").with_counts(3, 2, 3)).unwrap();
//!
//! let entry = store.get(id).unwrap();
//! assert_eq!(entry.record.table_count, 3);
//!
//! store.delete(id);
//! store.delete(id); // idempotent
//! assert!(store.get(id).is_err());
//! ```

#![warn(missing_docs)]

mod error;
pub mod packager;
pub mod store;

pub use error::{PackagerError, StoreError};
pub use packager::{ArtifactPackager, BundleArchive, BundleStream, BUNDLE_SUFFIX};
pub use store::{IdGenerator, JobStore, RandomIds};
