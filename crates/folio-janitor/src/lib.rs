//! Folio Janitor
//!
//! Retention sweeper for the job store.
//!
//! # Overview
//!
//! The Janitor is responsible for:
//! - **Eviction**: Removing job entries older than the retention window
//! - **Disk reclamation**: Deleting each evicted job's output directory (or its
//!   individual artifacts when it has none)
//! - **Metrics collection**: Tracking sweeps, evictions and cleanup failures
//!
//! Age is measured from insertion only; reading or downloading a job does not
//! extend its life.
//!
//! # Usage
//!
//! ## On-demand Sweep
//!
//! ```no_run
//! use folio_janitor::{Janitor, JanitorConfig};
//! use folio_store::JobStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(JobStore::new());
//! let janitor = Janitor::new(store, JanitorConfig::default());
//!
//! let report = janitor.sweep();
//! println!("Evicted {} jobs", report.evicted_count());
//! ```
//!
//! ## Background Worker
//!
//! ```no_run
//! use folio_janitor::{Janitor, JanitorConfig, JanitorWorker};
//! use folio_store::JobStore;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(JobStore::new());
//!     let config = JanitorConfig::default();
//!     let janitor = Arc::new(Janitor::new(store, config.clone()));
//!     let worker = JanitorWorker::new(janitor, &config);
//!
//!     // Runs until the token is cancelled
//!     worker.run(CancellationToken::new()).await;
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [janitor]
//! retention_secs = 3600
//! sweep_interval_secs = 300
//! background_sweep = true
//! dry_run = false
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod janitor;
mod metrics;
mod worker;

pub use config::JanitorConfig;
pub use error::JanitorError;
pub use janitor::{Janitor, SweepReport};
pub use metrics::JanitorMetrics;
pub use worker::JanitorWorker;
