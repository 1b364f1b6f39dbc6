//! Folio Domain Layer
//!
//! Core value types shared by every Folio crate. Nothing here touches the
//! network; the only file-system awareness is path handling for artifacts.
//!
//! ## Key Concepts
//!
//! - **JobId**: Opaque, random identifier handed to the client after an upload
//! - **ResultRecord**: Summary of one extraction plus the files it produced
//! - **JobEntry**: A record as held by the job store, stamped with its creation time
//! - **JobSummary**: The client-facing projection of a job
//! - **Clock**: Time source, swappable in tests so retention can be exercised

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod job;
pub mod names;
pub mod record;
pub mod summary;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use job::{JobEntry, JobId};
pub use record::{artifact_name, ResultRecord};
pub use summary::JobSummary;
