//! Job identity and stored entries

use crate::record::ResultRecord;
use crate::summary::JobSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an extraction job
///
/// Backed by a random (v4) UUID. Clients must treat the textual form as an
/// opaque token: it carries no ordering or timestamp information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a fresh random JobId
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_domain::JobId;
    ///
    /// let a = JobId::new();
    /// let b = JobId::new();
    /// assert_ne!(a, b);
    /// ```
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    ///
    /// Intended for id generators and tests; production ids come from [`JobId::new`].
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a JobId from its textual form
    ///
    /// Returns `None` for anything that is not a UUID. Callers map this to
    /// "not found" rather than a validation failure, since ids are opaque.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_domain::JobId;
    ///
    /// let id = JobId::new();
    /// assert_eq!(JobId::parse(&id.to_string()), Some(id));
    /// assert_eq!(JobId::parse("../etc/passwd"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A result record as held by the job store
///
/// Entries are immutable once inserted. `created_at` is stamped by the store
/// and is the only input to retention decisions; reads never refresh it.
#[derive(Debug, Clone, PartialEq)]
pub struct JobEntry {
    /// Identifier assigned at insertion
    pub id: JobId,

    /// Extraction result
    pub record: ResultRecord,

    /// Insertion time
    pub created_at: DateTime<Utc>,
}

impl JobEntry {
    /// Create a new entry
    pub fn new(id: JobId, record: ResultRecord, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            record,
            created_at,
        }
    }

    /// Age of the entry relative to `now`
    ///
    /// Clamped at zero if the clock moved backwards.
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.created_at).max(chrono::Duration::zero())
    }

    /// Client-facing summary, including the creation timestamp
    pub fn summary(&self) -> JobSummary {
        JobSummary::from_record(&self.record).with_timestamp(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_job_id_display_roundtrip() {
        let id = JobId::new();
        let text = id.to_string();
        let parsed: JobId = text.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_job_id_parse_rejects_garbage() {
        assert!(JobId::parse("").is_none());
        assert!(JobId::parse("not-a-job").is_none());
        assert!(JobId::parse("12345").is_none());
    }

    #[test]
    fn test_job_id_is_random_v4() {
        let id = JobId::new();
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_job_id_serializes_as_string() {
        let id = JobId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }

    #[test]
    fn test_entry_age() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let entry = JobEntry::new(JobId::new(), ResultRecord::new("doc"), created);

        let later = created + chrono::Duration::minutes(90);
        assert_eq!(entry.age_at(later), chrono::Duration::minutes(90));

        let earlier = created - chrono::Duration::minutes(5);
        assert_eq!(entry.age_at(earlier), chrono::Duration::zero());
    }

    #[test]
    fn test_entry_summary_carries_timestamp() {
        let created = Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap();
        let entry = JobEntry::new(JobId::new(), ResultRecord::new("report"), created);

        let summary = entry.summary();
        assert_eq!(summary.source_name, "report");
        assert_eq!(summary.timestamp.as_deref(), Some("2024-03-05T08:30:00+00:00"));
    }
}
