//! Client-facing job summaries

use crate::record::ResultRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Projection of a job returned by upload and status calls
///
/// Field names on the wire follow the existing client contract
/// (`pdf_name`, `total_pages`, ...). Artifact paths are never exposed, only
/// their base names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    /// Display name of the source document
    #[serde(rename = "pdf_name")]
    pub source_name: String,

    /// Page count
    #[serde(rename = "total_pages")]
    pub page_count: u32,

    /// Pages containing tables
    pub pages_with_tables: u32,

    /// Tables extracted
    #[serde(rename = "total_tables_extracted")]
    pub table_count: u32,

    /// Table titles in order of appearance
    #[serde(default)]
    pub extracted_titles: Vec<String>,

    /// Artifact base names
    #[serde(rename = "csv_files", default)]
    pub artifact_names: Vec<String>,

    /// Creation time (RFC 3339); present on status responses only
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timestamp: Option<String>,
}

impl JobSummary {
    /// Project a record without a timestamp
    pub fn from_record(record: &ResultRecord) -> Self {
        Self {
            source_name: record.source_name.clone(),
            page_count: record.page_count,
            pages_with_tables: record.pages_with_tables,
            table_count: record.table_count,
            extracted_titles: record.extracted_titles.clone(),
            artifact_names: record.artifact_names(),
            timestamp: None,
        }
    }

    /// Attach the creation timestamp
    pub fn with_timestamp(mut self, created_at: DateTime<Utc>) -> Self {
        self.timestamp = Some(created_at.to_rfc3339());
        self
    }
}
