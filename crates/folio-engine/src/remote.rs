//! Remote Engine
//!
//! Client for an HTTP extraction service. The service receives the document
//! as multipart form data together with the caller's API key, runs the table
//! extraction (a model call that can take minutes) and answers with the
//! summary and the tables as CSV text. Tables are written locally into a
//! per-extraction output directory.
//!
//! # Features
//!
//! - Configurable endpoint, timeout and output root
//! - Retry with exponential backoff on transport errors and 5xx answers
//! - Credential and document rejections are reported without retrying
//! - Partially written output is removed if writing fails

use crate::output::OutputDir;
use crate::{EngineError, ExtractionEngine};
use async_trait::async_trait;
use folio_domain::ResultRecord;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default timeout for a single extraction request (5 minutes)
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default number of attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Upper bound on the attempts a client will make
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Longest pause between two attempts
pub const MAX_BACKOFF_SECS: u64 = 60;

/// Header carrying the caller's credential
pub const API_KEY_HEADER: &str = "x-api-key";

/// HTTP extraction service client
pub struct RemoteEngine {
    endpoint: String,
    output_root: PathBuf,
    client: reqwest::Client,
    max_retries: u32,
}

/// One extracted table in the service response
#[derive(Debug, Deserialize)]
struct RemoteTable {
    file_name: String,
    csv: String,
}

/// Response body of the extraction service
#[derive(Debug, Deserialize)]
struct RemoteExtraction {
    pdf_name: String,
    total_pages: u32,
    pages_with_tables: u32,
    total_tables_extracted: u32,
    #[serde(default)]
    extracted_titles: Vec<String>,
    #[serde(default)]
    tables: Vec<RemoteTable>,
}

impl RemoteEngine {
    /// Create a client for `endpoint`, writing tables under `output_root`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use folio_engine::RemoteEngine;
    ///
    /// let engine = RemoteEngine::new("http://localhost:7000", "/var/lib/folio/outputs").unwrap();
    /// ```
    pub fn new(
        endpoint: impl Into<String>,
        output_root: impl Into<PathBuf>,
    ) -> Result<Self, EngineError> {
        Self::with_timeout(endpoint, output_root, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        output_root: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Communication(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            output_root: output_root.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Set the maximum number of attempts
    ///
    /// At least one attempt is always made and never more than
    /// [`MAX_RETRIES_LIMIT`].
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.clamp(1, MAX_RETRIES_LIMIT);
        self
    }

    /// Service endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(
        &self,
        file_name: &str,
        bytes: &[u8],
        credential: &str,
    ) -> Result<RemoteExtraction, EngineError> {
        let url = format!("{}/v1/extract", self.endpoint);

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            let part = Part::bytes(bytes.to_vec())
                .file_name(file_name.to_string())
                .mime_str("application/pdf")
                .map_err(|e| EngineError::Communication(e.to_string()))?;
            let form = Form::new().part("file", part);

            match self
                .client
                .post(&url)
                .header(API_KEY_HEADER, credential)
                .multipart(form)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<RemoteExtraction>().await.map_err(|e| {
                            EngineError::InvalidResponse(format!("Failed to parse response: {}", e))
                        });
                    }

                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());

                    match status {
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                            return Err(EngineError::InvalidCredential);
                        }
                        StatusCode::UNSUPPORTED_MEDIA_TYPE | StatusCode::UNPROCESSABLE_ENTITY => {
                            return Err(EngineError::UnsupportedDocument(error_text));
                        }
                        s if s.is_client_error() => {
                            return Err(EngineError::Communication(format!(
                                "HTTP {}: {}",
                                s, error_text
                            )));
                        }
                        s => {
                            last_error = Some(EngineError::Communication(format!(
                                "HTTP {}: {}",
                                s, error_text
                            )));
                        }
                    }
                }
                Err(e) => {
                    last_error = Some(EngineError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                let delay = backoff(attempts);
                tracing::warn!(
                    attempt = attempts,
                    "Extraction request failed, retrying in {:?}",
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| EngineError::Communication("Max retries exceeded".to_string())))
    }
}

/// Exponential backoff after `attempt` failures: 1s, 2s, 4s, capped
fn backoff(attempt: u32) -> Duration {
    let secs = 1u64
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX)
        .min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}

#[async_trait]
impl ExtractionEngine for RemoteEngine {
    async fn extract(
        &self,
        document: &Path,
        credential: &str,
    ) -> Result<ResultRecord, EngineError> {
        let bytes = tokio::fs::read(document)
            .await
            .map_err(|e| EngineError::UnsupportedDocument(format!("{}: {}", document.display(), e)))?;

        let file_name = document
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf");

        let response = self.request(file_name, &bytes, credential).await?;

        let mut out = OutputDir::create(&self.output_root, &response.pdf_name).await?;
        let mut record = ResultRecord::new(response.pdf_name).with_counts(
            response.total_pages,
            response.pages_with_tables,
            response.total_tables_extracted,
        );
        record.extracted_titles = response.extracted_titles;

        for table in &response.tables {
            let path = out.write(&table.file_name, table.csv.as_bytes()).await?;
            record.push_artifact(path);
        }

        let (dir, _) = out.finish();
        record.output_directory = Some(dir);

        tracing::info!(
            source = %record.source_name,
            tables = record.table_count,
            files = record.artifact_paths().len(),
            "Remote extraction finished"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_engine_creation() {
        let engine = RemoteEngine::new("http://localhost:7000/", "/tmp/out").unwrap();
        assert_eq!(engine.endpoint(), "http://localhost:7000");
        assert_eq!(engine.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_with_max_retries_floor() {
        let engine = RemoteEngine::new("http://localhost:7000", "/tmp/out")
            .unwrap()
            .with_max_retries(0);
        assert_eq!(engine.max_retries, 1);
    }

    #[test]
    fn test_with_max_retries_ceiling() {
        let engine = RemoteEngine::new("http://localhost:7000", "/tmp/out")
            .unwrap()
            .with_max_retries(70);
        assert_eq!(engine.max_retries, MAX_RETRIES_LIMIT);
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        assert_eq!(backoff(1), Duration::from_secs(1));
        assert_eq!(backoff(2), Duration::from_secs(2));
        assert_eq!(backoff(4), Duration::from_secs(8));
        assert_eq!(backoff(7), Duration::from_secs(MAX_BACKOFF_SECS));
        assert_eq!(backoff(65), Duration::from_secs(MAX_BACKOFF_SECS));
        assert_eq!(backoff(u32::MAX), Duration::from_secs(MAX_BACKOFF_SECS));
    }

    #[test]
    fn test_parse_service_response() {
        let body = r#"{
            "pdf_name": "report",
            "total_pages": 3,
            "pages_with_tables": 2,
            "total_tables_extracted": 3,
            "extracted_titles": ["A", "B", "C"],
            "tables": [{"file_name": "report_page2_table1.csv", "csv": "a,b\n1,2\n"}]
        }"#;
        let parsed: RemoteExtraction = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.pdf_name, "report");
        assert_eq!(parsed.total_tables_extracted, 3);
        assert_eq!(parsed.tables.len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let dir = tempfile::TempDir::new().unwrap();
        let doc = dir.path().join("a.pdf");
        std::fs::write(&doc, b"%PDF").unwrap();

        let engine = RemoteEngine::new("http://127.0.0.1:9", dir.path())
            .unwrap()
            .with_max_retries(1);
        let result = engine.extract(&doc, "key").await;

        assert!(matches!(result, Err(EngineError::Communication(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_many_retries_give_up_cleanly() {
        let dir = tempfile::TempDir::new().unwrap();
        let doc = dir.path().join("a.pdf");
        std::fs::write(&doc, b"%PDF").unwrap();

        let engine = RemoteEngine::new("http://127.0.0.1:9", dir.path())
            .unwrap()
            .with_max_retries(70);
        let result = engine.extract(&doc, "key").await;

        assert!(matches!(result, Err(EngineError::Communication(_))));
    }
}
