//! Mock Engine
//!
//! Deterministic engine for tests and local development. Instead of reading
//! the document it follows a script: how many tables each page holds, which
//! credential is accepted, and optionally a point at which to give up.

use crate::output::OutputDir;
use crate::{EngineError, ExtractionEngine};
use async_trait::async_trait;
use folio_domain::ResultRecord;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Mock extraction engine
///
/// Writes one small CSV per scripted table into a fresh directory under
/// `output_root`. Clones share the same call counter.
///
/// # Examples
///
/// ```no_run
/// use folio_engine::{ExtractionEngine, MockEngine};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), folio_engine::EngineError> {
/// let engine = MockEngine::new("/tmp/out")
///     .with_tables_per_page(vec![0, 2, 1])
///     .with_valid_credential("secret");
///
/// let record = engine.extract(Path::new("/tmp/in/report.pdf"), "secret").await?;
/// assert_eq!(record.page_count, 3);
/// assert_eq!(record.pages_with_tables, 2);
/// assert_eq!(record.table_count, 3);
///
/// assert!(engine.extract(Path::new("/tmp/in/report.pdf"), "wrong").await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockEngine {
    output_root: PathBuf,
    tables_per_page: Vec<u32>,
    valid_credential: Option<String>,
    fail_after_tables: Option<usize>,
    group_in_directory: bool,
    delay: Option<Duration>,
    call_count: Arc<AtomicUsize>,
}

impl MockEngine {
    /// Create a mock writing under `output_root`, one page with one table
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            tables_per_page: vec![1],
            valid_credential: None,
            fail_after_tables: None,
            group_in_directory: true,
            delay: None,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of tables found on each page (the length is the page count)
    pub fn with_tables_per_page(mut self, tables: Vec<u32>) -> Self {
        self.tables_per_page = tables;
        self
    }

    /// Only accept this credential; any other is rejected
    pub fn with_valid_credential(mut self, credential: impl Into<String>) -> Self {
        self.valid_credential = Some(credential.into());
        self
    }

    /// Abort after writing `tables` files, leaving them behind as orphans
    pub fn fail_after(mut self, tables: usize) -> Self {
        self.fail_after_tables = Some(tables);
        self
    }

    /// Report artifacts without an output directory
    pub fn without_output_directory(mut self) -> Self {
        self.group_in_directory = false;
        self
    }

    /// Sleep before answering, to simulate a slow model call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times `extract` was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionEngine for MockEngine {
    async fn extract(
        &self,
        document: &Path,
        credential: &str,
    ) -> Result<ResultRecord, EngineError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(valid) = &self.valid_credential {
            if credential != valid {
                return Err(EngineError::InvalidCredential);
            }
        }

        let metadata = tokio::fs::metadata(document)
            .await
            .map_err(|e| EngineError::UnsupportedDocument(format!("{}: {}", document.display(), e)))?;
        if metadata.len() == 0 {
            return Err(EngineError::UnsupportedDocument(format!(
                "{} is empty",
                document.display()
            )));
        }

        let source_name = document
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();

        let mut out = OutputDir::create(&self.output_root, &source_name).await?;
        let mut record = ResultRecord::new(source_name.clone());
        let mut written = 0usize;

        for (page_idx, &tables) in self.tables_per_page.iter().enumerate() {
            let page = page_idx + 1;
            for table in 1..=tables {
                if self.fail_after_tables == Some(written) {
                    return Err(EngineError::Aborted {
                        reason: format!("mock failure on page {}", page),
                        orphans: out.abandon(),
                    });
                }

                let title = format!("Page {} Table {}", page, table);
                let csv = format!("title,page,table\n\"{}\",{},{}\n", title, page, table);
                let path = out
                    .write(&format!("{}_page{}_table{}.csv", source_name, page, table), csv.as_bytes())
                    .await?;

                record.push_artifact(path);
                record.extracted_titles.push(title);
                written += 1;
            }
        }

        let pages_with_tables = self.tables_per_page.iter().filter(|&&t| t > 0).count() as u32;
        record = record.with_counts(
            self.tables_per_page.len() as u32,
            pages_with_tables,
            written as u32,
        );

        let (dir, _) = out.finish();
        if self.group_in_directory {
            record.output_directory = Some(dir);
        }

        tracing::debug!(
            source = %record.source_name,
            tables = record.table_count,
            "Mock extraction finished"
        );

        Ok(record)
    }
}
