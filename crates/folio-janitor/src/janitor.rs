//! Core Janitor implementation for retention sweeps

use crate::{JanitorConfig, JanitorMetrics};
use chrono::{DateTime, Utc};
use folio_domain::{JobEntry, JobId};
use folio_store::JobStore;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Outcome of a single sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Jobs removed from the store by this sweep
    pub evicted: Vec<JobId>,

    /// Expired jobs left in place because the janitor is in dry-run mode
    pub skipped: Vec<JobId>,

    /// Jobs still inside the retention window
    pub retained: usize,

    /// File-system removals that failed; the affected jobs were still evicted
    pub cleanup_warnings: usize,
}

impl SweepReport {
    /// Number of jobs this sweep removed
    pub fn evicted_count(&self) -> usize {
        self.evicted.len()
    }
}

/// Janitor service for job retention
///
/// Responsible for:
/// - Evicting jobs older than the retention window
/// - Reclaiming the disk space their artifacts occupy
/// - Collecting metrics on cleanup operations
///
/// Sweeps take `&self`; any number may run concurrently with each other and
/// with store traffic. A job is reported as evicted only by the sweep whose
/// delete actually removed it.
///
/// # Examples
///
/// ```
/// use folio_janitor::{Janitor, JanitorConfig};
/// use folio_store::JobStore;
/// use std::sync::Arc;
///
/// let janitor = Janitor::new(Arc::new(JobStore::new()), JanitorConfig::default());
/// assert_eq!(janitor.sweep().evicted_count(), 0);
/// ```
pub struct Janitor {
    store: Arc<JobStore>,
    config: JanitorConfig,
    metrics: Mutex<JanitorMetrics>,
}

impl Janitor {
    /// Create a new Janitor over `store`
    pub fn new(store: Arc<JobStore>, config: JanitorConfig) -> Self {
        Self {
            store,
            config,
            metrics: Mutex::new(JanitorMetrics::new()),
        }
    }

    /// Configuration this janitor was built with
    pub fn config(&self) -> &JanitorConfig {
        &self.config
    }

    /// Snapshot of the current metrics
    pub fn metrics(&self) -> JanitorMetrics {
        self.lock_metrics().clone()
    }

    /// Reset metrics counters
    pub fn reset_metrics(&self) {
        self.lock_metrics().reset();
    }

    /// Evict every job older than the retention window, judged by the store's clock
    pub fn sweep(&self) -> SweepReport {
        let now = self.store.clock().now();
        self.sweep_at(now)
    }

    /// Evict every job whose age at `now` strictly exceeds the retention window
    ///
    /// For each expired job the output directory is removed (or, when the
    /// record has none, each artifact file), then the entry is deleted from
    /// the store. File-system failures are logged and counted but never stop
    /// the sweep or keep the entry alive.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let start = Instant::now();
        let retention = chrono::Duration::seconds(
            i64::try_from(self.config.retention_secs).unwrap_or(i64::MAX),
        );

        let mut report = SweepReport::default();
        for entry in self.store.snapshot() {
            if entry.age_at(now) <= retention {
                report.retained += 1;
                continue;
            }

            if self.config.dry_run {
                tracing::info!(job_id = %entry.id, "Dry run: would evict expired job");
                report.skipped.push(entry.id);
                continue;
            }

            report.cleanup_warnings += reclaim_files(&entry);

            if self.store.delete(entry.id).is_some() {
                tracing::debug!(job_id = %entry.id, "Evicted expired job");
                report.evicted.push(entry.id);
            }
        }

        let runtime_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.lock_metrics().record_sweep(
            report.evicted_count(),
            report.cleanup_warnings,
            runtime_ms,
            Utc::now(),
        );

        if report.evicted_count() > 0 || report.cleanup_warnings > 0 {
            tracing::info!(
                evicted = report.evicted_count(),
                retained = report.retained,
                warnings = report.cleanup_warnings,
                "Retention sweep finished"
            );
        }

        report
    }

    fn lock_metrics(&self) -> MutexGuard<'_, JanitorMetrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Remove an expired job's files, returning the number of failures
fn reclaim_files(entry: &JobEntry) -> usize {
    let record = &entry.record;
    let mut warnings = 0;

    if let Some(dir) = &record.output_directory {
        if let Err(e) = remove_path(dir, true) {
            tracing::warn!(job_id = %entry.id, path = %dir.display(), error = %e, "Failed to remove output directory");
            warnings += 1;
        }
    }

    // Artifacts outside the output directory (or all of them when there is none)
    for path in record.artifact_paths() {
        if let Some(dir) = &record.output_directory {
            if path.starts_with(dir) {
                continue;
            }
        }
        if let Err(e) = remove_path(path, false) {
            tracing::warn!(job_id = %entry.id, path = %path.display(), error = %e, "Failed to remove artifact");
            warnings += 1;
        }
    }

    warnings
}

/// Remove a file or directory tree; a path that is already gone counts as success
fn remove_path(path: &Path, recursive: bool) -> io::Result<()> {
    let result = if recursive {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use folio_domain::{ManualClock, ResultRecord};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        clock: Arc<ManualClock>,
        store: Arc<JobStore>,
        root: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
            let clock = Arc::new(ManualClock::starting_at(start));
            let store = Arc::new(JobStore::with_clock(clock.clone()));
            Self {
                clock,
                store,
                root: TempDir::new().unwrap(),
            }
        }

        fn janitor(&self, retention_secs: u64) -> Janitor {
            let config = JanitorConfig {
                retention_secs,
                ..JanitorConfig::default()
            };
            Janitor::new(self.store.clone(), config)
        }

        /// Job whose artifacts live in their own output directory
        fn job_with_dir(&self, name: &str) -> (JobId, PathBuf) {
            let dir = self.root.path().join(name);
            fs::create_dir_all(&dir).unwrap();
            let csv = dir.join(format!("{name}_page1_table1.csv"));
            fs::write(&csv, "a,b\n1,2\n").unwrap();

            let record = ResultRecord::new(name)
                .with_counts(1, 1, 1)
                .with_artifact(csv)
                .with_output_directory(&dir);
            (self.store.insert(record).unwrap(), dir)
        }

        fn advance_secs(&self, secs: i64) {
            self.clock.advance(chrono::Duration::seconds(secs));
        }
    }

    #[test]
    fn test_empty_store() {
        let fx = Fixture::new();
        let report = fx.janitor(60).sweep();
        assert_eq!(report, SweepReport::default());
    }

    #[test]
    fn test_evicts_expired_and_removes_directory() {
        let fx = Fixture::new();
        let (id, dir) = fx.job_with_dir("report");
        fx.advance_secs(61);

        let report = fx.janitor(60).sweep();

        assert_eq!(report.evicted, vec![id]);
        assert_eq!(report.cleanup_warnings, 0);
        assert!(!fx.store.contains(id));
        assert!(!dir.exists());
    }

    #[test]
    fn test_age_equal_to_retention_is_kept() {
        let fx = Fixture::new();
        let (id, dir) = fx.job_with_dir("edge");
        fx.advance_secs(60);

        let report = fx.janitor(60).sweep();

        assert_eq!(report.evicted_count(), 0);
        assert_eq!(report.retained, 1);
        assert!(fx.store.contains(id));
        assert!(dir.exists());
    }

    #[test]
    fn test_only_old_jobs_evicted() {
        let fx = Fixture::new();
        let (old, old_dir) = fx.job_with_dir("old");
        fx.advance_secs(45);
        let (young, young_dir) = fx.job_with_dir("young");
        fx.advance_secs(30);

        let report = fx.janitor(60).sweep();

        assert_eq!(report.evicted, vec![old]);
        assert_eq!(report.retained, 1);
        assert!(!old_dir.exists());
        assert!(young_dir.exists());
        assert!(fx.store.get(young).is_ok());
    }

    #[test]
    fn test_second_sweep_evicts_nothing() {
        let fx = Fixture::new();
        fx.job_with_dir("a");
        fx.job_with_dir("b");
        fx.advance_secs(3601);

        let janitor = fx.janitor(3600);
        assert_eq!(janitor.sweep().evicted_count(), 2);
        assert_eq!(janitor.sweep().evicted_count(), 0);
        assert!(fx.store.is_empty());
    }

    #[test]
    fn test_missing_directory_does_not_block_eviction() {
        let fx = Fixture::new();
        let (id, dir) = fx.job_with_dir("gone");
        fs::remove_dir_all(&dir).unwrap();
        fx.advance_secs(120);

        let report = fx.janitor(60).sweep();

        assert_eq!(report.evicted, vec![id]);
        assert_eq!(report.cleanup_warnings, 0);
        assert!(!fx.store.contains(id));
    }

    #[test]
    fn test_failed_removal_counts_warning_and_still_evicts() {
        let fx = Fixture::new();
        // A regular file where a directory is expected makes remove_dir_all fail
        let bogus = fx.root.path().join("not_a_dir");
        fs::write(&bogus, "x").unwrap();
        let record = ResultRecord::new("bogus").with_output_directory(&bogus);
        let id = fx.store.insert(record).unwrap();
        fx.advance_secs(120);

        let janitor = fx.janitor(60);
        let report = janitor.sweep();

        assert_eq!(report.evicted, vec![id]);
        assert_eq!(report.cleanup_warnings, 1);
        assert!(!fx.store.contains(id));
        assert_eq!(janitor.metrics().cleanup_warnings, 1);
    }

    #[test]
    fn test_artifacts_without_output_directory() {
        let fx = Fixture::new();
        let loose = fx.root.path().join("loose.csv");
        let missing = fx.root.path().join("never_written.csv");
        fs::write(&loose, "x,y\n").unwrap();
        let record = ResultRecord::new("loose")
            .with_artifact(&loose)
            .with_artifact(&missing);
        let id = fx.store.insert(record).unwrap();
        fx.advance_secs(120);

        let report = fx.janitor(60).sweep();

        assert_eq!(report.evicted, vec![id]);
        assert_eq!(report.cleanup_warnings, 0);
        assert!(!loose.exists());
        assert!(fx.root.path().exists());
    }

    #[test]
    fn test_dry_run_keeps_everything() {
        let fx = Fixture::new();
        let (id, dir) = fx.job_with_dir("keep");
        fx.advance_secs(120);

        let config = JanitorConfig {
            retention_secs: 60,
            dry_run: true,
            ..JanitorConfig::default()
        };
        let report = Janitor::new(fx.store.clone(), config).sweep();

        assert_eq!(report.evicted_count(), 0);
        assert_eq!(report.skipped, vec![id]);
        assert!(fx.store.contains(id));
        assert!(dir.exists());
    }

    #[test]
    fn test_metrics_recorded() {
        let fx = Fixture::new();
        fx.job_with_dir("one");
        fx.advance_secs(120);

        let janitor = fx.janitor(60);
        janitor.sweep();
        janitor.sweep();

        let metrics = janitor.metrics();
        assert_eq!(metrics.sweep_count, 2);
        assert_eq!(metrics.total_evicted, 1);
        assert!(metrics.last_sweep_at.is_some());

        janitor.reset_metrics();
        assert_eq!(janitor.metrics().sweep_count, 0);
    }

    #[test]
    fn test_concurrent_sweeps_evict_once() {
        let fx = Fixture::new();
        for i in 0..20 {
            fx.job_with_dir(&format!("job{i}"));
        }
        fx.advance_secs(120);

        let janitor = fx.janitor(60);
        let total: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| janitor.sweep().evicted_count()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(total, 20);
        assert!(fx.store.is_empty());
    }
}
