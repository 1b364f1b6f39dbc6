//! Metrics collection for Janitor operations

use chrono::{DateTime, Utc};

/// Metrics collected across sweeps
#[derive(Debug, Clone, Default)]
pub struct JanitorMetrics {
    /// Total sweep iterations completed
    pub sweep_count: usize,

    /// Jobs evicted across all sweeps
    pub total_evicted: usize,

    /// File-system cleanups that failed (entries were still evicted)
    pub cleanup_warnings: usize,

    /// Total runtime in milliseconds
    pub total_runtime_ms: u64,

    /// When the most recent sweep finished
    pub last_sweep_at: Option<DateTime<Utc>>,
}

impl JanitorMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished sweep
    pub fn record_sweep(&mut self, evicted: usize, warnings: usize, runtime_ms: u64, at: DateTime<Utc>) {
        self.sweep_count += 1;
        self.total_evicted += evicted;
        self.cleanup_warnings += warnings;
        self.total_runtime_ms += runtime_ms;
        self.last_sweep_at = Some(at);
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let last = self
            .last_sweep_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());

        [
            "Janitor Metrics Summary".to_string(),
            "======================".to_string(),
            format!("Sweep cycles: {}", self.sweep_count),
            format!("Jobs evicted: {}", self.total_evicted),
            format!("Cleanup warnings: {}", self.cleanup_warnings),
            format!("Total runtime: {}ms", self.total_runtime_ms),
            format!("Last sweep: {}", last),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = JanitorMetrics::new();
        assert_eq!(metrics.sweep_count, 0);
        assert_eq!(metrics.total_evicted, 0);
        assert!(metrics.last_sweep_at.is_none());
    }

    #[test]
    fn test_record_sweep_accumulates() {
        let mut metrics = JanitorMetrics::new();
        let now = Utc::now();
        metrics.record_sweep(3, 1, 12, now);
        metrics.record_sweep(2, 0, 8, now);

        assert_eq!(metrics.sweep_count, 2);
        assert_eq!(metrics.total_evicted, 5);
        assert_eq!(metrics.cleanup_warnings, 1);
        assert_eq!(metrics.total_runtime_ms, 20);
        assert_eq!(metrics.last_sweep_at, Some(now));
    }

    #[test]
    fn test_reset() {
        let mut metrics = JanitorMetrics::new();
        metrics.record_sweep(10, 2, 5, Utc::now());
        metrics.reset();

        assert_eq!(metrics.sweep_count, 0);
        assert_eq!(metrics.total_evicted, 0);
        assert!(metrics.last_sweep_at.is_none());
    }

    #[test]
    fn test_summary() {
        let mut metrics = JanitorMetrics::new();
        metrics.record_sweep(5, 1, 120, Utc::now());

        let summary = metrics.summary();
        assert!(summary.contains("Sweep cycles: 1"));
        assert!(summary.contains("Jobs evicted: 5"));
        assert!(summary.contains("Cleanup warnings: 1"));
        assert!(summary.contains("Total runtime: 120ms"));
    }

    #[test]
    fn test_summary_before_first_sweep() {
        assert!(JanitorMetrics::new().summary().contains("Last sweep: never"));
    }
}
