//! Configuration for Janitor operations
//!
//! Defines the retention window and the background sweep interval.

use crate::JanitorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Janitor
///
/// # Examples
///
/// ```
/// use folio_janitor::JanitorConfig;
///
/// // Default configuration: keep jobs for an hour
/// let config = JanitorConfig::default();
/// assert_eq!(config.retention_secs, 3600);
///
/// // Aggressive cleanup
/// let config = JanitorConfig::aggressive();
/// assert_eq!(config.retention_secs, 900);
///
/// // Lenient cleanup
/// let config = JanitorConfig::lenient();
/// assert_eq!(config.retention_secs, 86400);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JanitorConfig {
    /// How long a job is kept after creation (in seconds)
    /// Default: 3600 (1 hour)
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// How often the background worker sweeps (in seconds)
    /// Default: 300 (5 minutes)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Run the background worker in addition to on-demand sweeps
    /// Default: true
    #[serde(default = "default_background_sweep")]
    pub background_sweep: bool,

    /// Dry-run mode: Log what would be evicted without evicting
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,
}

fn default_retention_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_background_sweep() -> bool {
    true
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            background_sweep: default_background_sweep(),
            dry_run: false,
        }
    }
}

impl JanitorConfig {
    /// Aggressive cleanup: 15 minute retention, sweep every minute
    ///
    /// Suitable for shared hosts where disk space is tight.
    pub fn aggressive() -> Self {
        Self {
            retention_secs: 900,
            sweep_interval_secs: 60,
            ..Self::default()
        }
    }

    /// Lenient cleanup: keep jobs for a day, sweep every 30 minutes
    pub fn lenient() -> Self {
        Self {
            retention_secs: 86400,
            sweep_interval_secs: 1800,
            ..Self::default()
        }
    }

    /// Retention window as Duration
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Reject settings that would evict everything immediately or spin the worker
    pub fn validate(&self) -> Result<(), JanitorError> {
        if self.retention_secs == 0 {
            return Err(JanitorError::Config(
                "retention_secs must be greater than zero".to_string(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(JanitorError::Config(
                "sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
