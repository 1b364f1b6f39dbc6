//! Configuration file parsing for the server.
//!
//! Loads settings from TOML files including bind address, upload limits,
//! retention and the extraction engine to use.

use folio_engine::remote::MAX_RETRIES_LIMIT;
use folio_janitor::JanitorConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value is present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (e.g., 5000)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Where uploaded documents are held while the engine runs
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Root for temporary download archives (system temp dir when unset)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,

    /// Maximum request body size for uploads
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Accepted upload extensions, compared case-insensitively
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Retention sweeper settings
    #[serde(default)]
    pub janitor: JanitorConfig,

    /// Extraction engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Extraction engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Extraction service URL; the built-in mock engine is used when unset
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Root under which each job's output directory is created
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Per-request timeout for the extraction service
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per extraction before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    5000
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

/// 50 MiB
fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["pdf".to_string()]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_timeout_secs() -> u64 {
    folio_engine::remote::DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    folio_engine::remote::DEFAULT_MAX_RETRIES
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            output_dir: default_output_dir(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            upload_dir: default_upload_dir(),
            scratch_dir: None,
            max_upload_bytes: default_max_upload_bytes(),
            allowed_extensions: default_allowed_extensions(),
            janitor: JanitorConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse fine but cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.janitor
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.normalized_extensions().is_empty() {
            return Err(ConfigError::Invalid(
                "allowed_extensions must name at least one extension".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        if let Some(endpoint) = &self.engine.endpoint {
            if endpoint.trim().is_empty() {
                return Err(ConfigError::Invalid("engine.endpoint is empty".to_string()));
            }
        }
        if !(1..=MAX_RETRIES_LIMIT).contains(&self.engine.max_retries) {
            return Err(ConfigError::Invalid(format!(
                "engine.max_retries must be between 1 and {}",
                MAX_RETRIES_LIMIT
            )));
        }
        Ok(())
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }

    /// Root for archive scratch directories
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Allowed extensions, lowercased and without a leading dot
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.allowed_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(config.allowed_extensions, vec!["pdf"]);
        assert_eq!(config.janitor.retention_secs, 3600);
        assert!(config.engine.endpoint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config.bind_port, 5000);
        assert_eq!(config.engine.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            bind_address = "0.0.0.0"
            bind_port = 9000
            upload_dir = "/srv/folio/uploads"
            scratch_dir = "/srv/folio/scratch"
            allowed_extensions = [".PDF", "tiff"]

            [janitor]
            retention_secs = 600
            dry_run = true

            [engine]
            endpoint = "http://extractor:7000"
            max_retries = 5
        "#;

        let config = ServerConfig::from_toml(toml).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.scratch_root(), PathBuf::from("/srv/folio/scratch"));
        assert_eq!(config.normalized_extensions(), vec!["pdf", "tiff"]);
        assert_eq!(config.janitor.retention_secs, 600);
        assert_eq!(config.janitor.sweep_interval_secs, 300);
        assert!(config.janitor.dry_run);
        assert_eq!(config.engine.endpoint.as_deref(), Some("http://extractor:7000"));
        assert_eq!(config.engine.max_retries, 5);
        assert_eq!(config.engine.timeout_secs, 300);
    }

    #[test]
    fn test_rejects_zero_retention() {
        let result = ServerConfig::from_toml("[janitor]\nretention_secs = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_empty_extensions() {
        let result = ServerConfig::from_toml("allowed_extensions = [\"\", \".\"]\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_unreasonable_retries() {
        let result = ServerConfig::from_toml("[engine]\nmax_retries = 70\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = ServerConfig::from_toml("[engine]\nmax_retries = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let config = ServerConfig::from_toml("[engine]\nmax_retries = 10\n").unwrap();
        assert_eq!(config.engine.max_retries, 10);
    }

    #[test]
    fn test_rejects_bad_toml() {
        let result = ServerConfig::from_toml("bind_port = \"not a number\"");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = ServerConfig::from_file("/definitely/not/here/folio.toml");
        assert!(matches!(result, Err(ConfigError::FileRead(_))));
    }
}
