//! Client configuration
//!
//! Configuration is plain data: credentials for the token grant, the two
//! service hosts, and tuning for the upload subsystem. It can be built in
//! code or loaded from a TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CiError, Result};

/// Default API host for metadata and management operations
pub const DEFAULT_API_BASE: &str = "https://api.cimediacloud.com";

/// Default host for upload traffic
pub const DEFAULT_UPLOAD_BASE: &str = "https://io.cimediacloud.com";

/// Default multipart chunk size: 10 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// Files at or above this size are uploaded in parts: 5 MiB
pub const MULTIPART_THRESHOLD: u64 = 5 * 1024 * 1024;

/// Default number of part-upload workers
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Log verbosity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Tuning for the chunked upload subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Size of each part in bytes (default 10 MiB)
    pub chunk_size: usize,

    /// Transfer parts through the worker pool instead of sequentially
    pub parallel: bool,

    /// Number of pool workers (fixed for the lifetime of an upload)
    pub worker_count: usize,

    /// Retry attempts per part for transient network failures
    pub max_retries: u32,

    /// Base delay between part retries, in seconds
    pub retry_delay_secs: u64,

    /// Double the retry delay on each attempt
    pub exponential_backoff: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            parallel: true,
            worker_count: DEFAULT_WORKER_COUNT,
            max_retries: 3,
            retry_delay_secs: 1,
            exponential_backoff: true,
        }
    }
}

/// Ci client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiConfig {
    /// OAuth2 client id
    pub client_id: String,

    /// OAuth2 client secret
    pub client_secret: String,

    /// Account username (password-grant credential)
    pub username: String,

    /// Account password (password-grant credential)
    pub password: String,

    /// Workspace to operate in; when absent the personal workspace is discovered
    #[serde(default)]
    pub workspace_id: Option<String>,

    /// API host override
    #[serde(default = "default_api_base")]
    pub api_base_url: String,

    /// Upload host override
    #[serde(default = "default_upload_base")]
    pub upload_base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Log verbosity
    #[serde(default)]
    pub log_level: LogLevel,

    /// Write structured logs to this file instead of stdout
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Upload tuning
    #[serde(default)]
    pub upload: UploadConfig,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_upload_base() -> String {
    DEFAULT_UPLOAD_BASE.to_string()
}

fn default_timeout() -> u64 {
    300
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            workspace_id: None,
            api_base_url: default_api_base(),
            upload_base_url: default_upload_base(),
            timeout_seconds: default_timeout(),
            log_level: LogLevel::default(),
            log_file: None,
            upload: UploadConfig::default(),
        }
    }
}

impl CiConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CiError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let config: CiConfig = toml::from_str(&contents)
            .map_err(|e| CiError::Config(format!("Invalid config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(CiError::Config("client_id cannot be empty".to_string()));
        }
        if self.client_secret.is_empty() {
            return Err(CiError::Config("client_secret cannot be empty".to_string()));
        }
        if self.username.is_empty() {
            return Err(CiError::Config("username cannot be empty".to_string()));
        }
        if self.password.is_empty() {
            return Err(CiError::Config("password cannot be empty".to_string()));
        }

        Url::parse(&self.api_base_url)
            .map_err(|e| CiError::Config(format!("Invalid api_base_url: {}", e)))?;
        Url::parse(&self.upload_base_url)
            .map_err(|e| CiError::Config(format!("Invalid upload_base_url: {}", e)))?;

        if self.upload.chunk_size == 0 {
            return Err(CiError::Config("chunk_size must be at least 1".to_string()));
        }
        if self.upload.worker_count == 0 {
            return Err(CiError::Config(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(CiError::Config(
                "timeout_seconds must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> CiConfig {
        CiConfig {
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = CiConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE);
        assert_eq!(config.upload_base_url, DEFAULT_UPLOAD_BASE);
        assert_eq!(config.upload.chunk_size, 10 * 1024 * 1024);
        assert_eq!(config.upload.worker_count, 4);
        assert!(config.upload.parallel);
        assert_eq!(config.timeout_seconds, 300);
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_credentials() {
        let mut config = valid_config();
        config.client_id.clear();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.password.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let mut config = valid_config();
        config.api_base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_tuning() {
        let mut config = valid_config();
        config.upload.chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.upload.worker_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_file() {
        let toml_str = r#"
            client_id = "cid"
            client_secret = "secret"
            username = "user"
            password = "pass"
            workspace_id = "ws1"

            [upload]
            chunk_size = 1048576
            parallel = false
            worker_count = 2
        "#;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml_str.as_bytes()).unwrap();

        let config = CiConfig::from_file(file.path()).unwrap();
        assert_eq!(config.workspace_id.as_deref(), Some("ws1"));
        assert_eq!(config.upload.chunk_size, 1048576);
        assert!(!config.upload.parallel);
        assert_eq!(config.upload.worker_count, 2);
        // Unspecified fields fall back to defaults
        assert_eq!(config.upload.max_retries, 3);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE);
    }

    #[test]
    fn test_from_file_missing_path() {
        let err = CiConfig::from_file(Path::new("/nonexistent/ci.toml")).unwrap_err();
        assert!(matches!(err, CiError::Config(_)));
    }

    #[test]
    fn test_roundtrip_serialization() {
        let config = valid_config();
        let toml = toml::to_string(&config).unwrap();
        let deserialized: CiConfig = toml::from_str(&toml).unwrap();
        assert_eq!(deserialized.client_id, config.client_id);
        assert_eq!(deserialized.upload.chunk_size, config.upload.chunk_size);
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Debug.to_tracing_level(), tracing::Level::DEBUG);
    }
}
