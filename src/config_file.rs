//! Configuration file support
//!
//! Loads server configuration from TOML files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{ServerConfig, StorageConfig, TtsConfig};
use crate::error::{Result, StudioError};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Storage settings
    pub storage: Option<StorageSettings>,
    /// TTS upstream settings
    pub tts: Option<TtsSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
    /// Limits settings
    pub limits: Option<LimitsSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory for the project snapshot
    pub data_dir: PathBuf,
    /// Directory for audio objects (defaults to `<data_dir>/audio`)
    pub audio_dir: Option<PathBuf>,
    /// Maximum audio object size in MB
    pub max_object_mb: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsSettings {
    /// Inference API base URL
    pub base_url: String,
    /// Bearer token for the inference API
    pub api_key: Option<String>,
    /// Per-attempt timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Total attempts per request
    pub max_attempts: Option<u32>,
    /// First retry backoff in milliseconds
    pub initial_backoff_ms: Option<u64>,
    /// Backoff ceiling in milliseconds
    pub max_backoff_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSettings {
    /// Maximum request body size in MB
    pub max_request_size_mb: Option<usize>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let storage = StorageConfig::default();
        let tts = TtsConfig::default();
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_enabled: Some(true),
            },
            storage: Some(StorageSettings {
                data_dir: storage.data_dir,
                audio_dir: Some(storage.audio_dir),
                max_object_mb: Some(storage.max_object_mb),
            }),
            tts: Some(TtsSettings {
                base_url: tts.base_url,
                api_key: None,
                timeout_secs: Some(tts.timeout_secs),
                max_attempts: Some(tts.max_attempts),
                initial_backoff_ms: Some(tts.initial_backoff_ms),
                max_backoff_ms: Some(tts.max_backoff_ms),
            }),
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some("pretty".to_string()),
            }),
            limits: Some(LimitsSettings {
                max_request_size_mb: Some(25),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();

        let storage = match self.storage {
            Some(s) => StorageConfig {
                audio_dir: s.audio_dir.unwrap_or_else(|| s.data_dir.join("audio")),
                data_dir: s.data_dir,
                max_object_mb: s.max_object_mb.unwrap_or(defaults.storage.max_object_mb),
            },
            None => defaults.storage,
        };

        let tts = match self.tts {
            Some(t) => TtsConfig {
                base_url: t.base_url.trim_end_matches('/').to_string(),
                api_key: t.api_key,
                timeout_secs: t.timeout_secs.unwrap_or(defaults.tts.timeout_secs),
                max_attempts: t.max_attempts.unwrap_or(defaults.tts.max_attempts),
                initial_backoff_ms: t
                    .initial_backoff_ms
                    .unwrap_or(defaults.tts.initial_backoff_ms),
                max_backoff_ms: t.max_backoff_ms.unwrap_or(defaults.tts.max_backoff_ms),
            },
            None => defaults.tts,
        };

        let (log_level, log_format) = match self.logging {
            Some(l) => (l.level, l.format.unwrap_or(defaults.log_format)),
            None => (defaults.log_level, defaults.log_format),
        };

        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level,
            log_format,
            max_request_size_mb: self
                .limits
                .and_then(|l| l.max_request_size_mb)
                .unwrap_or(defaults.max_request_size_mb),
            storage,
            tts,
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}

/// Load the server configuration, falling back to defaults when the file
/// is missing or cannot be parsed.
///
/// Logging is configured from the result, so a load failure is handed back
/// to the caller to report once a subscriber is installed.
pub fn load_server_config<P: AsRef<Path>>(path: P) -> (ServerConfig, Option<StudioError>) {
    let path = path.as_ref();
    let (mut config, error) = if path.exists() {
        match ConfigFile::from_file(path) {
            Ok(cf) => (cf.into_server_config(), None),
            Err(e) => (
                ServerConfig::default(),
                Some(StudioError::Config(format!(
                    "failed to load {}: {}",
                    path.display(),
                    e
                ))),
            ),
        }
    } else {
        (ServerConfig::default(), None)
    };
    config.apply_env();
    (config, error)
}
