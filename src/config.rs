//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the project snapshot
    pub data_dir: PathBuf,

    /// Directory holding synthesized audio objects
    pub audio_dir: PathBuf,

    /// Maximum size of a single stored audio object in megabytes
    pub max_object_mb: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            audio_dir: PathBuf::from("data/audio"),
            max_object_mb: 50,
        }
    }
}

impl StorageConfig {
    /// Get maximum object size in bytes
    pub fn max_object_bytes(&self) -> usize {
        self.max_object_mb * 1024 * 1024
    }

    /// Path of the project snapshot file
    pub fn projects_file(&self) -> PathBuf {
        self.data_dir.join("projects.json")
    }
}

/// Upstream TTS inference API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Base URL of the inference API, without trailing slash
    pub base_url: String,

    /// Bearer token sent with every upstream request
    pub api_key: Option<String>,

    /// Per-attempt request timeout in seconds
    pub timeout_secs: u64,

    /// Total attempts per request, including the first one
    pub max_attempts: u32,

    /// Backoff before the first retry in milliseconds
    pub initial_backoff_ms: u64,

    /// Upper bound for the backoff between retries in milliseconds
    pub max_backoff_ms: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            api_key: None,
            timeout_secs: 120, // voice cloning on CPU is slow
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8000,
        }
    }
}

impl TtsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,

    /// Maximum request body size in MB
    pub max_request_size_mb: usize,

    /// Storage configuration
    pub storage: StorageConfig,

    /// TTS upstream configuration
    pub tts: TtsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            max_request_size_mb: 25,
            storage: StorageConfig::default(),
            tts: TtsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get maximum request body size in bytes
    pub fn max_request_bytes(&self) -> usize {
        self.max_request_size_mb * 1024 * 1024
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("VOICE_STUDIO_TTS_API_KEY") {
            if !key.is_empty() {
                self.tts.api_key = Some(key);
            }
        }
    }
}
