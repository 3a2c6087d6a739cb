//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - Project store
//! - Audio object store
//! - TTS upstream client
//! - Server configuration

use crate::config::ServerConfig;
use crate::error::Result;
use crate::project::ProjectStore;
use crate::storage::AudioStore;
use crate::tts::TtsClient;

/// Application state shared across all handlers
pub struct AppState {
    /// Projects (id -> Project)
    pub projects: ProjectStore,

    /// Synthesized audio objects
    pub audio: AudioStore,

    /// TTS inference API client
    pub tts: TtsClient,

    /// Server configuration
    pub config: ServerConfig,
}

impl AppState {
    /// Open the state described by the configuration, loading the project
    /// snapshot from the data directory.
    pub async fn open(config: ServerConfig) -> Result<Self> {
        let projects = ProjectStore::load(config.storage.projects_file()).await?;
        Self::with_store(config, projects)
    }

    /// Create state whose projects are not persisted
    pub fn in_memory(config: ServerConfig) -> Result<Self> {
        Self::with_store(config, ProjectStore::in_memory())
    }

    fn with_store(config: ServerConfig, projects: ProjectStore) -> Result<Self> {
        Ok(Self {
            projects,
            audio: AudioStore::from_config(&config.storage),
            tts: TtsClient::new(&config.tts)?,
            config,
        })
    }
}
