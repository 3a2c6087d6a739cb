//! Project store
//!
//! Projects live in a concurrent map keyed by id. When the store is opened
//! with a snapshot path, every mutation rewrites the snapshot as a JSON
//! array so a restart picks up where the last run left off.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Result, StudioError};

/// Longest accepted project name, in characters
pub const MAX_NAME_CHARS: usize = 200;

/// A voice-cloning project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Caption script being edited (ASS markup allowed)
    pub script: String,
    /// Voice used for synthesis, as known to the TTS upstream
    pub voice_id: Option<String>,
    /// Key of the latest synthesized audio in the audio store
    pub audio_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a project
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub script: String,
    pub voice_id: Option<String>,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub script: Option<String>,
    pub voice_id: Option<String>,
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StudioError::Validation("project name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(StudioError::Validation(format!(
            "project name exceeds {} characters",
            MAX_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

/// Concurrent project store with optional JSON snapshot
#[derive(Debug, Default)]
pub struct ProjectStore {
    projects: DashMap<Uuid, Project>,
    snapshot: Option<PathBuf>,
    persist_lock: Mutex<()>,
}

impl ProjectStore {
    /// Create an in-memory store
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store backed by a snapshot file. A missing file is an empty
    /// store.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let projects = DashMap::new();

        match tokio::fs::read(&path).await {
            Ok(data) => {
                let list: Vec<Project> = serde_json::from_slice(&data)?;
                for project in list {
                    projects.insert(project.id, project);
                }
                tracing::info!(
                    "Loaded {} project(s) from {}",
                    projects.len(),
                    path.display()
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No project snapshot at {}, starting empty", path.display());
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            projects,
            snapshot: Some(path),
            persist_lock: Mutex::new(()),
        })
    }

    /// Snapshot file, if any
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    /// Number of projects
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Write the snapshot file, if the store has one
    pub async fn persist(&self) -> Result<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let _guard = self.persist_lock.lock().await;

        let mut list: Vec<Project> = self.projects.iter().map(|r| r.value().clone()).collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        let data = serde_json::to_vec_pretty(&list)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Create a project
    pub async fn create(&self, new: NewProject) -> Result<Project> {
        let name = validate_name(&new.name)?;
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name,
            description: new.description,
            script: new.script,
            voice_id: new.voice_id,
            audio_key: None,
            created_at: now,
            updated_at: now,
        };

        self.projects.insert(project.id, project.clone());
        if let Err(e) = self.persist().await {
            self.projects.remove_if(&project.id, |_, p| p == &project);
            return Err(e);
        }

        tracing::info!(id = %project.id, name = %project.name, "Created project");
        Ok(project)
    }

    /// List projects, most recently updated first
    pub fn list(&self, offset: usize, limit: usize) -> Vec<Project> {
        let mut list: Vec<Project> = self.projects.iter().map(|r| r.value().clone()).collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        list.into_iter().skip(offset).take(limit).collect()
    }

    /// Get a project by id
    pub fn get(&self, id: Uuid) -> Result<Project> {
        self.projects
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| StudioError::ProjectNotFound(id.to_string()))
    }

    /// Apply `f` to a project and persist the result. When the snapshot
    /// cannot be written the previous version is put back, unless another
    /// change has replaced it in the meantime.
    async fn modify<F>(&self, id: Uuid, f: F) -> Result<Project>
    where
        F: FnOnce(&mut Project) -> Result<()>,
    {
        let (previous, project) = {
            let mut entry = self
                .projects
                .get_mut(&id)
                .ok_or_else(|| StudioError::ProjectNotFound(id.to_string()))?;
            let previous = entry.value().clone();
            let mut project = previous.clone();
            f(&mut project)?;
            project.updated_at = Utc::now().max(project.updated_at);
            *entry = project.clone();
            (previous, project)
        };

        if let Err(e) = self.persist().await {
            if let Some(mut entry) = self.projects.get_mut(&id) {
                if *entry == project {
                    *entry = previous;
                }
            }
            return Err(e);
        }
        Ok(project)
    }

    /// Apply a partial update
    pub async fn update(&self, id: Uuid, update: ProjectUpdate) -> Result<Project> {
        let name = update.name.as_deref().map(validate_name).transpose()?;
        let project = self.modify(id, |p| {
            if let Some(name) = name {
                p.name = name;
            }
            if let Some(description) = update.description {
                p.description = Some(description);
            }
            if let Some(script) = update.script {
                p.script = script;
            }
            if let Some(voice_id) = update.voice_id {
                p.voice_id = Some(voice_id);
            }
            Ok(())
        })
        .await?;

        tracing::debug!(id = %id, "Updated project");
        Ok(project)
    }

    /// Record the latest synthesized audio of a project
    pub async fn set_audio(&self, id: Uuid, key: &str) -> Result<Project> {
        self.modify(id, |p| {
            p.audio_key = Some(key.to_string());
            Ok(())
        })
        .await
    }

    /// Record the voice produced by a cloning run
    pub async fn set_voice(&self, id: Uuid, voice_id: &str) -> Result<Project> {
        self.modify(id, |p| {
            p.voice_id = Some(voice_id.to_string());
            Ok(())
        })
        .await
    }

    /// Delete a project and return it
    pub async fn delete(&self, id: Uuid) -> Result<Project> {
        let (_, project) = self
            .projects
            .remove(&id)
            .ok_or_else(|| StudioError::ProjectNotFound(id.to_string()))?;
        if let Err(e) = self.persist().await {
            self.projects.entry(id).or_insert(project);
            return Err(e);
        }

        tracing::info!(id = %id, "Deleted project");
        Ok(project)
    }
}
