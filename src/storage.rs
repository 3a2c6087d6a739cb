//! Audio object store
//!
//! Synthesized audio is written to a directory on disk, one file per
//! object. Keys are `<uuid>.<ext>`; the extension carries the content type
//! so no separate metadata has to be stored.

use bytes::Bytes;
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{Result, StudioError};

/// A stored audio object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub size: usize,
}

/// Map a content type onto the file extension used for its keys
pub fn extension_for(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/ogg" => "ogg",
        "audio/flac" | "audio/x-flac" => "flac",
        _ => "bin",
    }
}

/// Map a key's extension back onto a content type
pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit_once('.').map(|(_, ext)| ext) {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// Check that a key names a file directly inside the store
pub fn validate_key(key: &str) -> Result<()> {
    if regex!(r"^[A-Za-z0-9_-]+\.[a-z0-9]+$").is_match(key) {
        Ok(())
    } else {
        Err(StudioError::Validation(format!("invalid object key: {:?}", key)))
    }
}

/// Filesystem-backed store for audio objects
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
    max_object_bytes: usize,
}

impl AudioStore {
    /// Create a store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>, max_object_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_object_bytes,
        }
    }

    /// Create a store from the storage configuration
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.audio_dir.clone(), config.max_object_bytes())
    }

    /// Root directory of the store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }

    /// Store a new object and return its key
    pub async fn put(&self, data: Bytes, content_type: &str) -> Result<StoredObject> {
        if data.len() > self.max_object_bytes {
            return Err(StudioError::PayloadTooLarge {
                size: data.len(),
                limit: self.max_object_bytes,
            });
        }

        let key = format!("{}.{}", Uuid::new_v4(), extension_for(content_type));
        let path = self.path_for(&key)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        // Write under a temporary name so readers never see a partial file.
        let tmp = self.dir.join(format!(".{}.tmp", key));
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(key = %key, size = data.len(), "Stored audio object");

        Ok(StoredObject {
            content_type: content_type_for(&key).to_string(),
            key,
            size: data.len(),
        })
    }

    /// Read an object
    pub async fn get(&self, key: &str) -> Result<(Bytes, &'static str)> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok((Bytes::from(data), content_type_for(key))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StudioError::ObjectNotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove an object
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key = %key, "Deleted audio object");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StudioError::ObjectNotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
