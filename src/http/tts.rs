//! TTS proxy handlers
//!
//! Forward synthesis and cloning requests to the inference API, store the
//! returned audio and attach it to the project it was made for.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::extract::JsonBody;
use crate::error::{Result, StudioError};
use crate::state::AppState;
use crate::storage::StoredObject;
use crate::tts::{AudioPayload, CloneRequest, SynthesisRequest};

/// Synthesis request from the studio
#[derive(Debug, Deserialize)]
pub struct SynthesizeBody {
    /// Text to speak; the project script when absent
    pub text: Option<String>,
    /// Voice to use; the project voice when absent
    pub voice_id: Option<String>,
    pub project_id: Option<Uuid>,
    pub format: Option<String>,
}

/// Stored result of a TTS call
#[derive(Debug, Serialize)]
pub struct AudioResponse {
    pub key: String,
    pub url: String,
    pub content_type: String,
    pub size: usize,
    pub voice_id: Option<String>,
}

impl AudioResponse {
    fn new(stored: StoredObject, voice_id: Option<String>) -> Self {
        Self {
            url: format!("/api/audio/{}", stored.key),
            key: stored.key,
            content_type: stored.content_type,
            size: stored.size,
            voice_id,
        }
    }
}

/// Store upstream audio and link it to the project, if any
async fn store_audio(
    state: &AppState,
    project_id: Option<Uuid>,
    payload: AudioPayload,
) -> Result<AudioResponse> {
    let stored = state.audio.put(payload.data, &payload.content_type).await?;

    if let Some(id) = project_id {
        if let Err(e) = link_audio(state, id, &stored.key, payload.voice_id.as_deref()).await {
            // The project went away while the upstream was busy.
            if let Err(cleanup) = state.audio.delete(&stored.key).await {
                tracing::warn!("Failed to remove unlinked audio {}: {}", stored.key, cleanup);
            }
            return Err(e);
        }
    }

    tracing::info!(
        key = %stored.key,
        size = stored.size,
        project = ?project_id,
        "Stored TTS audio"
    );
    Ok(AudioResponse::new(stored, payload.voice_id))
}

async fn link_audio(
    state: &AppState,
    id: Uuid,
    key: &str,
    voice_id: Option<&str>,
) -> Result<()> {
    state.projects.set_audio(id, key).await?;
    if let Some(voice_id) = voice_id {
        state.projects.set_voice(id, voice_id).await?;
    }
    Ok(())
}

/// Synthesize speech
/// POST /api/tts/synthesize
pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<SynthesizeBody>,
) -> Result<Json<AudioResponse>> {
    let project = body
        .project_id
        .map(|id| state.projects.get(id))
        .transpose()?;

    let text = match (body.text, &project) {
        (Some(text), _) => text,
        (None, Some(project)) => project.script.clone(),
        (None, None) => {
            return Err(StudioError::Validation(
                "either text or project_id is required".into(),
            ))
        }
    };
    let voice_id = body
        .voice_id
        .or_else(|| project.as_ref().and_then(|p| p.voice_id.clone()));

    let payload = state
        .tts
        .synthesize(&SynthesisRequest {
            text,
            voice_id,
            format: body.format,
        })
        .await?;

    Ok(Json(store_audio(&state, body.project_id, payload).await?))
}

/// Clone a voice from an uploaded sample
/// POST /api/tts/clone
///
/// Form fields: `sample` (file), `name`, optional `text`, optional
/// `project_id`.
pub async fn clone_voice(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<AudioResponse>> {
    let mut multipart = multipart?;
    let mut name = None;
    let mut text = None;
    let mut project_id = None;
    let mut sample: Option<(Bytes, String, String)> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("sample") => {
                let filename = field.file_name().unwrap_or("sample").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?;
                sample = Some((data, filename, content_type));
            }
            Some("name") => name = Some(field.text().await?),
            Some("text") => text = Some(field.text().await?),
            Some("project_id") => {
                let raw = field.text().await?;
                let id = Uuid::parse_str(raw.trim()).map_err(|_| {
                    StudioError::Validation(format!("invalid project_id: {:?}", raw))
                })?;
                project_id = Some(id);
            }
            other => tracing::debug!("Ignoring multipart field {:?}", other),
        }
    }

    let (sample, sample_filename, sample_content_type) = sample
        .filter(|(data, _, _)| !data.is_empty())
        .ok_or_else(|| StudioError::Validation("a non-empty sample file is required".into()))?;
    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| StudioError::Validation("a voice name is required".into()))?;

    if let Some(id) = project_id {
        // Fail before the expensive upstream call.
        state.projects.get(id)?;
    }

    let payload = state
        .tts
        .clone_voice(&CloneRequest {
            name,
            sample,
            sample_filename,
            sample_content_type,
            text,
        })
        .await?;

    Ok(Json(store_audio(&state, project_id, payload).await?))
}
