//! HTTP request handlers
//!
//! Service endpoints, caption text conversion and audio downloads.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::extract::{JsonBody, PathParam};
use crate::error::Result;
use crate::state::AppState;
use crate::subtitle::{self, DialogueLine};

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!("voice-studio v", env!("CARGO_PKG_VERSION"))
}

/// Caption markup to convert
#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub text: String,
}

/// Convert caption markup to plain text
/// POST /api/captions/normalize
pub async fn normalize_caption(
    JsonBody(request): JsonBody<NormalizeRequest>,
) -> Json<TextResponse> {
    Json(TextResponse {
        text: subtitle::normalize_opt(request.text.as_deref()),
    })
}

/// Complete caption script
#[derive(Debug, Deserialize)]
pub struct ParseScriptRequest {
    pub script: String,
}

#[derive(Debug, Serialize)]
pub struct ParseScriptResponse {
    pub count: usize,
    pub lines: Vec<DialogueLine>,
    pub text: String,
}

/// Extract dialogue lines from an ASS/SSA script
/// POST /api/captions/parse
pub async fn parse_caption_script(
    JsonBody(request): JsonBody<ParseScriptRequest>,
) -> Result<Json<ParseScriptResponse>> {
    let lines = subtitle::parse_script(&request.script)?;
    Ok(Json(ParseScriptResponse {
        count: lines.len(),
        text: subtitle::plain_text(&lines),
        lines,
    }))
}

/// Stored audio object
/// GET /api/audio/{key}
pub async fn audio_object(
    State(state): State<Arc<AppState>>,
    PathParam(key): PathParam<String>,
) -> Result<Response> {
    let (data, content_type) = state.audio.get(&key).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    // Keys are never reused, so the content behind a key never changes.
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    Ok((headers, data).into_response())
}
