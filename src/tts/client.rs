//! HTTP client for the TTS inference API
//!
//! Two upstream endpoints are used:
//! - `POST {base}/synthesize` with a JSON body `{ text, voice_id, format }`
//! - `POST {base}/clone` with a multipart form (`name`, `sample`, `text`)
//!
//! Both answer with the audio bytes; the content type comes from the
//! response header and a cloned voice id, when the upstream assigns one,
//! from `x-voice-id`.

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use super::retry::{with_retry, RetryPolicy};
use crate::config::TtsConfig;
use crate::error::{Result, StudioError};
use crate::subtitle::normalize;

const USER_AGENT: &str = concat!("voice-studio/", env!("CARGO_PKG_VERSION"));

/// Response header carrying the id of a newly cloned voice
pub const VOICE_ID_HEADER: &str = "x-voice-id";

/// Upstream error bodies are cut to this many characters in errors and logs
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Text-to-speech request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: Option<String>,
    /// Requested audio format (mp3, wav, ...); upstream default when absent
    pub format: Option<String>,
}

/// Voice cloning request built from an uploaded reference sample
#[derive(Debug, Clone)]
pub struct CloneRequest {
    pub name: String,
    pub sample: Bytes,
    pub sample_filename: String,
    pub sample_content_type: String,
    /// Text to speak with the cloned voice
    pub text: Option<String>,
}

/// Audio returned by the upstream
#[derive(Debug, Clone)]
pub struct AudioPayload {
    pub data: Bytes,
    pub content_type: String,
    pub voice_id: Option<String>,
}

/// Client for the TTS inference API
#[derive(Debug, Clone)]
pub struct TtsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl TtsClient {
    pub fn new(config: &TtsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| StudioError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http.post(url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Synthesize speech. Caption markup in the text is normalized first.
    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioPayload> {
        let text = normalize(&request.text);
        if text.trim().is_empty() {
            return Err(StudioError::Validation("text to synthesize is empty".into()));
        }

        let body = SynthesisRequest {
            text,
            voice_id: request.voice_id.clone(),
            format: request.format.clone(),
        };
        let url = self.endpoint("synthesize");
        tracing::debug!(url = %url, chars = body.text.len(), "Forwarding synthesis request");

        with_retry(&self.retry, "TTS synthesize", |_| {
            let send = self.post(&url).json(&body).send();
            async move { read_audio(send.await?).await }
        })
        .await
    }

    /// Clone a voice from a reference sample
    pub async fn clone_voice(&self, request: &CloneRequest) -> Result<AudioPayload> {
        if request.sample.is_empty() {
            return Err(StudioError::Validation("voice sample is empty".into()));
        }
        let text = request.text.as_deref().map(normalize);

        let url = self.endpoint("clone");
        tracing::debug!(
            url = %url,
            name = %request.name,
            sample_bytes = request.sample.len(),
            "Forwarding voice clone request"
        );

        with_retry(&self.retry, "TTS clone", |_| {
            // A multipart form is consumed by sending, so each attempt builds its own.
            let form = build_clone_form(request, text.as_deref());
            let builder = self.post(&url);
            async move { read_audio(builder.multipart(form?).send().await?).await }
        })
        .await
    }
}

fn build_clone_form(request: &CloneRequest, text: Option<&str>) -> Result<Form> {
    let sample = Part::bytes(request.sample.to_vec())
        .file_name(request.sample_filename.clone())
        .mime_str(&request.sample_content_type)
        .map_err(|e| {
            StudioError::Validation(format!(
                "invalid sample content type {:?}: {}",
                request.sample_content_type, e
            ))
        })?;

    let mut form = Form::new()
        .text("name", request.name.clone())
        .part("sample", sample);
    if let Some(text) = text {
        form = form.text("text", text.to_string());
    }
    Ok(form)
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

async fn read_audio(response: reqwest::Response) -> Result<AudioPayload> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StudioError::Upstream {
            status: status.as_u16(),
            body: truncate(&body),
        });
    }

    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    };
    let content_type =
        header(CONTENT_TYPE.as_str()).unwrap_or_else(|| "application/octet-stream".to_string());
    let voice_id = header(VOICE_ID_HEADER).filter(|v| !v.is_empty());

    let data = response.bytes().await?;
    if data.is_empty() {
        return Err(StudioError::Upstream {
            status: status.as_u16(),
            body: "empty audio response".to_string(),
        });
    }

    Ok(AudioPayload {
        data,
        content_type,
        voice_id,
    })
}
