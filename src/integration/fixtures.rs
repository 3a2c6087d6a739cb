//! Test fixtures for integration tests
//!
//! Provides a fake TTS inference API on a local port and helpers for
//! building studio state and multipart bodies against it.

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::{ServerConfig, StorageConfig, TtsConfig};
use crate::tts::client::VOICE_ID_HEADER;
use crate::tts::SynthesisRequest;

/// Audio the fake upstream returns for synthesis
pub const SYNTH_AUDIO: &[u8] = b"ID3fake-mp3";

/// Audio the fake upstream returns for cloning
pub const CLONE_AUDIO: &[u8] = b"RIFFfake-wav";

/// Voice id the fake upstream assigns to cloned voices
pub const CLONED_VOICE_ID: &str = "voice-42";

/// Fake TTS upstream.
///
/// The first `fail_first` requests answer 503. A synthesis request for the
/// voice `unknown` answers 422.
#[derive(Debug, Default)]
pub struct FakeUpstream {
    pub calls: AtomicUsize,
    pub fail_first: usize,
    pub last_text: Mutex<Option<String>>,
    pub last_voice: Mutex<Option<String>>,
    pub last_auth: Mutex<Option<String>>,
}

impl FakeUpstream {
    pub fn failing_first(n: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_first: n,
            ..Default::default()
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_text(&self) -> Option<String> {
        self.last_text.lock().unwrap().clone()
    }

    pub fn last_voice(&self) -> Option<String> {
        self.last_voice.lock().unwrap().clone()
    }

    pub fn last_auth(&self) -> Option<String> {
        self.last_auth.lock().unwrap().clone()
    }

    fn should_fail(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst) < self.fail_first
    }
}

async fn fake_synthesize(
    State(up): State<Arc<FakeUpstream>>,
    headers: HeaderMap,
    Json(req): Json<SynthesisRequest>,
) -> Response {
    *up.last_auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    if up.should_fail() {
        return (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response();
    }
    if req.voice_id.as_deref() == Some("unknown") {
        return (StatusCode::UNPROCESSABLE_ENTITY, "unknown voice").into_response();
    }
    *up.last_text.lock().unwrap() = Some(req.text);
    *up.last_voice.lock().unwrap() = req.voice_id;
    ([("content-type", "audio/mpeg")], SYNTH_AUDIO).into_response()
}

async fn fake_clone(State(up): State<Arc<FakeUpstream>>, mut multipart: Multipart) -> Response {
    if up.should_fail() {
        return (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response();
    }

    let mut name = None;
    let mut sample_len = 0;
    let mut text = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("name") => name = field.text().await.ok(),
            Some("sample") => sample_len = field.bytes().await.map(|b| b.len()).unwrap_or(0),
            Some("text") => text = field.text().await.ok(),
            _ => {}
        }
    }
    if name.is_none() || sample_len == 0 {
        return (StatusCode::BAD_REQUEST, "missing fields").into_response();
    }

    *up.last_text.lock().unwrap() = text;
    (
        [
            ("content-type", "audio/wav"),
            (VOICE_ID_HEADER, CLONED_VOICE_ID),
        ],
        CLONE_AUDIO,
    )
        .into_response()
}

/// Serve the fake upstream on a free local port and return its base URL
pub async fn spawn_upstream(up: Arc<FakeUpstream>) -> String {
    let app = Router::new()
        .route("/synthesize", post(fake_synthesize))
        .route("/clone", post(fake_clone))
        .with_state(up);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/", addr)
}

/// Upstream settings with short timeouts and near-zero backoff
pub fn fast_tts_config(base_url: String) -> TtsConfig {
    TtsConfig {
        base_url,
        api_key: None,
        timeout_secs: 5,
        max_attempts: 3,
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
    }
}

/// Server configuration storing everything under `dir`
pub fn test_config(dir: &Path, base_url: String) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        storage: StorageConfig {
            data_dir: dir.to_path_buf(),
            audio_dir: dir.join("audio"),
            max_object_mb: 1,
        },
        tts: fast_tts_config(base_url),
        ..Default::default()
    }
}

/// A file part for [`multipart_body`]
pub struct FilePart<'a> {
    pub field: &'a str,
    pub filename: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

pub const BOUNDARY: &str = "voice-studio-test-boundary";

/// Build a `multipart/form-data` body using [`BOUNDARY`]
pub fn multipart_body(texts: &[(&str, &str)], file: Option<FilePart<'_>>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in texts {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file.field, file.filename, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Content type header value matching [`multipart_body`]
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_body_layout() {
        let body = multipart_body(
            &[("name", "Narrator")],
            Some(FilePart {
                field: "sample",
                filename: "a.wav",
                content_type: "audio/wav",
                data: b"RIFF",
            }),
        );
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with(&format!("--{}\r\n", BOUNDARY)));
        assert!(text.contains("name=\"name\"\r\n\r\nNarrator\r\n"));
        assert!(text.contains("filename=\"a.wav\"\r\nContent-Type: audio/wav\r\n\r\nRIFF\r\n"));
        assert!(text.ends_with(&format!("--{}--\r\n", BOUNDARY)));
    }

    #[test]
    fn test_config_paths() {
        let config = test_config(Path::new("/tmp/studio"), "http://up".to_string());
        assert_eq!(config.storage.audio_dir, Path::new("/tmp/studio/audio"));
        assert_eq!(config.tts.max_attempts, 3);
    }

    #[tokio::test]
    async fn test_fake_upstream_failure_counter() {
        let up = FakeUpstream::failing_first(1);
        assert!(up.should_fail());
        assert!(!up.should_fail());
        assert_eq!(up.call_count(), 2);
    }
}
