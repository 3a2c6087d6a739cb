//! End-to-end integration tests

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use axum::Router;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    use crate::http::create_router;
    use crate::integration::fixtures::{
        multipart_body, multipart_content_type, spawn_upstream, test_config, FakeUpstream,
        FilePart, CLONED_VOICE_ID, CLONE_AUDIO, SYNTH_AUDIO,
    };
    use crate::state::AppState;

    struct Studio {
        app: Router,
        state: Arc<AppState>,
        upstream: Arc<FakeUpstream>,
        _dir: TempDir,
    }

    async fn studio() -> Studio {
        let dir = TempDir::new().unwrap();
        let upstream = Arc::new(FakeUpstream::default());
        let base_url = spawn_upstream(upstream.clone()).await;
        let state = Arc::new(
            AppState::open(test_config(dir.path(), base_url))
                .await
                .unwrap(),
        );
        Studio {
            app: create_router(state.clone()),
            state,
            upstream,
            _dir: dir,
        }
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_of(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn clone_request(app: &Router, body: Vec<u8>) -> Response {
        let request = Request::post("/api/tts/clone")
            .header(header::CONTENT_TYPE, multipart_content_type())
            .body(Body::from(body))
            .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_project_lifecycle() {
        let s = studio().await;

        let response = send(
            &s.app,
            Method::POST,
            "/api/projects",
            Some(json!({ "name": "Chapter 1", "script": "{\\an8}Once{\\i1}upon a time\\Nthe end" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let project = json_of(response).await;
        let id = project["id"].as_str().unwrap().to_string();
        assert_eq!(project["name"], "Chapter 1");

        let response = send(&s.app, Method::GET, &format!("/api/projects/{}/preview", id), None).await;
        assert_eq!(json_of(response).await["text"], "Once upon a time\nthe end");

        let response = send(
            &s.app,
            Method::PATCH,
            &format!("/api/projects/{}", id),
            Some(json!({ "description": "draft" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_of(response).await["description"], "draft");

        send(&s.app, Method::POST, "/api/projects", Some(json!({ "name": "Chapter 2" }))).await;
        let response = send(&s.app, Method::GET, "/api/projects?limit=1", None).await;
        let list = json_of(response).await;
        assert_eq!(list["count"], 1);
        assert_eq!(list["projects"][0]["name"], "Chapter 2");

        let response = send(&s.app, Method::DELETE, &format!("/api/projects/{}", id), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = send(&s.app, Method::GET, &format!("/api/projects/{}", id), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_project_validation() {
        let s = studio().await;
        let response = send(&s.app, Method::POST, "/api/projects", Some(json!({ "name": "  " }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&s.app, Method::GET, "/api/projects/not-a-uuid", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_synthesize_for_project() {
        let s = studio().await;

        let project = json_of(
            send(
                &s.app,
                Method::POST,
                "/api/projects",
                Some(json!({ "name": "Promo", "script": "Buy{\\b1}now!", "voice_id": "v7" })),
            )
            .await,
        )
        .await;
        let id = project["id"].as_str().unwrap().to_string();

        let response = send(
            &s.app,
            Method::POST,
            "/api/tts/synthesize",
            Some(json!({ "project_id": id })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let audio = json_of(response).await;
        let key = audio["key"].as_str().unwrap().to_string();
        assert!(key.ends_with(".mp3"));
        assert_eq!(audio["url"], format!("/api/audio/{}", key));
        assert_eq!(audio["size"], SYNTH_AUDIO.len());

        assert_eq!(s.upstream.last_text().as_deref(), Some("Buy now!"));
        assert_eq!(s.upstream.last_voice().as_deref(), Some("v7"));

        let project = json_of(send(&s.app, Method::GET, &format!("/api/projects/{}", id), None).await).await;
        assert_eq!(project["audio_key"], key.as_str());

        let response = send(&s.app, Method::GET, &format!("/api/audio/{}", key), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], SYNTH_AUDIO);

        // Deleting the project removes its audio as well.
        send(&s.app, Method::DELETE, &format!("/api/projects/{}", id), None).await;
        let response = send(&s.app, Method::GET, &format!("/api/audio/{}", key), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_synthesize_errors() {
        let s = studio().await;

        let response = send(&s.app, Method::POST, "/api/tts/synthesize", Some(json!({}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &s.app,
            Method::POST,
            "/api/tts/synthesize",
            Some(json!({ "text": "Hi", "project_id": uuid::Uuid::new_v4() })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &s.app,
            Method::POST,
            "/api/tts/synthesize",
            Some(json!({ "text": "Hi", "voice_id": "unknown" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(json_of(response).await["error"]
            .as_str()
            .unwrap()
            .contains("unknown voice"));

        assert_eq!(s.upstream.call_count(), 1);
    }

    #[tokio::test]
    async fn test_clone_voice_for_project() {
        let s = studio().await;

        let project = json_of(
            send(&s.app, Method::POST, "/api/projects", Some(json!({ "name": "Clone" }))).await,
        )
        .await;
        let id = project["id"].as_str().unwrap().to_string();

        let body = multipart_body(
            &[("name", "Narrator"), ("text", "Hello{\\i1}there"), ("project_id", &id)],
            Some(FilePart {
                field: "sample",
                filename: "reference.wav",
                content_type: "audio/wav",
                data: b"RIFF reference sample",
            }),
        );
        let response = clone_request(&s.app, body).await;
        assert_eq!(response.status(), StatusCode::OK);
        let audio = json_of(response).await;
        assert_eq!(audio["voice_id"], CLONED_VOICE_ID);
        assert_eq!(audio["content_type"], "audio/wav");
        assert_eq!(audio["size"], CLONE_AUDIO.len());
        assert_eq!(s.upstream.last_text().as_deref(), Some("Hello there"));

        let project = s
            .state
            .projects
            .get(uuid::Uuid::parse_str(&id).unwrap())
            .unwrap();
        assert_eq!(project.voice_id.as_deref(), Some(CLONED_VOICE_ID));
        assert_eq!(project.audio_key.as_deref(), audio["key"].as_str());
    }

    #[tokio::test]
    async fn test_clone_voice_validation() {
        let s = studio().await;

        let response = clone_request(&s.app, multipart_body(&[("name", "Narrator")], None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let sample = || FilePart {
            field: "sample",
            filename: "reference.wav",
            content_type: "audio/wav",
            data: b"RIFF",
        };
        let response = clone_request(&s.app, multipart_body(&[], Some(sample()))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = clone_request(
            &s.app,
            multipart_body(&[("name", "N"), ("project_id", "nope")], Some(sample())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &s.app,
            Method::POST,
            "/api/tts/clone",
            Some(json!({ "name": "N" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_of(response).await["error"].is_string());

        assert_eq!(s.upstream.call_count(), 0);
    }

    #[tokio::test]
    async fn test_projects_survive_restart() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path(), "http://127.0.0.1:9".to_string());

        let state = Arc::new(AppState::open(config.clone()).await.unwrap());
        let app = create_router(state);
        let project = json_of(
            send(&app, Method::POST, "/api/projects", Some(json!({ "name": "Kept" }))).await,
        )
        .await;

        let reopened = Arc::new(AppState::open(config).await.unwrap());
        let app = create_router(reopened);
        let response = send(
            &app,
            Method::GET,
            &format!("/api/projects/{}", project["id"].as_str().unwrap()),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_of(response).await["name"], "Kept");
    }
}
