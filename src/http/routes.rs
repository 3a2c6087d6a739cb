//! Axum router configuration

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::handlers::{
    audio_object, health_check, normalize_caption, parse_caption_script, version_check,
};
use super::middleware::request_logger;
use super::projects::{
    create_project, delete_project, get_project, list_projects, preview_project, update_project,
};
use super::tts::{clone_voice, synthesize};

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ORIGIN,
        ])
        .max_age(Duration::from_secs(3600))
}

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        // Projects
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project)
                .patch(update_project)
                .delete(delete_project),
        )
        .route("/api/projects/{id}/preview", get(preview_project))
        // Captions
        .route("/api/captions/normalize", post(normalize_caption))
        .route("/api/captions/parse", post(parse_caption_script))
        // TTS proxy and stored audio
        .route("/api/tts/synthesize", post(synthesize))
        .route("/api/tts/clone", post(clone_voice))
        .route("/api/audio/{key}", get(audio_object))
        // Middleware
        .layer(DefaultBodyLimit::max(state.config.max_request_bytes()))
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http());

    let router = if state.config.cors_enabled {
        router.layer(cors_layer())
    } else {
        router
    };

    router.with_state(state)
}
