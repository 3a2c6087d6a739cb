//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with all studio endpoints
//! - Project management (create, list, update, delete)
//! - TTS proxy endpoints storing the returned audio
//! - Caption text conversion and audio downloads
//! - CORS, tracing and request logging middleware

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod projects;
pub mod routes;
pub mod tts;

pub use routes::create_router;
