//! Voice Studio Server
//!
//! A Rust-based backend for a voice-cloning studio: project CRUD, a caption
//! text normalizer for the script editor, and a proxy to an external TTS
//! inference API whose audio is kept in a local object store.

#[macro_use]
mod macros;

mod config;
mod config_file;
mod error;
mod http;
mod project;
mod state;
mod storage;
mod subtitle;
mod tts;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ServerConfig;
use crate::error::{Result, StudioError};
use crate::http::create_router;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "voice-studio";

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let first = args.next();

    // `voice-studio --generate-config [path]` writes a template and exits.
    if first.as_deref() == Some("--generate-config") {
        let path = args.next().unwrap_or_else(|| "config.toml".to_string());
        config_file::generate_default_config(&path)?;
        println!("Wrote default configuration to {}", path);
        return Ok(());
    }

    // Load configuration
    let config_path = first.unwrap_or_else(|| "config.toml".to_string());
    let (config, load_error) = config_file::load_server_config(&config_path);

    init_logging(&config);

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    if let Some(e) = load_error {
        tracing::warn!("{}. Using defaults.", e);
    }
    tracing::info!(
        path = %config_path,
        tts = %config.tts.base_url,
        data_dir = %config.storage.data_dir.display(),
        "Configuration loaded"
    );

    // Create application state
    let state = Arc::new(AppState::open(config.clone()).await?);
    tracing::info!("Loaded {} projects", state.projects.len());

    // Build router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = config.socket_addr().parse().map_err(|e| {
        StudioError::Config(format!(
            "invalid listen address {}: {}",
            config.socket_addr(),
            e
        ))
    })?;
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize logging with tracing
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "voice_studio={},tower_http={}",
            config.log_level, config.log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
