//! Local Gems HTTP server.
//!
//! Wires the JSON API from `gems-api` onto a concrete store and adds
//! request tracing. The binary in `src/bin/server.rs` handles configuration
//! and startup.

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use gems_core::store::GemStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Top-level server configuration, typically loaded from `config.toml` and
/// `GEMS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  /// SQLite database file. A leading `~/` is expanded at startup.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/gems/gems.db") }

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: `/health` plus the API under `/api`.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: GemStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", gems_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}
