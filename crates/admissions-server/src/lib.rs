//! HTTP server for the admissions record keeper.
//!
//! Mounts the JSON API under `/api`, serves stored uploads under the media
//! URL prefix, and answers `/health`.

use std::{path::PathBuf, sync::Arc};

use admissions_api::MediaStore;
use admissions_core::store::AdmissionsStore;
use axum::{Json, Router, extract::DefaultBodyLimit, routing::get};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{services::ServeDir, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` and `ADMISSIONS_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  /// Directory uploaded documents are written to.
  pub media_root:       PathBuf,
  /// URL prefix uploads are served under.
  pub media_url:        String,
  pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "127.0.0.1".to_string(),
      port:             8000,
      store_path:       PathBuf::from("admissions.db"),
      media_root:       PathBuf::from("media"),
      media_url:        "/media/".to_string(),
      max_upload_bytes: 10 * 1024 * 1024,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router.
pub fn router<S>(store: Arc<S>, media: Arc<MediaStore>, config: &ServerConfig) -> Router
where
  S: AdmissionsStore + 'static,
{
  let files = ServeDir::new(media.root());
  let prefix = config.media_url.trim_matches('/').to_string();

  let app = Router::new()
    .route("/health", get(health))
    .nest("/api", admissions_api::api_router(store, media));
  let app = if prefix.is_empty() {
    app.fallback_service(files)
  } else {
    app.nest_service(&format!("/{prefix}"), files)
  };

  app
    .layer(DefaultBodyLimit::max(config.max_upload_bytes))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
