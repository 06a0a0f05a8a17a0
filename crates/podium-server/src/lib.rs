//! HTTP server for Podium.
//!
//! Wires a [`ClinicalStore`] into the [`podium_api`] router under `/api`
//! and wraps it in request tracing.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use podium_core::store::ClinicalStore;
use podium_store_sqlite::PoolConfig;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PODIUM_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  pub store_path:         PathBuf,
  #[serde(default = "default_pool_size")]
  pub pool_size:          usize,
  #[serde(default = "default_acquire_timeout_ms")]
  pub acquire_timeout_ms: u64,
  #[serde(default = "default_busy_timeout_ms")]
  pub busy_timeout_ms:    u64,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

const fn default_port() -> u16 { 8080 }

fn default_pool_size() -> usize { PoolConfig::default().size }

fn default_acquire_timeout_ms() -> u64 { PoolConfig::default().acquire_timeout_ms }

fn default_busy_timeout_ms() -> u64 { PoolConfig::default().busy_timeout_ms }

impl ServerConfig {
  pub fn pool_config(&self) -> PoolConfig {
    PoolConfig {
      size:               self.pool_size,
      acquire_timeout_ms: self.acquire_timeout_ms,
      busy_timeout_ms:    self.busy_timeout_ms,
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the JSON API nested under `/api`, traced.
pub fn app<S>(store: Arc<S>) -> Router
where
  S: ClinicalStore + 'static,
{
  Router::new()
    .nest("/api", podium_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use podium_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn pool_settings_default_when_omitted() {
    let cfg = parse("store_path = \"~/podium.db\"");
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    let pool = cfg.pool_config();
    assert_eq!(pool.size, 20);
    assert_eq!(pool.acquire_timeout_ms, 2_000);
    assert_eq!(pool.busy_timeout_ms, 5_000);
  }

  #[test]
  fn pool_settings_are_read_from_file() {
    let cfg = parse(
      "store_path = \"/var/lib/podium.db\"\nport = 9000\npool_size = 4\nacquire_timeout_ms = 250",
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.pool_config().size, 4);
    assert_eq!(cfg.pool_config().acquire_timeout_ms, 250);
  }

  #[tokio::test]
  async fn api_is_nested_under_prefix() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let resp = app(store)
      .oneshot(Request::get("/api/disciplines").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, serde_json::json!([]));
  }
}
