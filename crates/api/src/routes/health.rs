//! Liveness probe, mounted at the root rather than under `/api`.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    /// `toolbench-api` package version.
    pub version: &'static str,
}

/// GET /health
///
/// The server holds no connections to probe, so reaching the handler is
/// the whole check.
async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
