//! Route definitions for the image-compression endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::compress;
use crate::state::AppState;

/// Routes mounted at `/compress-image`.
///
/// ```text
/// POST   /                 -> compress_batch
/// POST   /archive          -> compress_archive
/// GET    /strategies       -> list_strategies
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(compress::compress_batch))
        .route("/archive", post(compress::compress_archive))
        .route("/strategies", get(compress::list_strategies))
}
