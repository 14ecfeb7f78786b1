//! Route definitions for the code-transform endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::transform;
use crate::state::AppState;

/// Routes mounted at `/transform`.
///
/// ```text
/// GET    /languages            -> list_languages
/// POST   /{origin}/{target}    -> transform
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/languages", get(transform::list_languages))
        .route("/{origin}/{target}", post(transform::transform))
}
