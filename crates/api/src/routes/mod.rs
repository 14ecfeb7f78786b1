pub mod compress;
pub mod health;
pub mod transform;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /compress-image                      batch compression (POST)
/// /compress-image/archive              batch compression as zip (POST)
/// /compress-image/strategies           registered image strategies (GET)
///
/// /transform/languages                 supported routes and compilers (GET)
/// /transform/{origin}/{target}         compile source (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/compress-image", compress::router())
        .nest("/transform", transform::router())
}
