//! Handlers for the code-transform playground.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use toolbench_core::compiler::{compilers_for, resolve_for_route, Language, Route, ROUTES};
use toolbench_core::error::CoreError;
use toolbench_core::timing::timed_async;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TransformRequest {
    #[serde(alias = "code")]
    pub source_code: String,
    /// `None` selects the default compiler.
    #[serde(default, alias = "compiler")]
    pub compiler_tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransformResponse {
    pub output_code: String,
    pub elapsed_ms: f64,
    /// Tag of the compiler that actually ran.
    pub compiler: &'static str,
}

/// POST /api/transform/{origin}/{target}
pub async fn transform(
    State(state): State<AppState>,
    Path((origin, target)): Path<(String, String)>,
    Json(input): Json<TransformRequest>,
) -> AppResult<Json<DataResponse<TransformResponse>>> {
    let route = Route::parse(&origin, &target)?;
    let compiler = resolve_for_route(&state.compilers, input.compiler_tag.as_deref(), route)?;

    let timed = timed_async(compiler.compile(&input.source_code, route))
        .await
        .map_err(|e| {
            tracing::warn!(compiler = compiler.tag(), %route, error = %e, "Transform failed");
            CoreError::from(e)
        })?;

    tracing::info!(
        compiler = compiler.tag(),
        %route,
        source_len = input.source_code.len(),
        elapsed_ms = timed.elapsed_ms(),
        "Transform complete",
    );

    Ok(Json(DataResponse {
        data: TransformResponse {
            elapsed_ms: timed.elapsed_ms(),
            output_code: timed.value,
            compiler: compiler.tag(),
        },
    }))
}

/// One supported route, as offered to the editor.
#[derive(Debug, Serialize)]
pub struct RouteInfo {
    pub origin: Language,
    pub target: Language,
    pub origin_editor_language: &'static str,
    pub target_editor_language: &'static str,
    /// Compilers able to handle the route, default first.
    pub compilers: Vec<&'static str>,
}

/// GET /api/transform/languages
pub async fn list_languages(State(state): State<AppState>) -> Json<DataResponse<Vec<RouteInfo>>> {
    let routes = ROUTES
        .iter()
        .map(|&route| RouteInfo {
            origin: route.origin,
            target: route.target,
            origin_editor_language: route.origin.editor_language(),
            target_editor_language: route.target.editor_language(),
            compilers: compilers_for(&state.compilers, route),
        })
        .collect();

    Json(DataResponse { data: routes })
}
