//! Handlers for the image-compression playground.

use std::collections::HashMap;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderName, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use toolbench_core::batch::{Batch, BatchManifest, UploadedPart, FAILED_ITEMS_HEADER, MANIFEST_FIELD};
use toolbench_core::codec::Capabilities;
use toolbench_core::envelope::ItemOutcome;
use toolbench_core::error::CoreError;
use toolbench_core::strategy::ResolutionMode;

use crate::archive::{build_archive, ARCHIVE_CONTENT_TYPE, ARCHIVE_FILE_NAME};
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/compress-image
///
/// Accepts a `manifest` part plus one file part per item and returns one
/// outcome per item. Item-level failures are reported inside the list;
/// only a malformed batch fails the request.
pub async fn compress_batch(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<DataResponse<Vec<ItemOutcome>>>> {
    let batch = read_batch(multipart, state.config.max_batch_items).await?;
    tracing::info!(items = batch.len(), "Received compression batch");

    let outcomes = state.dispatcher.process_batch(batch).await;
    Ok(Json(DataResponse { data: outcomes }))
}

/// POST /api/compress-image/archive
///
/// Same request as [`compress_batch`], answered with a zip of every
/// successful result. Fails with 422 when nothing succeeded.
pub async fn compress_archive(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<impl IntoResponse> {
    let batch = read_batch(multipart, state.config.max_batch_items).await?;
    tracing::info!(items = batch.len(), "Received archive batch");

    let outcomes = state.dispatcher.process_batch(batch).await;
    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if !outcomes.is_empty() && failed == outcomes.len() {
        return Err(CoreError::StrategyExecution(format!(
            "all {failed} items in the batch failed"
        ))
        .into());
    }

    let archive = build_archive(outcomes.iter().filter_map(ItemOutcome::envelope))?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, ARCHIVE_CONTENT_TYPE.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{ARCHIVE_FILE_NAME}\""),
            ),
            (HeaderName::from_static(FAILED_ITEMS_HEADER), failed.to_string()),
        ],
        archive,
    ))
}

/// One registered image strategy.
#[derive(Debug, Serialize)]
pub struct StrategyInfo {
    pub tag: &'static str,
    pub capabilities: Capabilities,
}

#[derive(Debug, Serialize)]
pub struct StrategyListing {
    pub default: &'static str,
    pub resolution: ResolutionMode,
    pub strategies: Vec<StrategyInfo>,
}

/// GET /api/compress-image/strategies
pub async fn list_strategies(State(state): State<AppState>) -> Json<DataResponse<StrategyListing>> {
    let codecs = &state.codecs;
    let strategies = codecs
        .iter()
        .map(|codec| StrategyInfo {
            tag: codec.tag(),
            capabilities: codec.capabilities(),
        })
        .collect();

    Json(DataResponse {
        data: StrategyListing {
            default: codecs.default_tag(),
            resolution: codecs.mode(),
            strategies,
        },
    })
}

/// Drain the multipart body into a [`Batch`].
///
/// Any problem with the envelope itself is a [`CoreError::MalformedBatch`]:
/// a body that is not multipart or cannot be read, a missing or invalid
/// manifest, a repeated part name, a missing part or a duplicate identity.
async fn read_batch(
    multipart: Result<Multipart, MultipartRejection>,
    max_items: usize,
) -> Result<Batch, CoreError> {
    let mut multipart = multipart.map_err(|e| CoreError::MalformedBatch(e.body_text()))?;
    let mut manifest: Option<BatchManifest> = None;
    let mut parts: HashMap<String, UploadedPart> = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CoreError::MalformedBatch(e.body_text()))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == MANIFEST_FIELD {
            let text = field
                .text()
                .await
                .map_err(|e| CoreError::MalformedBatch(e.body_text()))?;
            manifest = Some(BatchManifest::parse(&text)?);
            continue;
        }

        if name.is_empty() {
            tracing::debug!("Skipping unnamed multipart field");
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| CoreError::MalformedBatch(e.body_text()))?;

        if parts
            .insert(
                name.clone(),
                UploadedPart {
                    file_name,
                    bytes: bytes.to_vec(),
                },
            )
            .is_some()
        {
            return Err(CoreError::MalformedBatch(format!("part '{name}' appears more than once")));
        }
    }

    let manifest = manifest
        .ok_or_else(|| CoreError::MalformedBatch(format!("missing '{MANIFEST_FIELD}' part")))?;
    Batch::assemble(manifest, &parts, max_items)
}
