//! `ApiClient` against a live server.

mod common;

use std::io::Cursor;

use assert_matches::assert_matches;
use toolbench_client::ClientError;
use toolbench_core::batch::Batch;
use toolbench_core::compiler::{Language, Route};
use toolbench_core::strategy::ResolutionMode;
use toolbench_core::work_item::WorkItem;

#[tokio::test]
async fn health_reports_ok() {
    let client = common::spawn_server().await;
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[tokio::test]
async fn strategies_listing_decodes() {
    let client = common::spawn_server().await;
    let listing = client.strategies().await.unwrap();

    assert_eq!(listing.default, "standard");
    assert_eq!(listing.resolution, ResolutionMode::Strict);
    let lossless = listing
        .strategies
        .iter()
        .find(|s| s.tag == "lossless")
        .expect("lossless listed");
    assert!(!lossless.capabilities.quality);
}

#[tokio::test]
async fn languages_listing_decodes() {
    let client = common::spawn_server().await;
    let routes = client.languages().await.unwrap();

    let ts_es5 = routes
        .iter()
        .find(|r| r.origin == Language::Ts && r.target == Language::Es5)
        .expect("ts->es5 listed");
    assert_eq!(ts_es5.origin_editor_language, "typescript");
    assert_eq!(ts_es5.compilers, vec!["babel", "swc"]);
}

// ---------------------------------------------------------------------------
// Test: transform success and error decoding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transform_returns_output_and_timing() {
    let client = common::spawn_server().await;
    let route = Route::new(Language::Es6, Language::Es5);

    let output = client.transform(route, "let a = () => 1;", None).await.unwrap();
    assert_eq!(output.output_code, "let a = () => 1;");
    assert_eq!(output.compiler, "babel");
    assert!(output.elapsed_ms >= 0.0);
}

#[tokio::test]
async fn transform_errors_carry_server_code() {
    let client = common::spawn_server().await;
    let route = Route::new(Language::Ts, Language::Es6);

    let err = client.transform(route, "x", Some("tsc")).await.unwrap_err();
    assert_matches!(err, ClientError::Api { status: 400, .. });
    assert_eq!(err.code(), Some("INVALID_STRATEGY"));

    let err = client.transform(route, "let ???", Some("swc")).await.unwrap_err();
    assert_matches!(&err, ClientError::Api { status: 422, message, .. } if message.contains("Unexpected token"));
    assert_eq!(err.code(), Some("STRATEGY_FAILED"));
}

// ---------------------------------------------------------------------------
// Test: archive download
// ---------------------------------------------------------------------------

#[tokio::test]
async fn archive_contains_successful_items() {
    let client = common::spawn_server().await;
    let batch = Batch::from_items(vec![
        WorkItem::new("a", common::jpeg_bytes(24, 24)).with_name("a.jpg"),
        WorkItem::new("b", b"garbage".to_vec()).with_name("b.png"),
        WorkItem::new("c", common::jpeg_bytes(12, 12)).with_name("c.jpeg"),
    ])
    .unwrap();

    let download = client.compress_archive(&batch).await.unwrap();
    assert_eq!(download.failed_items, 1);
    assert_eq!(&download.bytes[..2], b"PK");

    let mut archive = zip_entries(&download.bytes);
    archive.sort();
    assert_eq!(archive, vec!["a.jpg", "c.jpg"]);
}

#[tokio::test]
async fn archive_with_no_successes_is_an_error() {
    let client = common::spawn_server().await;
    let batch = Batch::from_items(vec![WorkItem::new("b", b"garbage".to_vec())]).unwrap();

    let err = client.compress_archive(&batch).await.unwrap_err();
    assert_eq!(err.code(), Some("STRATEGY_FAILED"));
}

fn zip_entries(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive.file_names().map(str::to_string).collect()
}
