#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::post;
use axum::{Json, Router};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use toolbench_api::config::ServerConfig;
use toolbench_api::router::build_app_router;
use toolbench_api::state::AppState;
use toolbench_client::ApiClient;
use toolbench_core::codec::default_registry;
use toolbench_core::compiler::{CommandCompiler, CommandLine, Compiler, CompilerCommands};
use toolbench_core::envelope::ItemOutcome;
use toolbench_core::strategy::{ResolutionMode, StrategyRegistry};

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        max_upload_bytes: 8 * 1024 * 1024,
        max_batch_items: 16,
        batch_concurrency: 2,
        resolution: ResolutionMode::Strict,
        compilers: CompilerCommands::default(),
    }
}

/// Start the real server on an ephemeral port and return a client for it.
///
/// Compilers are `sh` stand-ins: `babel` echoes its input, `swc` fails.
pub async fn spawn_server() -> ApiClient {
    let config = test_config();
    let timeout = Duration::from_secs(10);
    let compilers = StrategyRegistry::new(
        Arc::new(CommandCompiler::babel(CommandLine::new("sh", ["-c", "cat"]), timeout))
            as Arc<dyn Compiler>,
        config.resolution,
    )
    .with(Arc::new(CommandCompiler::swc(
        CommandLine::new("sh", ["-c", "echo 'Unexpected token' >&2; exit 1"]),
        timeout,
    )));
    let codecs = default_registry(config.resolution);
    let app = build_app_router(AppState::new(config, codecs, compilers));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    ApiClient::new(format!("http://{addr}"))
}

/// Start a stand-in server whose batch endpoint ignores the upload and
/// always answers with `outcomes`.
pub async fn spawn_canned_server(outcomes: Vec<ItemOutcome>) -> ApiClient {
    let body = serde_json::json!({ "data": outcomes });
    let app = Router::new().route(
        "/api/compress-image",
        post(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    ApiClient::new(format!("http://{addr}"))
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn sample(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7) as u8, (y * 3) as u8, ((x + y) * 5) as u8])
    }))
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    sample(width, height)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}
