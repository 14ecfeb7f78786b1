#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tower::ServiceExt;

use toolbench_api::config::ServerConfig;
use toolbench_api::router::build_app_router;
use toolbench_api::state::AppState;
use toolbench_core::codec::{
    default_registry, Capabilities, CodecError, CompressOptions, Encoded, ImageCodec,
};
use toolbench_core::compiler::{
    CommandCompiler, CommandLine, Compiler, CompilerCommands, CompilerRegistry,
};
use toolbench_core::strategy::{ResolutionMode, StrategyRegistry, Tagged};

/// Batch size limit used by the test app.
pub const TEST_MAX_BATCH_ITEMS: usize = 4;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        max_upload_bytes: 8 * 1024 * 1024,
        max_batch_items: TEST_MAX_BATCH_ITEMS,
        batch_concurrency: 2,
        resolution: ResolutionMode::Strict,
        compilers: CompilerCommands::default(),
    }
}

/// Image strategy that always fails, selectable as `broken`.
pub struct BrokenCodec;

impl Tagged for BrokenCodec {
    fn tag(&self) -> &'static str {
        "broken"
    }
}

impl ImageCodec for BrokenCodec {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            quality: true,
            format_conversion: true,
        }
    }

    fn compress(&self, _input: &[u8], _options: &CompressOptions) -> Result<Encoded, CodecError> {
        Err(CodecError::UnsupportedInput("broken on purpose".into()))
    }
}

/// Compilers backed by `sh` instead of node tooling.
///
/// `babel` and `esbuild` echo their input back; `swc` always fails with a
/// syntax error on stderr. The real argument builders still run, and `sh`
/// ignores the extra arguments.
pub fn test_compilers() -> CompilerRegistry {
    let timeout = Duration::from_secs(10);
    let echo = CommandLine::new("sh", ["-c", "cat"]);
    let failing = CommandLine::new("sh", ["-c", "echo 'Unexpected token (1:4)' >&2; exit 1"]);

    StrategyRegistry::new(
        Arc::new(CommandCompiler::babel(echo.clone(), timeout)) as Arc<dyn Compiler>,
        ResolutionMode::Strict,
    )
    .with(Arc::new(CommandCompiler::swc(failing, timeout)))
    .with(Arc::new(CommandCompiler::esbuild(echo, timeout)))
}

/// Build the full application router with all middleware layers.
///
/// Uses the production router builder so tests exercise the same
/// middleware stack (CORS, request ID, timeout, tracing, panic recovery,
/// body limit).
pub fn build_test_app() -> Router {
    build_app_with(test_config())
}

pub fn build_app_with(config: ServerConfig) -> Router {
    let codecs = default_registry(config.resolution).with(Arc::new(BrokenCodec));
    let compilers = test_compilers().with_mode(config.resolution);
    build_app_router(AppState::new(config, codecs, compilers))
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_multipart(app: Router, uri: &str, form: MultipartForm) -> Response<Body> {
    let (content_type, body) = form.finish();
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Multipart body builder
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "toolbench-test-boundary-7c1f";

/// Minimal `multipart/form-data` encoder for building batch uploads.
#[derive(Default)]
pub struct MultipartForm {
    buf: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manifest(self, manifest: serde_json::Value) -> Self {
        self.text("manifest", &manifest.to_string())
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(bytes);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> (String, Vec<u8>) {
        self.buf
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={BOUNDARY}"), self.buf)
    }
}

// ---------------------------------------------------------------------------
// Test images
// ---------------------------------------------------------------------------

fn sample(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 9) as u8, (y * 5) as u8, ((x ^ y) * 3) as u8])
    }))
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&sample(width, height), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&sample(width, height), ImageFormat::Jpeg)
}
