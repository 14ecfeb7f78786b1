//! REST client for the toolbench HTTP endpoints.
//!
//! Wraps batch compression, archive download, code transforms and the
//! discovery endpoints using [`reqwest`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use toolbench_core::batch::{Batch, FAILED_ITEMS_HEADER};
use toolbench_core::codec::Capabilities;
use toolbench_core::compiler::{Language, Route};
use toolbench_core::envelope::ItemOutcome;
use toolbench_core::strategy::ResolutionMode;

use crate::error::ClientError;

/// HTTP client for a single toolbench server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

/// Success bodies are wrapped as `{"data": ...}`.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// A bundled download of every successfully compressed item.
#[derive(Debug, Clone)]
pub struct ArchiveDownload {
    /// Zip file bytes.
    pub bytes: Vec<u8>,
    /// Items that failed and are not in the archive.
    pub failed_items: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformOutput {
    pub output_code: String,
    pub elapsed_ms: f64,
    /// Tag of the compiler that ran.
    pub compiler: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyInfo {
    pub tag: String,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyListing {
    pub default: String,
    pub resolution: ResolutionMode,
    pub strategies: Vec<StrategyInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageRoute {
    pub origin: Language,
    pub target: Language,
    pub origin_editor_language: String,
    pub target_editor_language: String,
    /// Compilers able to run this route, default first.
    pub compilers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
struct TransformBody<'a> {
    source_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    compiler_tag: Option<&'a str>,
}

impl ApiClient {
    /// Create a client for a server.
    ///
    /// * `base_url` - e.g. `http://localhost:3000`; a trailing slash is ignored.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a batch and return one outcome per item.
    ///
    /// Sends `POST /api/compress-image` as `multipart/form-data`: a
    /// `manifest` JSON part plus one file part per item.
    pub async fn compress_batch(&self, batch: &Batch) -> Result<Vec<ItemOutcome>, ClientError> {
        let response = self
            .client
            .post(self.url("/api/compress-image"))
            .multipart(Self::batch_form(batch)?)
            .send()
            .await?;

        let outcomes: Vec<ItemOutcome> = Self::parse_data(response).await?;
        tracing::debug!(
            items = batch.len(),
            received = outcomes.len(),
            "Batch response received",
        );
        Ok(outcomes)
    }

    /// Submit a batch and download the successful results as one zip.
    ///
    /// Sends `POST /api/compress-image/archive`. Fails with a
    /// `STRATEGY_FAILED` API error when no item succeeded.
    pub async fn compress_archive(&self, batch: &Batch) -> Result<ArchiveDownload, ClientError> {
        let response = self
            .client
            .post(self.url("/api/compress-image/archive"))
            .multipart(Self::batch_form(batch)?)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let failed_items = response
            .headers()
            .get(FAILED_ITEMS_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let bytes = response.bytes().await?.to_vec();

        Ok(ArchiveDownload {
            bytes,
            failed_items,
        })
    }

    /// Transform source code along `route`.
    ///
    /// Sends `POST /api/transform/{origin}/{target}`. `compiler` `None`
    /// lets the server pick its default.
    pub async fn transform(
        &self,
        route: Route,
        source: &str,
        compiler: Option<&str>,
    ) -> Result<TransformOutput, ClientError> {
        let response = self
            .client
            .post(self.url(&format!(
                "/api/transform/{}/{}",
                route.origin.as_str(),
                route.target.as_str()
            )))
            .json(&TransformBody {
                source_code: source,
                compiler_tag: compiler,
            })
            .send()
            .await?;

        Self::parse_data(response).await
    }

    /// `GET /api/compress-image/strategies`
    pub async fn strategies(&self) -> Result<StrategyListing, ClientError> {
        let response = self
            .client
            .get(self.url("/api/compress-image/strategies"))
            .send()
            .await?;

        Self::parse_data(response).await
    }

    /// `GET /api/transform/languages`
    pub async fn languages(&self) -> Result<Vec<LanguageRoute>, ClientError> {
        let response = self
            .client
            .get(self.url("/api/transform/languages"))
            .send()
            .await?;

        Self::parse_data(response).await
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.client.get(self.url("/health")).send().await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn batch_form(batch: &Batch) -> Result<reqwest::multipart::Form, ClientError> {
        let (manifest, parts) = batch.to_manifest();
        let manifest =
            serde_json::to_string(&manifest).map_err(|e| ClientError::Decode(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new().text("manifest", manifest);
        for (part_name, item) in parts {
            let mut part = reqwest::multipart::Part::bytes(item.payload.clone());
            if let Some(name) = &item.name {
                part = part.file_name(name.clone());
            }
            form = form.part(part_name, part);
        }
        Ok(form)
    }

    /// Return the response unchanged on success, or a
    /// [`ClientError::Api`] built from the error body.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::from_body(status.as_u16(), &body));
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn parse_data<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let envelope: DataEnvelope<T> = Self::parse_response(response).await?;
        Ok(envelope.data)
    }
}
