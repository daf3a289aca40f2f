//! HTTP client for the remote analysis service.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::backend::ExplorerBackend;
use super::error::{Operation, RemoteError, RemoteResult};
use crate::api::{
    AnalysisQuery, AnalysisResult, ParcelSearchResponse, PixelQuery, PixelValues,
    VisualizeRequest, VisualizeResponse,
};

/// Body the service sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Pull a human-readable `detail` out of an error body, if there is one.
///
/// FastAPI validation errors carry a list instead of a string; those are
/// passed through as compact JSON.
fn extract_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::String(_) | serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// [`ExplorerBackend`] talking JSON over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a client for `base_url`.
    ///
    /// No timeout is applied unless one is given.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> RemoteResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RemoteError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(RemoteError::Configuration("API base URL is empty".into()));
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, operation: Operation, path: &str, body: &B) -> RemoteResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| RemoteError::transport(operation, e))?;
        Self::read_response(operation, response).await
    }

    async fn get_json<T>(&self, operation: Operation, path: &str, query: &[(&str, String)]) -> RemoteResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| RemoteError::transport(operation, e))?;
        Self::read_response(operation, response).await
    }

    /// Turn a response into a value or a typed failure.
    ///
    /// An unreadable or empty error body never escapes as its own error; it
    /// only means the failure has no detail.
    async fn read_response<T: DeserializeOwned>(
        operation: Operation,
        response: reqwest::Response,
    ) -> RemoteResult<T> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let detail = extract_detail(&body);
            warn!(
                "{} failed with HTTP {}{}",
                operation,
                status.as_u16(),
                detail.as_deref().map(|d| format!(": {}", d)).unwrap_or_default()
            );
            if status == reqwest::StatusCode::NOT_FOUND && operation.is_parcel_lookup() {
                return Err(RemoteError::not_found(
                    operation,
                    detail.unwrap_or_else(|| "No parcel found".to_string()),
                ));
            }
            return Err(RemoteError::status(operation, status.as_u16(), detail));
        }

        serde_json::from_str(&body).map_err(|e| RemoteError::decode(operation, e))
    }
}

#[async_trait]
impl ExplorerBackend for HttpBackend {
    async fn analyze(&self, query: &AnalysisQuery) -> RemoteResult<AnalysisResult> {
        debug!(
            "POST /calculate/biomass field={} {}..{} indices={}",
            query.field_id,
            query.start_date,
            query.end_date,
            query.indices.len()
        );
        self.post_json(Operation::Analyze, "/calculate/biomass", query)
            .await
    }

    async fn visualize_batch(&self, request: &VisualizeRequest) -> RemoteResult<VisualizeResponse> {
        debug!("POST /visualize/batch {} {}", request.date, request.sensor);
        self.post_json(Operation::VisualizeBatch, "/visualize/batch", request)
            .await
    }

    async fn pixel_value(&self, query: &PixelQuery) -> RemoteResult<PixelValues> {
        self.post_json(Operation::PixelValue, "/api/pixel-value", query)
            .await
    }

    async fn search_parcel(&self, query: &str) -> RemoteResult<ParcelSearchResponse> {
        self.get_json(
            Operation::SearchParcel,
            "/api/uldk/search",
            &[("q", query.to_string())],
        )
        .await
    }

    async fn locate_parcel(&self, lat: f64, lng: f64) -> RemoteResult<ParcelSearchResponse> {
        self.get_json(
            Operation::LocateParcel,
            "/api/uldk/locate",
            &[("lat", lat.to_string()), ("lng", lng.to_string())],
        )
        .await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
