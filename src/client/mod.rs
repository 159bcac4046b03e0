//! Typed HTTP client for the Permify authorization API.
//!
//! [`PermifyClient`] owns one `reqwest` connection pool and hands out
//! borrowed per-area services (`permissions()`, `schemas()`, `data()`,
//! `tenants()`, `bundles()`, `watch()`). Every operation is one HTTP round
//! trip; nothing is retried.

mod bundle;
mod data;
mod error;
mod permission;
mod schema;
mod tenancy;
mod watch;

pub use bundle::BundleService;
pub use data::DataService;
pub use error::PermifyError;
pub use permission::PermissionService;
pub use schema::SchemaService;
pub use tenancy::TenancyService;
pub use watch::{ChangeStream, WatchService};

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::PermifyConfig;

pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct PermifyClient {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Option<Duration>,
}

impl PermifyClient {
    pub fn new(config: &PermifyConfig) -> Result<Self, PermifyError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(PermifyError::Configuration("base url must not be empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        if let Some(ref key) = config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| PermifyError::Configuration("invalid api key format".to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| PermifyError::Configuration(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url,
            request_timeout: config.request_timeout,
        })
    }

    /// Builds the client and, unless disabled, probes `/healthz` once.
    pub async fn connect(config: &PermifyConfig) -> Result<Self, PermifyError> {
        let client = Self::new(config)?;

        if !config.skip_health_check {
            let health = client.health_check().await?;
            tracing::info!(base_url = %client.base_url, status = %health.status, "connected to permify");
        }

        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health_check(&self) -> Result<HealthStatus, PermifyError> {
        let response = self
            .http
            .get(self.url("/healthz"))
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await?;

        decode_response(response).await
    }

    pub fn permissions(&self) -> PermissionService<'_> {
        PermissionService::new(self)
    }

    pub fn schemas(&self) -> SchemaService<'_> {
        SchemaService::new(self)
    }

    pub fn data(&self) -> DataService<'_> {
        DataService::new(self)
    }

    pub fn tenants(&self) -> TenancyService<'_> {
        TenancyService::new(self)
    }

    pub fn bundles(&self) -> BundleService<'_> {
        BundleService::new(self)
    }

    pub fn watch(&self) -> WatchService<'_> {
        WatchService::new(self)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute<B, R>(&self, method: Method, path: &str, body: Option<&B>) -> Result<R, PermifyError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        tracing::debug!(method = %method, path = %path, "permify request");

        let mut request = self.http.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        decode_response(response).await
    }

    pub(crate) async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, PermifyError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.execute(Method::POST, path, Some(body)).await
    }

    pub(crate) async fn delete<R>(&self, path: &str) -> Result<R, PermifyError>
    where
        R: DeserializeOwned,
    {
        self.execute::<(), R>(Method::DELETE, path, None).await
    }

    /// Opens a long-lived streaming POST. No request timeout is applied.
    pub(crate) async fn post_stream<B>(&self, path: &str, body: &B) -> Result<Response, PermifyError>
    where
        B: Serialize + ?Sized,
    {
        tracing::debug!(path = %path, "permify stream request");

        let response = self.http.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(PermifyError::from_status(status.as_u16(), &body));
        }

        Ok(response)
    }
}

/// Rejects tenant ids that would not stay a single path segment once
/// spliced into `/v1/tenants/{tenant_id}`.
pub(crate) fn validate_tenant_id(tenant_id: &str) -> Result<(), PermifyError> {
    if tenant_id.trim().is_empty() {
        return Err(PermifyError::invalid_argument("tenant_id must not be empty"));
    }
    if tenant_id == "." || tenant_id == ".." {
        return Err(PermifyError::invalid_argument("tenant_id must not be a dot segment"));
    }
    if tenant_id
        .chars()
        .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control())
    {
        return Err(PermifyError::invalid_argument(
            "tenant_id must be a single path segment",
        ));
    }
    Ok(())
}

pub(crate) fn tenant_path(tenant_id: &str, suffix: &str) -> Result<String, PermifyError> {
    validate_tenant_id(tenant_id)?;

    Ok(format!("/v1/tenants/{tenant_id}/{suffix}"))
}

async fn decode_response<R: DeserializeOwned>(response: Response) -> Result<R, PermifyError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let err = PermifyError::from_status(status.as_u16(), &body);
        tracing::warn!(status = status.as_u16(), error = %err, "permify request failed");
        return Err(err);
    }

    decode_body(&body)
}

pub(crate) fn decode_body<R: DeserializeOwned>(body: &[u8]) -> Result<R, PermifyError> {
    // Some endpoints answer 200 with an empty body.
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };

    let mut de = serde_json::Deserializer::from_slice(body);
    serde_path_to_error::deserialize(&mut de).map_err(PermifyError::decode)
}
