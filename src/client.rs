//! Discovery-backed Google API client.

use std::time::Duration;

use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::Credentials;
use crate::error::{DiscoveryReason, ReportError, Result};
use crate::models::{ApiErrorResponse, DiscoveryDirectory, DiscoveryDocument, ItemList};
use crate::retry::Retry;

/// Root of the Google API discovery service.
pub const DISCOVERY_ROOT: &str = "https://www.googleapis.com";

/// Options shared by every service handle.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub discovery_root: String,
    pub timeout: Duration,
    pub retry: Retry,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            discovery_root: DISCOVERY_ROOT.to_string(),
            timeout: Duration::from_secs(30),
            retry: Retry::default(),
        }
    }
}

/// The uniform request/response primitive of a service.
///
/// `path` is relative to the service base URL and must not start with `/`.
#[allow(async_fn_in_trait)]
pub trait ServiceCall {
    async fn call(&self, method: Method, path: &str, params: &[(&str, &str)]) -> Result<Value>;
}

/// Streamed media content.
pub struct MediaStream {
    /// Total length in bytes, when the server announced it.
    pub total: Option<u64>,
    pub chunks: BoxStream<'static, Result<Vec<u8>>>,
}

/// A service that can serve raw media content.
#[allow(async_fn_in_trait)]
pub trait MediaSource {
    async fn open_media(&self, path: &str, params: &[(&str, &str)]) -> Result<MediaStream>;
}

/// Handle to one authenticated API surface.
#[derive(Debug)]
pub struct ServiceHandle {
    api_name: String,
    api_version: String,
    base_url: String,
    credentials: Credentials,
    http: Client,
    retry: Retry,
}

fn discovery_error(
    api_name: &str,
    api_version: &str,
    reason: DiscoveryReason,
    detail: impl Into<String>,
) -> ReportError {
    ReportError::Discovery {
        api: api_name.to_string(),
        version: api_version.to_string(),
        reason,
        detail: detail.into(),
    }
}

/// Convert a failed response into an error, preferring the Google error body.
async fn api_error(response: Response) -> ReportError {
    let status = response.status();
    let error_body = response.text().await.unwrap_or_default();
    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
        return ReportError::ApiError {
            status: api_error.error.code,
            message: api_error.error.message,
        };
    }
    ReportError::ApiError {
        status: status.as_u16(),
        message: error_body,
    }
}

/// Build a handle for `api_name`/`api_version` from its discovery document.
///
/// # Arguments
/// * `credentials` - Credentials used for every call made through the handle
/// * `api_name` - Discovery name, e.g. `analytics`
/// * `api_version` - API version, e.g. `v3`
/// * `options` - Discovery root, timeout and retry policy
pub async fn build_client(
    credentials: Credentials,
    api_name: &str,
    api_version: &str,
    options: &ClientOptions,
) -> Result<ServiceHandle> {
    crate::ids::validate_id("api", api_name).map_err(|e| {
        discovery_error(api_name, api_version, DiscoveryReason::UnknownApi, e.to_string())
    })?;
    crate::ids::validate_id("version", api_version).map_err(|e| {
        discovery_error(api_name, api_version, DiscoveryReason::VersionMismatch, e.to_string())
    })?;

    let http = Client::builder().timeout(options.timeout).build()?;
    let root = options.discovery_root.trim_end_matches('/');
    let url = format!("{}/discovery/v1/apis/{}/{}/rest", root, api_name, api_version);
    debug!(%url, "fetching discovery document");

    let response = http.get(&url).send().await.map_err(|e| {
        discovery_error(api_name, api_version, DiscoveryReason::NetworkUnreachable, e.to_string())
    })?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(classify_missing_api(&http, root, api_name, api_version).await);
    }
    if !status.is_success() {
        return Err(api_error(response).await);
    }

    let document: DiscoveryDocument = response.json().await?;
    let base_url = format!(
        "{}/{}",
        document.root_url.trim_end_matches('/'),
        document.service_path.trim_start_matches('/')
    );
    debug!(api = api_name, version = api_version, %base_url, "built service handle");

    Ok(ServiceHandle {
        api_name: api_name.to_string(),
        api_version: api_version.to_string(),
        base_url,
        credentials,
        http,
        retry: options.retry.clone(),
    })
}

/// Decide whether a missing discovery document means an unknown API or an unknown version.
async fn classify_missing_api(
    http: &Client,
    root: &str,
    api_name: &str,
    api_version: &str,
) -> ReportError {
    let listing = http
        .get(format!("{}/discovery/v1/apis", root))
        .query(&[("name", api_name)])
        .send()
        .await;

    let directory = match listing {
        Ok(response) if response.status().is_success() => {
            response.json::<DiscoveryDirectory>().await.ok()
        }
        Ok(_) => None,
        Err(e) => {
            return discovery_error(
                api_name,
                api_version,
                DiscoveryReason::NetworkUnreachable,
                e.to_string(),
            )
        }
    };

    let versions: Vec<String> = directory
        .map(|d| {
            d.items
                .into_iter()
                .filter(|item| item.name == api_name)
                .map(|item| item.version)
                .collect()
        })
        .unwrap_or_default();

    if versions.is_empty() {
        discovery_error(api_name, api_version, DiscoveryReason::UnknownApi, "no such API")
    } else {
        discovery_error(
            api_name,
            api_version,
            DiscoveryReason::VersionMismatch,
            format!("available versions: {}", versions.join(", ")),
        )
    }
}

impl ServiceHandle {
    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Base URL every resource path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<String> {
        if path.starts_with('/') {
            return Err(ReportError::QueryConstruction(format!(
                "request path must not begin with `/`: {}",
                path
            )));
        }
        Ok(format!("{}{}", self.base_url, path))
    }

    /// Send a request, retrying transient failures of idempotent methods.
    async fn send(&self, method: Method, url: &str, params: &[(&str, &str)]) -> Result<Response> {
        let retry = if method == Method::GET || method == Method::HEAD {
            self.retry.clone()
        } else {
            Retry::none()
        };
        let mut delays = retry.delays();

        loop {
            let token = self.credentials.get_access_token().await?;
            debug!(%method, %url, "sending request");

            let result = self
                .http
                .request(method.clone(), url)
                .bearer_auth(&token)
                .query(params)
                .send()
                .await;

            let failure = match result {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response)
                    if response.status().is_server_error()
                        || response.status() == StatusCode::TOO_MANY_REQUESTS =>
                {
                    api_error(response).await
                }
                Ok(response) => return Err(api_error(response).await),
                Err(e) => ReportError::HttpError(e),
            };

            match delays.next() {
                Some(delay) => {
                    warn!(%method, %url, error = %failure, ?delay, "retrying request");
                    tokio::time::sleep(delay).await;
                }
                None => return Err(failure),
            }
        }
    }
}

impl ServiceCall for ServiceHandle {
    async fn call(&self, method: Method, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = self.url(path)?;
        let response = self.send(method, &url, params).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl MediaSource for ServiceHandle {
    async fn open_media(&self, path: &str, params: &[(&str, &str)]) -> Result<MediaStream> {
        let url = self.url(path)?;
        let response = self.send(Method::GET, &url, params).await?;
        let total = response.content_length();
        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ReportError::from))
            .boxed();
        Ok(MediaStream { total, chunks })
    }
}

/// Fetch every page of a Management API collection.
pub async fn list_items<S, T>(service: &S, path: &str) -> Result<Vec<T>>
where
    S: ServiceCall,
    T: DeserializeOwned,
{
    let mut items: Vec<T> = Vec::new();

    loop {
        let start_index = (items.len() + 1).to_string();
        let value = service
            .call(Method::GET, path, &[("start-index", start_index.as_str())])
            .await?;
        let page: ItemList<T> = serde_json::from_value(value)?;
        let fetched = page.items.len();
        items.extend(page.items);

        match page.total_results {
            Some(total) if fetched > 0 && (items.len() as u64) < total => continue,
            _ => break,
        }
    }

    Ok(items)
}
