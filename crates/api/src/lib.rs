//! DataCube API client.
//!
//! A thin transport over `reqwest`:
//!
//! - Builds an HTTP client carrying the account API key and a consistent
//!   User-Agent
//! - Validates `DATACUBE_API_BASE` before any request is sent
//! - Exposes the native endpoints (`status`, `usage`, `me`, `execute`,
//!   `execute/{id}`) and maps non-success responses to
//!   [`TransportError::Status`]
//!
//! Flow resolution lives elsewhere; by the time a request reaches
//! [`DataCubeClient::execute`] it already names a concrete flow id.
//!
//! # Example
//!
//! ```ignore
//! use datacube_api::DataCubeClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = DataCubeClient::from_env()?;
//!     println!("{}", client.status().await?);
//!     Ok(())
//! }
//! ```

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use datacube_types::{InvokeRequest, TransportError};
use datacube_util::redact_sensitive;
use reqwest::{Client, Method, RequestBuilder, Url, header};
use serde_json::Value;
use tracing::debug;

/// Public API endpoint used when no override is configured.
pub const DEFAULT_API_BASE: &str = "https://api.datacube.com.br/v1/";
/// Environment variable holding the account API key.
pub const API_KEY_ENV: &str = "DATACUBE_API_KEY";
/// Environment variable overriding the API base URL.
pub const API_BASE_ENV: &str = "DATACUBE_API_BASE";
/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Allowed base domains for non-local configurations. Subdomains are also
/// allowed.
const ALLOWED_DATACUBE_DOMAINS: &[&str] = &["datacube.com.br"];
/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Configured `reqwest::Client` bound to one DataCube API base URL.
#[derive(Debug, Clone)]
pub struct DataCubeClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
}

impl DataCubeClient {
    /// Builds a client from explicit settings.
    ///
    /// `base_url` defaults to [`DEFAULT_API_BASE`]. Non-localhost hosts must
    /// use HTTPS under an allowed DataCube domain.
    pub fn new(api_key: Option<&str>, base_url: Option<&str>) -> Result<Self> {
        let base_url = Self::base_url_from(base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(api_key) = api_key.map(str::trim).filter(|key| !key.is_empty()) {
            let mut value = header::HeaderValue::from_str(api_key).context("API key is not a valid header value")?;
            value.set_sensitive(true);
            default_headers.insert(API_KEY_HEADER, value);
        }

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url,
            http,
            user_agent: format!("DataCube-SDK (Rust)/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    /// Normalizes a configured base URL to end in `/` and checks it before
    /// any request is built.
    ///
    /// `localhost` and `127.0.0.1` accept any scheme. Every other host must
    /// use HTTPS under [`ALLOWED_DATACUBE_DOMAINS`] or one of its
    /// subdomains.
    fn base_url_from(configured: Option<&str>) -> Result<String> {
        let mut base_url = configured.map(str::trim).unwrap_or(DEFAULT_API_BASE).to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let parsed = Url::parse(&base_url).with_context(|| format!("Invalid {} URL '{}'", API_BASE_ENV, base_url))?;
        let Some(host) = parsed.host_str() else {
            return Err(anyhow!("{} must include a host", API_BASE_ENV));
        };
        let host_is = |domain: &str| host.eq_ignore_ascii_case(domain);

        if LOCALHOST_DOMAINS.iter().copied().any(host_is) {
            return Ok(base_url);
        }
        if parsed.scheme() != "https" {
            return Err(anyhow!(
                "{} must use https outside localhost; got '{}://'",
                API_BASE_ENV,
                parsed.scheme()
            ));
        }

        let under_datacube = ALLOWED_DATACUBE_DOMAINS.iter().any(|domain| {
            host_is(*domain)
                || host
                    .to_ascii_lowercase()
                    .strip_suffix(*domain)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        });
        if !under_datacube {
            return Err(anyhow!(
                "{} host '{}' is outside {:?}; use a DataCube domain or localhost",
                API_BASE_ENV,
                host,
                ALLOWED_DATACUBE_DOMAINS
            ));
        }

        Ok(base_url)
    }

    /// Builds a client from `DATACUBE_API_KEY` and `DATACUBE_API_BASE`.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var(API_KEY_ENV).ok();
        let base_url = env::var(API_BASE_ENV).ok();
        Self::new(api_key.as_deref(), base_url.as_deref())
    }

    /// Build a `reqwest::RequestBuilder` for a method and API-relative path.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path.trim_start_matches('/'));
        debug!(%method, %url, "building request");

        self.http
            .request(method, url)
            .header(header::USER_AGENT, &self.user_agent)
    }

    /// `GET status`
    pub async fn status(&self) -> Result<Value, TransportError> {
        self.send_json(self.request(Method::GET, "status")).await
    }

    /// `GET usage`
    pub async fn usage(&self) -> Result<Value, TransportError> {
        self.send_json(self.request(Method::GET, "usage")).await
    }

    /// `GET me`
    pub async fn me(&self) -> Result<Value, TransportError> {
        self.send_json(self.request(Method::GET, "me")).await
    }

    /// `POST execute` with the invocation payload as JSON.
    pub async fn execute(&self, invoke: &InvokeRequest) -> Result<Value, TransportError> {
        self.send_json(self.execute_request(invoke)).await
    }

    /// `GET execute/{id}`, the status of an asynchronous execution.
    pub async fn execution_status(&self, execution_id: &str) -> Result<Value, TransportError> {
        let path = format!("execute/{}", execution_id.trim());
        self.send_json(self.request(Method::GET, &path)).await
    }

    fn execute_request(&self, invoke: &InvokeRequest) -> RequestBuilder {
        debug!(flow_id = %invoke.flow_id, has_version = invoke.version.is_some(), "executing flow");
        self.request(Method::POST, "execute").json(invoke)
    }

    async fn send_json(&self, builder: RequestBuilder) -> Result<Value, TransportError> {
        let response = builder.send().await.map_err(|error| {
            TransportError::network(format!(
                "{}. Hint: check connection/proxy and {}",
                redact_sensitive(&error.to_string()),
                API_BASE_ENV
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            // Best-effort body; the status already marks the failure.
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %redact_sensitive(&body), "request failed");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(|error| {
            TransportError::network(format!(
                "response body from {} was cut short: {}",
                status,
                redact_sensitive(&error.to_string())
            ))
        })?;
        parse_response_json(&text)
    }
}

/// Parses a success body. An empty body is `null` rather than an error.
fn parse_response_json(text: &str) -> Result<Value, TransportError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|error| TransportError::decode(error.to_string()))
}
