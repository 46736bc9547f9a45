//! HTTP client for the KittyCAD API

use crate::config::defaults::DEFAULT_TIMEOUT_SECS;
use crate::config::Config;
use crate::error::{CliError, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("kittycad-cli/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn create_http_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| CliError::Http(format!("failed to create HTTP client: {e}")))
}

/// Authenticated client for one KittyCAD host
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Client for `host` using `token`
    pub fn new(host: &str, token: &str) -> Result<Self> {
        Ok(Self {
            http: create_http_client()?,
            base_url: base_url(host),
            token: token.to_string(),
        })
    }

    /// Client for `hostname`, or the default host, with its configured token
    pub fn from_config(cfg: &dyn Config, hostname: Option<&str>) -> Result<Self> {
        let host = match hostname.filter(|h| !h.is_empty()) {
            Some(h) => h.to_string(),
            None => cfg.default_host()?,
        };
        let token = cfg.get(&host, "token")?;
        if token.is_empty() {
            return Err(CliError::AuthRequired);
        }
        Self::new(&host, &token)
    }

    /// Base URL requests are made against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Debug information about the current API session
    pub async fn session(&self) -> Result<Value> {
        self.send(self.http.get(self.url("/_meta/debug/session"))).await
    }

    /// The authenticated user
    pub async fn current_user(&self) -> Result<Value> {
        self.send(self.http.get(self.url("/user"))).await
    }

    /// Email of the authenticated user
    pub async fn current_user_email(&self) -> Result<String> {
        let user = self.current_user().await?;
        user.get("email")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| CliError::Http("user response has no email".to_string()))
    }

    /// Start converting `body` from `src_format` to `output_format`
    pub async fn create_file_conversion(
        &self,
        src_format: &str,
        output_format: &str,
        body: Vec<u8>,
    ) -> Result<Value> {
        let path = format!("/file/conversion/{src_format}/{output_format}");
        self.send(self.http.post(self.url(&path)).body(body)).await
    }

    /// Status of a previously started conversion
    pub async fn file_conversion_status(&self, id: &str) -> Result<Value> {
        let path = format!("/file/conversions/{id}");
        self.send(self.http.get(self.url(&path))).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "API response");

        let body = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// `https://host`, or plain HTTP for a local server
pub fn base_url(host: &str) -> String {
    if host.starts_with("localhost") {
        format!("http://{host}")
    } else {
        format!("https://{host}")
    }
}

fn api_error(status: StatusCode, body: &str) -> CliError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(ToString::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });
    CliError::ApiError {
        status: status.as_u16(),
        message,
    }
}

/// Whether an error means the token was rejected
pub fn is_auth_failure(err: &CliError) -> bool {
    matches!(err, CliError::ApiError { status, .. } if (400..500).contains(status))
}
