//! # Symmetria HTTP Client
//!
//! Thin wrapper around `POST /command` for use by the MCP server.

use serde_json::Value;

/// Errors from the HTTP client layer.
///
/// A protocol-level failure (`ok: false` in the response record) is not a
/// client error; it comes back as a normal response.
#[derive(Debug)]
pub enum ClientError {
    /// Cannot reach the Symmetria server.
    ConnectionFailed(String),
    /// 401 Unauthorized - invalid or missing API key.
    Unauthorized,
    /// 429 Too Many Requests.
    RateLimited,
    /// The server answered with something other than a response record.
    ServerError(u16, String),
    /// Failed to parse response body.
    ParseError(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed(url) => write!(f, "Cannot connect to Symmetria at {url}"),
            Self::Unauthorized => write!(f, "Unauthorized: invalid or missing API key"),
            Self::RateLimited => write!(f, "Rate limited: too many requests"),
            Self::ServerError(status, msg) => write!(f, "Server error ({status}): {msg}"),
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

/// HTTP client for one Symmetria server.
#[derive(Clone)]
pub struct SymmetriaClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SymmetriaClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with optional Bearer auth.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    /// Send a request and handle connection errors.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        req.send()
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", self.base_url)))
    }

    /// GET /health
    pub async fn health(&self) -> Result<Value, ClientError> {
        let req = self.request(reqwest::Method::GET, "/health");
        let resp = self.send(req).await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ServerError(status, body));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    }

    /// POST /command. Returns the response record, whether `ok` or not.
    pub async fn command(&self, cmd: &str, args: Value) -> Result<Value, ClientError> {
        let body = serde_json::json!({ "cmd": cmd, "args": args });
        let req = self.request(reqwest::Method::POST, "/command").json(&body);
        let resp = self.send(req).await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ClientError::RateLimited);
        }

        let text = resp
            .text()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))?;
        match serde_json::from_str::<Value>(&text) {
            Ok(record) if record.get("ok").is_some() => Ok(record),
            _ => Err(ClientError::ServerError(status.as_u16(), text)),
        }
    }
}
