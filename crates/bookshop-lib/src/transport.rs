//! HTTP transport for the REST API
//!
//! The `Transport` trait is the seam between the synchronization service
//! and the network. `HttpTransport` implements it with reqwest; tests
//! substitute scripted implementations.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::criteria::QueryParams;
use crate::error::{SyncError, SyncResult};

/// A request relative to the API base URI
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Path relative to the base URI, e.g. `buecher`
    pub path: String,
    /// Raw path segments appended after `path`; percent-encoded when sent
    pub segments: Vec<String>,
    pub query: QueryParams,
    pub headers: Vec<(HeaderName, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            segments: Vec::new(),
            query: QueryParams::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append one path segment, such as an entity id, taken literally
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Path and raw segments joined with `/`, for logs and matching
    pub fn target(&self) -> String {
        std::iter::once(self.path.as_str())
            .chain(self.segments.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a header set on this request
    pub fn header_value(&self, name: &HeaderName) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A response that was received from the server
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    /// Add a header; values that are not valid header text are skipped
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Parse the body as JSON; an empty body or a JSON `null` yields `None`
    pub fn json_body(&self) -> Result<Option<Value>, serde_json::Error> {
        if self.body.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str(&self.body)? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }
}

/// Transport gateway used by the synchronization service
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a request.
    ///
    /// Returns `SyncError::Local` when no response was received and
    /// `SyncError::Http` for a response with a non-success status.
    async fn execute(&self, request: HttpRequest) -> SyncResult<HttpResponse>;
}

/// Transport backed by a reqwest client
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a new transport for the configured base URI
    pub fn new(config: &ClientConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to create HTTP client: {}", e)))?;

        let base_url = config.base_url()?;

        Ok(Self { client, base_url })
    }

    /// Create a transport with default timeouts
    pub fn with_base_uri(base_uri: &str) -> SyncResult<Self> {
        Self::new(&ClientConfig::with_base_uri(base_uri))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: HttpRequest) -> SyncResult<HttpResponse> {
        let url = resolve_url(&self.base_url, &request)?;

        debug!(method = %request.method, url = %url, query = %request.query.to_query_string(), "Sending request");

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(CONTENT_TYPE, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(request.query.as_slice());
        }
        if request.header_value(&ACCEPT).is_none() {
            builder = builder.header(ACCEPT, "application/json");
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.clone(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SyncError::Local(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| SyncError::Local(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(SyncError::Http {
                status: status.as_u16(),
                body: error_payload(&body),
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

/// Join the request path onto the base URL and push each segment encoded,
/// so that `/`, `?` or `..` inside an id cannot leave the collection
fn resolve_url(base_url: &Url, request: &HttpRequest) -> SyncResult<Url> {
    let mut url = base_url
        .join(&request.path)
        .map_err(|e| SyncError::Config(format!("invalid path {}: {}", request.path, e)))?;

    if !request.segments.is_empty() {
        url.path_segments_mut()
            .map_err(|_| SyncError::Config(format!("base URI {} cannot carry paths", base_url)))?
            .pop_if_empty()
            .extend(request.segments.iter());
    }
    Ok(url)
}

/// Raw error body: JSON when it parses, otherwise the text itself
fn error_payload(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())))
}
