//! HTTP transport shared by the platform clients
//!
//! Platform clients never build their own HTTP client. A single transport is
//! constructed once per run and handed to every client, so tests can swap in
//! [`mock::MockTransport`] and observe the exact requests without network
//! access.

use async_trait::async_trait;

use crate::error::{PlatformError, Result};

pub mod mock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An outgoing request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    /// Serialize `body` as the JSON request body
    ///
    /// Encoding failures are returned as-is for the caller to classify.
    pub fn json<T: serde::Serialize>(
        self,
        body: &T,
    ) -> std::result::Result<Self, serde_json::Error> {
        let encoded = serde_json::to_string(body)?;
        let mut request = self.header("Content-Type", "application/json");
        request.body = Some(encoded);
        Ok(request)
    }

    /// Case-insensitive header lookup
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A received response with its body already read
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Decode the body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Sends requests on behalf of the platform clients
///
/// Transport failures (DNS, refused connection, TLS) are reported as
/// `PlatformError::Network`; any HTTP status, including errors, is returned as
/// a response for the caller to interpret.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Transport backed by a single `reqwest::Client` with its default settings
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!("{} {}", request.method.as_str(), request.url);

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            PlatformError::Network(format!("{} {}: {}", request.method.as_str(), request.url, e))
        })?;

        let status = response.status().as_u16();
        // Body is best-effort; an unreadable body becomes empty.
        let body = response.text().await.unwrap_or_default();
        tracing::debug!("{} {} -> {}", request.method.as_str(), request.url, status);

        Ok(HttpResponse { status, body })
    }
}
