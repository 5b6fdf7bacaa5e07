//! Recording HTTP transport for tests
//!
//! Responses are routed by method and URL fragment. Every request is recorded,
//! including the ones that had no matching route, so tests can assert on what
//! was (or was not) sent.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{PlatformError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

#[derive(Debug, Clone)]
enum Reply {
    Respond(HttpResponse),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Route {
    method: HttpMethod,
    url_fragment: String,
    reply: Reply,
}

/// Scriptable transport that never touches the network
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    routes: Vec<Route>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `response` to requests whose URL contains `url_fragment`
    pub fn on(mut self, method: HttpMethod, url_fragment: &str, response: HttpResponse) -> Self {
        self.routes.push(Route {
            method,
            url_fragment: url_fragment.to_string(),
            reply: Reply::Respond(response),
        });
        self
    }

    /// Fail matching requests with a network error
    pub fn fail_on(mut self, method: HttpMethod, url_fragment: &str, message: &str) -> Self {
        self.routes.push(Route {
            method,
            url_fragment: url_fragment.to_string(),
            reply: Reply::Fail(message.to_string()),
        });
        self
    }

    /// All requests sent so far, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose URL contains `url_fragment`
    pub fn requests_to(&self, url_fragment: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.contains(url_fragment))
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let route = self
            .routes
            .iter()
            .find(|r| r.method == request.method && request.url.contains(&r.url_fragment));

        match route.map(|r| &r.reply) {
            Some(Reply::Respond(response)) => Ok(response.clone()),
            Some(Reply::Fail(message)) => Err(PlatformError::Network(message.clone()).into()),
            None => Err(PlatformError::Network(format!(
                "no mock response for {} {}",
                request.method.as_str(),
                request.url
            ))
            .into()),
        }
    }
}
