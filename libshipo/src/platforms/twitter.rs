//! Twitter (X) platform implementation
//!
//! Posts through the v2 `POST /2/tweets` endpoint. Requests are signed with
//! OAuth 1.0a, so the client has no login step and no counting capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::TwitterCredentials;
use crate::error::{PlatformError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpTransport};
use crate::platforms::oauth1::OAuthSigner;
use crate::platforms::{describe_failure, Platform};

pub const TWEETS_URL: &str = "https://api.x.com/2/tweets";

#[derive(Debug, Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: CreatedTweet,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
}

pub struct TwitterClient {
    transport: Arc<dyn HttpTransport>,
    signer: OAuthSigner,
}

impl TwitterClient {
    pub fn new(credentials: TwitterCredentials, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            signer: OAuthSigner::new(credentials),
        }
    }
}

#[async_trait]
impl Platform for TwitterClient {
    fn name(&self) -> &str {
        "twitter"
    }

    async fn create_post(&self, content: &str) -> Result<String> {
        tracing::debug!("Posting to Twitter: {} characters", content.chars().count());

        let authorization = self
            .signer
            .authorization_header(HttpMethod::Post, TWEETS_URL)?;
        let request = HttpRequest::post(TWEETS_URL)
            .header("Authorization", authorization)
            .json(&CreateTweetRequest { text: content })
            .map_err(|e| PlatformError::Posting(format!("Failed to encode tweet: {}", e)))?;
        let response = self.transport.send(request).await?;

        // The endpoint answers 201 Created; anything else is a failure.
        if response.status != 201 {
            return Err(PlatformError::Posting(format!(
                "failed to post tweet: {}",
                describe_failure("Twitter", response.status, &response.body)
            ))
            .into());
        }

        let id = response
            .json::<CreateTweetResponse>()
            .map(|r| r.data.id)
            .unwrap_or_else(|e| {
                tracing::warn!("Could not read Twitter create response: {}", e);
                String::new()
            });
        tracing::debug!("Posted to Twitter: {}", id);

        Ok(id)
    }
}
