//! Bluesky platform implementation
//!
//! Talks XRPC over the shared [`HttpTransport`]: `createSession` to log in,
//! `getAuthorFeed` to count today's tagged posts and `createRecord` to post.

use async_trait::async_trait;
use percent_encoding::utf8_percent_encode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::BlueskyCredentials;
use crate::error::{PlatformError, Result};
use crate::http::{HttpRequest, HttpTransport};
use crate::platforms::oauth1::RFC3986;
use crate::platforms::{describe_failure, Platform};
use crate::types::{is_qualifying_post, tag_content};

const POST_COLLECTION: &str = "app.bsky.feed.post";

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    access_jwt: String,
    did: String,
}

#[derive(Debug, Serialize)]
struct CreateRecordRequest<'a> {
    repo: &'a str,
    collection: &'static str,
    record: PostRecord,
}

#[derive(Debug, Serialize, Deserialize)]
struct PostRecord {
    #[serde(rename = "$type")]
    record_type: String,
    text: String,
    #[serde(rename = "createdAt")]
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct CreateRecordResponse {
    #[serde(default)]
    uri: String,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    feed: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    #[serde(default)]
    post: Option<FeedPost>,
    #[serde(default)]
    record: Option<FeedRecord>,
}

#[derive(Debug, Deserialize)]
struct FeedPost {
    record: FeedRecord,
}

#[derive(Debug, Default, Deserialize)]
struct FeedRecord {
    #[serde(default)]
    text: String,
    #[serde(default, rename = "createdAt")]
    created_at: String,
}

impl FeedItem {
    fn record(&self) -> Option<&FeedRecord> {
        self.post
            .as_ref()
            .map(|p| &p.record)
            .or(self.record.as_ref())
    }
}

/// Session obtained from `createSession`, kept for the rest of the run
struct Session {
    access_jwt: SecretString,
    did: String,
}

pub struct BlueskyClient {
    transport: Arc<dyn HttpTransport>,
    service: String,
    handle: String,
    password: SecretString,
    session: Option<Session>,
}

impl BlueskyClient {
    /// Create a new Bluesky client
    ///
    /// No request is made until [`Platform::authenticate`] is called.
    pub fn new(credentials: BlueskyCredentials, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            service: credentials.service,
            handle: credentials.handle,
            password: credentials.password,
            session: None,
        }
    }

    /// DID of the authenticated account
    pub fn did(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.did.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    fn xrpc_url(&self, method: &str) -> String {
        format!("{}/xrpc/{}", self.service, method)
    }

    fn session(&self) -> Result<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| PlatformError::Authentication("Not authenticated".to_string()).into())
    }
}

#[async_trait]
impl Platform for BlueskyClient {
    fn name(&self) -> &str {
        "bluesky"
    }

    async fn authenticate(&mut self) -> Result<()> {
        tracing::debug!("Creating Bluesky session for handle: {}", self.handle);

        let request = HttpRequest::post(self.xrpc_url("com.atproto.server.createSession"))
            .json(&CreateSessionRequest {
                identifier: &self.handle,
                password: self.password.expose_secret(),
            })
            .map_err(|e| {
                PlatformError::Authentication(format!("Failed to encode session request: {}", e))
            })?;
        let response = self.transport.send(request).await?;

        if !response.is_ok() {
            return Err(PlatformError::Authentication(describe_failure(
                "Bluesky",
                response.status,
                &response.body,
            ))
            .into());
        }

        let session: CreateSessionResponse = response.json().map_err(|e| {
            PlatformError::Authentication(format!("Failed to decode Bluesky session: {}", e))
        })?;

        tracing::debug!("Bluesky session created for {}", session.did);
        self.session = Some(Session {
            access_jwt: SecretString::from(session.access_jwt),
            did: session.did,
        });

        Ok(())
    }

    fn supports_daily_count(&self) -> bool {
        true
    }

    async fn count_tagged_today(&self, today: &str) -> Result<usize> {
        let session = self.session()?;

        let url = format!(
            "{}?actor={}",
            self.xrpc_url("app.bsky.feed.getAuthorFeed"),
            utf8_percent_encode(&self.handle, RFC3986)
        );
        let request = HttpRequest::get(url).bearer(session.access_jwt.expose_secret());
        let response = self.transport.send(request).await?;

        if !response.is_ok() {
            return Err(PlatformError::Query(format!(
                "failed to fetch posts: {}",
                describe_failure("Bluesky", response.status, &response.body)
            ))
            .into());
        }

        let feed: FeedResponse = response
            .json()
            .map_err(|e| PlatformError::Query(format!("failed to decode feed: {}", e)))?;

        let count = feed
            .feed
            .iter()
            .filter_map(FeedItem::record)
            .filter(|r| is_qualifying_post(&r.text, &r.created_at, today))
            .count();

        tracing::debug!(
            "{} of {} feed items are tagged posts from {}",
            count,
            feed.feed.len(),
            today
        );
        Ok(count)
    }

    async fn create_post(&self, content: &str) -> Result<String> {
        let session = self.session()?;
        let text = tag_content(content);

        tracing::debug!("Posting to Bluesky: {} characters", text.chars().count());

        let record = PostRecord {
            record_type: POST_COLLECTION.to_string(),
            text,
            created_at: chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        };
        let request = HttpRequest::post(self.xrpc_url("com.atproto.repo.createRecord"))
            .bearer(session.access_jwt.expose_secret())
            .json(&CreateRecordRequest {
                repo: &session.did,
                collection: POST_COLLECTION,
                record,
            })
            .map_err(|e| PlatformError::Posting(format!("Failed to encode post record: {}", e)))?;
        let response = self.transport.send(request).await?;

        if !response.is_ok() {
            return Err(PlatformError::Posting(describe_failure(
                "Bluesky",
                response.status,
                &response.body,
            ))
            .into());
        }

        // The record exists at this point; a response we can't read only loses the URI.
        let uri = response
            .json::<CreateRecordResponse>()
            .map(|r| r.uri)
            .unwrap_or_else(|e| {
                tracing::warn!("Could not read Bluesky createRecord response: {}", e);
                String::new()
            });
        tracing::debug!("Posted to Bluesky: {}", uri);

        Ok(uri)
    }
}
