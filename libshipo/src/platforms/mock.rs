//! Mock platform implementation for testing
//!
//! A configurable platform double that can succeed, fail at any step, and
//! report a chosen number of tagged posts for today. It records every call so
//! tests can verify the dispatcher's ordering and gating without credentials
//! or network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{PlatformError, Result};
use crate::platforms::Platform;

/// Configuration for mock platform behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Platform name (e.g., "mock-bluesky")
    pub name: String,

    /// Whether authentication should succeed
    pub auth_succeeds: bool,

    /// Tagged posts reported for today; `None` means counting is unsupported
    pub tagged_today: Option<usize>,

    /// Whether counting should succeed
    pub count_succeeds: bool,

    /// Whether posting should succeed
    pub post_succeeds: bool,

    /// Error to return on authentication failure
    pub auth_error: Option<String>,

    /// Error to return on posting failure
    pub post_error: Option<String>,

    /// Shared, ordered log of calls ("name:authenticate", "name:count", "name:post")
    pub call_log: Arc<Mutex<Vec<String>>>,

    /// Posts that have been made (for verification)
    pub posted_content: Arc<Mutex<Vec<String>>>,

    /// Dates passed to count_tagged_today
    pub counted_dates: Arc<Mutex<Vec<String>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            auth_succeeds: true,
            tagged_today: None,
            count_succeeds: true,
            post_succeeds: true,
            auth_error: None,
            post_error: None,
            call_log: Arc::new(Mutex::new(Vec::new())),
            posted_content: Arc::new(Mutex::new(Vec::new())),
            counted_dates: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock platform for testing
#[derive(Debug, Clone)]
pub struct MockPlatform {
    config: MockConfig,
    authenticated: bool,
}

impl MockPlatform {
    /// Create a new mock platform with the given configuration
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            authenticated: false,
        }
    }

    /// Create a post-only mock platform that always succeeds
    pub fn success(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            ..Default::default()
        })
    }

    /// Create a mock platform that reports `count` tagged posts today
    pub fn with_tagged_today(name: &str, count: usize) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            tagged_today: Some(count),
            ..Default::default()
        })
    }

    /// Create a mock platform that fails authentication
    pub fn auth_failure(name: &str, error: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            auth_succeeds: false,
            auth_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// Create a mock platform that supports counting but fails to count
    pub fn count_failure(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            tagged_today: Some(0),
            count_succeeds: false,
            ..Default::default()
        })
    }

    /// Create a mock platform that fails posting
    pub fn post_failure(name: &str, error: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            post_succeeds: false,
            post_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// Use `log` as the call log, so several mocks can share one ordering
    pub fn with_call_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.config.call_log = log;
        self
    }

    /// Ordered calls made to this platform (or to all platforms sharing the log)
    pub fn calls(&self) -> Vec<String> {
        self.config.call_log.lock().unwrap().clone()
    }

    /// Get the number of times create_post was called
    pub fn post_call_count(&self) -> usize {
        let suffix = format!("{}:post", self.config.name);
        self.calls().iter().filter(|c| **c == suffix).count()
    }

    /// Get all content that was posted
    pub fn posted_content(&self) -> Vec<String> {
        self.config.posted_content.lock().unwrap().clone()
    }

    /// Get all dates that were counted
    pub fn counted_dates(&self) -> Vec<String> {
        self.config.counted_dates.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.config
            .call_log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.config.name, call));
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn authenticate(&mut self) -> Result<()> {
        self.record("authenticate");

        if self.config.auth_succeeds {
            self.authenticated = true;
            Ok(())
        } else {
            let error_msg = self
                .config
                .auth_error
                .clone()
                .unwrap_or_else(|| "Mock authentication failed".to_string());
            Err(PlatformError::Authentication(error_msg).into())
        }
    }

    fn supports_daily_count(&self) -> bool {
        self.config.tagged_today.is_some()
    }

    async fn count_tagged_today(&self, today: &str) -> Result<usize> {
        self.record("count");
        self.config
            .counted_dates
            .lock()
            .unwrap()
            .push(today.to_string());

        if !self.authenticated {
            return Err(PlatformError::Authentication("Not authenticated".to_string()).into());
        }

        match self.config.tagged_today {
            Some(_) if !self.config.count_succeeds => {
                Err(PlatformError::Query("Mock count failed".to_string()).into())
            }
            Some(count) => Ok(count),
            None => Err(PlatformError::NotImplemented(format!(
                "{} does not support counting posts",
                self.config.name
            ))
            .into()),
        }
    }

    async fn create_post(&self, content: &str) -> Result<String> {
        self.record("post");

        if !self.authenticated {
            return Err(PlatformError::Authentication("Not authenticated".to_string()).into());
        }

        if self.config.post_succeeds {
            self.config
                .posted_content
                .lock()
                .unwrap()
                .push(content.to_string());

            Ok(format!("{}:mock-{}", self.config.name, uuid::Uuid::new_v4()))
        } else {
            let error_msg = self
                .config
                .post_error
                .clone()
                .unwrap_or_else(|| "Mock posting failed".to_string());
            Err(PlatformError::Posting(error_msg).into())
        }
    }
}
