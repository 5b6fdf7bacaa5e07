//! Platform abstraction and implementations
//!
//! Every platform can create posts. Logging in and counting today's tagged
//! posts are optional capabilities: Bluesky provides all three, Twitter only
//! posting (its requests are individually signed, so there is no login step).
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use libshipo::config::Config;
//! use libshipo::http::ReqwestTransport;
//! use libshipo::platforms::{bluesky::BlueskyClient, Platform};
//!
//! # async fn example() -> libshipo::error::Result<()> {
//! let config = Config::load()?;
//! let transport = Arc::new(ReqwestTransport::new());
//! let mut platform = BlueskyClient::new(config.bluesky()?, transport);
//!
//! platform.authenticate().await?;
//! if platform.supports_daily_count() {
//!     let today = chrono::Local::now().format("%Y-%m-%d").to_string();
//!     println!("{} tagged posts today", platform.count_tagged_today(&today).await?);
//! }
//! let post_id = platform.create_post("Hello from the terminal").await?;
//! println!("Posted: {}", post_id);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::{PlatformError, Result};

pub mod bluesky;
pub mod oauth1;
pub mod twitter;

// Mock platform is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Unified interface over the platforms Shipo posts to
#[async_trait]
pub trait Platform: Send + Sync {
    /// Lowercase platform identifier (e.g. "bluesky", "twitter")
    fn name(&self) -> &str;

    /// Establish a session with the platform
    ///
    /// Platforms without a login step keep the default, which does nothing.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Authentication` if the platform rejects the
    /// credentials, or `PlatformError::Network` if it cannot be reached.
    async fn authenticate(&mut self) -> Result<()> {
        Ok(())
    }

    /// Whether [`Platform::count_tagged_today`] is available
    fn supports_daily_count(&self) -> bool {
        false
    }

    /// Count posts carrying the campaign tag whose timestamp starts with `today`
    ///
    /// # Arguments
    ///
    /// * `today` - Local date formatted as `YYYY-MM-DD`
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Query` if the feed cannot be fetched or decoded,
    /// and `PlatformError::NotImplemented` for platforms without counting.
    async fn count_tagged_today(&self, _today: &str) -> Result<usize> {
        Err(PlatformError::NotImplemented(format!(
            "{} does not support counting posts",
            self.name()
        ))
        .into())
    }

    /// Publish `content` and return the platform-specific post ID
    ///
    /// Any platform-specific decoration (such as the campaign tag) is added
    /// here, not by the caller.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Posting` if the platform rejects the post,
    /// `PlatformError::Authentication` if a required session is missing.
    async fn create_post(&self, content: &str) -> Result<String>;
}

/// Turn a non-success response into a readable message
///
/// The body is included as-is; an empty body is reported as such.
pub(crate) fn describe_failure(platform: &str, status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("{} returned HTTP {} with an empty body", platform, status)
    } else {
        format!("{} returned HTTP {}: {}", platform, status, body)
    }
}
