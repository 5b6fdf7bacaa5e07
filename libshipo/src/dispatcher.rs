//! Multi-platform dispatch with the daily post limit
//!
//! Targets are built for every selected platform before any request is sent,
//! so a missing credential fails the run without touching the network. They
//! then run one after another in a fixed order (Bluesky, then Twitter) and the
//! first error stops the whole run.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, ShipoError};
use crate::http::HttpTransport;
use crate::platforms::{bluesky::BlueskyClient, twitter::TwitterClient, Platform};
use crate::types::{DailyLimit, PlatformKind, PlatformSelector, PostResult};

/// A platform to post to, with its daily limit if one applies
pub struct Target {
    platform: Box<dyn Platform>,
    daily_limit: Option<DailyLimit>,
}

impl Target {
    pub fn new(platform: Box<dyn Platform>) -> Self {
        Self {
            platform,
            daily_limit: None,
        }
    }

    /// Gate posting on today's tagged-post count
    pub fn with_daily_limit(mut self, limit: DailyLimit) -> Self {
        self.daily_limit = Some(limit);
        self
    }

    pub fn name(&self) -> &str {
        self.platform.name()
    }

    pub fn daily_limit(&self) -> Option<DailyLimit> {
        self.daily_limit
    }
}

/// Build targets for the selected platforms
///
/// Reads every credential the selection needs up front. Nothing is sent over
/// the network here.
///
/// # Errors
///
/// Returns a configuration error naming the first missing or invalid key.
pub fn create_targets(
    config: &Config,
    selector: PlatformSelector,
    transport: Arc<dyn HttpTransport>,
) -> Result<Vec<Target>> {
    let mut targets = Vec::new();

    for kind in selector.platforms() {
        let target = match kind {
            PlatformKind::Bluesky => {
                let credentials = config.bluesky()?;
                let limit = credentials.limit;
                Target::new(Box::new(BlueskyClient::new(credentials, transport.clone())))
                    .with_daily_limit(limit)
            }
            PlatformKind::Twitter => {
                let credentials = config.twitter()?;
                Target::new(Box::new(TwitterClient::new(credentials, transport.clone())))
            }
        };
        targets.push(target);
    }

    Ok(targets)
}

/// Today's local date as `YYYY-MM-DD`
pub fn local_today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Runs targets in order, stopping at the first error
pub struct Dispatcher {
    targets: Vec<Target>,
    today: String,
}

impl Dispatcher {
    pub fn new(targets: Vec<Target>) -> Self {
        Self {
            targets,
            today: local_today(),
        }
    }

    /// Override the date used to count today's posts
    pub fn with_today(mut self, today: impl Into<String>) -> Self {
        self.today = today.into();
        self
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Post `content` to every target
    ///
    /// # Errors
    ///
    /// Returns `ShipoError::InvalidInput` for empty content, otherwise the
    /// first authentication, query, limit or posting error. Targets after
    /// the failing one are not attempted.
    pub async fn dispatch(&mut self, content: &str) -> Result<Vec<PostResult>> {
        self.dispatch_with(content, |_| {}).await
    }

    /// Post `content` to every target, handing each result to `on_result`
    /// as soon as that platform has accepted the post
    ///
    /// Results reported before an error stay reported: a later failure does
    /// not undo a post that already went out.
    pub async fn dispatch_with<F>(
        &mut self,
        content: &str,
        mut on_result: F,
    ) -> Result<Vec<PostResult>>
    where
        F: FnMut(&PostResult),
    {
        if content.is_empty() {
            return Err(ShipoError::InvalidInput("Content cannot be empty".to_string()));
        }

        let mut results = Vec::with_capacity(self.targets.len());
        for target in &mut self.targets {
            let result = post_to_target(target, content, &self.today).await?;
            on_result(&result);
            results.push(result);
        }
        Ok(results)
    }
}

async fn post_to_target(target: &mut Target, content: &str, today: &str) -> Result<PostResult> {
    let name = target.platform.name().to_string();

    info!("Authenticating with {}...", name);
    target.platform.authenticate().await?;

    match target.daily_limit {
        Some(limit) if target.platform.supports_daily_count() => {
            check_daily_limit(target, limit, today).await?;
        }
        Some(_) => warn!("{} cannot count its posts; daily limit not enforced", name),
        None => {}
    }

    info!("Creating post on {}...", name);
    let post_id = target.platform.create_post(content).await?;
    info!("Post successful on {}", name);

    Ok(PostResult {
        platform: name,
        post_id,
    })
}

async fn check_daily_limit(target: &Target, limit: DailyLimit, today: &str) -> Result<()> {
    let name = target.platform.name();
    let posted_today = target.platform.count_tagged_today(today).await?;
    info!(
        "{} tagged posts on {} today (limit: {})",
        posted_today,
        name,
        if limit.is_unlimited() {
            "none".to_string()
        } else {
            limit.to_string()
        }
    );

    if !limit.permits(posted_today) {
        return Err(ShipoError::LimitReached {
            platform: name.to_string(),
            limit: limit.value(),
        });
    }
    Ok(())
}

/// Post `content` to the platforms named by `selector`
///
/// An empty selection (no `b` and no `t`) posts nothing and succeeds.
pub async fn run(
    content: &str,
    selector: &str,
    config: &Config,
    transport: Arc<dyn HttpTransport>,
) -> Result<Vec<PostResult>> {
    run_with(content, selector, config, transport, |_| {}).await
}

/// Like [`run`], reporting each successful post to `on_result` as it happens
pub async fn run_with<F>(
    content: &str,
    selector: &str,
    config: &Config,
    transport: Arc<dyn HttpTransport>,
    on_result: F,
) -> Result<Vec<PostResult>>
where
    F: FnMut(&PostResult),
{
    if content.is_empty() {
        return Err(ShipoError::InvalidInput("Content cannot be empty".to_string()));
    }

    let selection = PlatformSelector::parse(selector);
    if selection.is_empty() {
        warn!(
            "Platform selector '{}' matches no platform (use 'b', 't' or both); nothing to do",
            selector
        );
        return Ok(Vec::new());
    }

    let targets = create_targets(config, selection, transport)?;
    Dispatcher::new(targets)
        .dispatch_with(content, on_result)
        .await
}
