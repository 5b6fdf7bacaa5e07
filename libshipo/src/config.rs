//! Configuration management for Shipo
//!
//! The config file is a flat list of `key = value` lines. Blank lines and lines
//! starting with `#` are ignored, and a key that appears twice keeps its last
//! value.
//!
//! ```text
//! # Bluesky
//! handle = alice.bsky.social
//! password = app-password
//! limit = 5
//!
//! # Twitter
//! twitter_consumer_key = ...
//! twitter_consumer_secret = ...
//! twitter_access_token = ...
//! twitter_access_secret = ...
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use secrecy::SecretString;

use crate::error::{ConfigError, Result};
use crate::types::DailyLimit;

/// Default Bluesky PDS used when `bluesky_service` is not set
pub const DEFAULT_BLUESKY_SERVICE: &str = "https://bsky.social";

pub const KEY_HANDLE: &str = "handle";
pub const KEY_PASSWORD: &str = "password";
pub const KEY_LIMIT: &str = "limit";
pub const KEY_BLUESKY_SERVICE: &str = "bluesky_service";
pub const KEY_TWITTER_CONSUMER_KEY: &str = "twitter_consumer_key";
pub const KEY_TWITTER_CONSUMER_SECRET: &str = "twitter_consumer_secret";
pub const KEY_TWITTER_ACCESS_TOKEN: &str = "twitter_access_token";
pub const KEY_TWITTER_ACCESS_SECRET: &str = "twitter_access_secret";

/// Flat key/value configuration, immutable once loaded
#[derive(Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

/// Credentials and limit needed to post to Bluesky
#[derive(Debug)]
pub struct BlueskyCredentials {
    pub handle: String,
    pub password: SecretString,
    pub limit: DailyLimit,
    pub service: String,
}

/// OAuth 1.0a credentials needed to post to Twitter
#[derive(Debug)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: SecretString,
    pub access_token: SecretString,
    pub access_secret: SecretString,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from `path` if given, otherwise the default location
    ///
    /// A leading `~` in `path` is expanded.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(&expand_tilde(&path.to_string_lossy())),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::ReadError(e)
            }
        })?;

        let config = Self::parse(&content)?;
        tracing::debug!(
            "Loaded {} config entries from {}",
            config.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse `key = value` lines
    pub fn parse(content: &str) -> Result<Self> {
        let mut values = HashMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedLine(line.to_string()))?;
            values.insert(key.trim().to_string(), value.trim().to_string());
        }

        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Extract Bluesky credentials
    ///
    /// `handle`, `password` and `limit` must be present. Their values may be
    /// empty, except `limit` which must parse as a non-negative integer.
    pub fn bluesky(&self) -> Result<BlueskyCredentials> {
        let handle = self.require(KEY_HANDLE)?;
        let password = self.require(KEY_PASSWORD)?;
        let limit = self.require(KEY_LIMIT)?;

        let limit: DailyLimit = limit
            .parse()
            .map_err(|_| ConfigError::InvalidLimit(limit.to_string()))?;

        let service = match self.get(KEY_BLUESKY_SERVICE) {
            Some(s) if !s.is_empty() => normalize_service_url(s),
            _ => DEFAULT_BLUESKY_SERVICE.to_string(),
        };

        Ok(BlueskyCredentials {
            handle: handle.to_string(),
            password: SecretString::from(password.to_string()),
            limit,
            service,
        })
    }

    /// Extract Twitter credentials; all four must be present and non-empty
    pub fn twitter(&self) -> Result<TwitterCredentials> {
        let consumer_key = self.require_non_empty(KEY_TWITTER_CONSUMER_KEY)?;
        let consumer_secret = self.require_non_empty(KEY_TWITTER_CONSUMER_SECRET)?;
        let access_token = self.require_non_empty(KEY_TWITTER_ACCESS_TOKEN)?;
        let access_secret = self.require_non_empty(KEY_TWITTER_ACCESS_SECRET)?;

        Ok(TwitterCredentials {
            consumer_key: consumer_key.to_string(),
            consumer_secret: SecretString::from(consumer_secret.to_string()),
            access_token: SecretString::from(access_token.to_string()),
            access_secret: SecretString::from(access_secret.to_string()),
        })
    }

    fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingField(key.to_string()).into())
    }

    fn require_non_empty(&self, key: &str) -> Result<&str> {
        let value = self.require(key)?;
        if value.is_empty() {
            return Err(ConfigError::EmptyField(key.to_string()).into());
        }
        Ok(value)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Config {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// Values hold passwords and tokens, so only keys are shown.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("Config").field("keys", &keys).finish()
    }
}

fn normalize_service_url(service: &str) -> String {
    let service = service.trim_end_matches('/');
    if service.starts_with("http://") || service.starts_with("https://") {
        service.to_string()
    } else {
        format!("https://{}", service)
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

/// Resolve the configuration file path
///
/// `SHIPO_CONFIG` overrides the default `~/.config/shipo-cli/config`.
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("SHIPO_CONFIG") {
        return Ok(expand_tilde(&path));
    }

    let home_dir = dirs::home_dir().ok_or_else(|| {
        ConfigError::ReadError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not determine home directory",
        ))
    })?;

    Ok(home_dir.join(".config").join("shipo-cli").join("config"))
}
