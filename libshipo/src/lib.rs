//! Shipo - post a short message to Bluesky and Twitter from the terminal
//!
//! This library holds the configuration loader, the platform clients and the
//! dispatcher that enforces the daily Bluesky post limit. The `shipo` binary
//! is a thin CLI over [`dispatcher::run`].

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod logging;
pub mod platforms;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use dispatcher::{Dispatcher, Target};
pub use error::{Result, ShipoError};
pub use http::{HttpTransport, ReqwestTransport};
pub use types::{DailyLimit, PlatformSelector, PostResult, CAMPAIGN_TAG};
