//! Core types for Shipo

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Text appended to every Bluesky post created by Shipo
///
/// Also used to recognise Shipo posts when counting today's posts.
pub const CAMPAIGN_TAG: &str = "#Shipo-CLI";

/// Platforms Shipo can post to, in dispatch order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Bluesky,
    Twitter,
}

impl PlatformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKind::Bluesky => "bluesky",
            PlatformKind::Twitter => "twitter",
        }
    }

    /// Selector flag for this platform
    pub fn flag(&self) -> char {
        match self {
            PlatformKind::Bluesky => 'b',
            PlatformKind::Twitter => 't',
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which platforms a run should post to
///
/// Parsed from the `-p` value by substring match: any string containing `b`
/// selects Bluesky and any string containing `t` selects Twitter. A string
/// with neither selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformSelector {
    pub bluesky: bool,
    pub twitter: bool,
}

impl PlatformSelector {
    pub const DEFAULT: &'static str = "b";

    pub fn parse(selector: &str) -> Self {
        Self {
            bluesky: selector.contains(PlatformKind::Bluesky.flag()),
            twitter: selector.contains(PlatformKind::Twitter.flag()),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.bluesky && !self.twitter
    }

    /// Selected platforms in dispatch order (Bluesky first)
    pub fn platforms(&self) -> Vec<PlatformKind> {
        let mut platforms = Vec::new();
        if self.bluesky {
            platforms.push(PlatformKind::Bluesky);
        }
        if self.twitter {
            platforms.push(PlatformKind::Twitter);
        }
        platforms
    }
}

/// Maximum number of tagged posts per calendar day; 0 disables the check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DailyLimit(u64);

impl DailyLimit {
    pub const UNLIMITED: DailyLimit = DailyLimit(0);

    pub fn new(limit: u64) -> Self {
        Self(limit)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_unlimited(&self) -> bool {
        self.0 == 0
    }

    /// Whether another post is allowed given today's count
    pub fn permits(&self, posted_today: usize) -> bool {
        self.is_unlimited() || (posted_today as u64) < self.0
    }
}

/// Accepts any decimal integer in the signed 64-bit range that is not
/// negative, with an optional sign (`+5`, `-0`)
impl FromStr for DailyLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|e| format!("Invalid limit '{}': {}", s, e))?;
        u64::try_from(value)
            .map(DailyLimit)
            .map_err(|_| format!("Invalid limit '{}': must not be negative", s))
    }
}

impl fmt::Display for DailyLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a successful post to one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostResult {
    pub platform: String,
    pub post_id: String,
}

/// Append the campaign tag to user content
pub fn tag_content(content: &str) -> String {
    format!("{} {}", content, CAMPAIGN_TAG)
}

/// Whether a post counts against today's limit
///
/// The check is a plain string-prefix comparison of the service timestamp
/// against the local `YYYY-MM-DD` date, without timezone normalisation.
pub fn is_qualifying_post(text: &str, created_at: &str, today: &str) -> bool {
    text.contains(CAMPAIGN_TAG) && created_at.starts_with(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_single_flags() {
        let b = PlatformSelector::parse("b");
        assert!(b.bluesky);
        assert!(!b.twitter);

        let t = PlatformSelector::parse("t");
        assert!(!t.bluesky);
        assert!(t.twitter);
    }

    #[test]
    fn test_selector_both_flags_in_any_order() {
        for s in ["bt", "tb", "b,t", "xbxtx"] {
            let selector = PlatformSelector::parse(s);
            assert!(selector.bluesky && selector.twitter, "selector {:?}", s);
            assert_eq!(
                selector.platforms(),
                vec![PlatformKind::Bluesky, PlatformKind::Twitter]
            );
        }
    }

    #[test]
    fn test_selector_without_flags_is_empty() {
        assert!(PlatformSelector::parse("").is_empty());
        assert!(PlatformSelector::parse("x").is_empty());
        // Match is case-sensitive
        assert!(PlatformSelector::parse("BT").is_empty());
        assert!(PlatformSelector::parse("").platforms().is_empty());
    }

    #[test]
    fn test_selector_default_is_bluesky() {
        let selector = PlatformSelector::parse(PlatformSelector::DEFAULT);
        assert_eq!(selector.platforms(), vec![PlatformKind::Bluesky]);
    }

    #[test]
    fn test_daily_limit_zero_always_permits() {
        let limit = DailyLimit::UNLIMITED;
        assert!(limit.is_unlimited());
        assert!(limit.permits(0));
        assert!(limit.permits(10_000));
    }

    #[test]
    fn test_daily_limit_boundary() {
        let limit = DailyLimit::new(5);
        assert!(limit.permits(4));
        assert!(!limit.permits(5));
        assert!(!limit.permits(6));
    }

    #[test]
    fn test_daily_limit_parse() {
        assert_eq!("5".parse::<DailyLimit>().unwrap(), DailyLimit::new(5));
        assert_eq!("0".parse::<DailyLimit>().unwrap(), DailyLimit::UNLIMITED);
        assert!("-1".parse::<DailyLimit>().is_err());
        assert!("abc".parse::<DailyLimit>().is_err());
        assert!("".parse::<DailyLimit>().is_err());
    }

    #[test]
    fn test_daily_limit_parse_wide_and_signed() {
        assert_eq!(
            "5000000000".parse::<DailyLimit>().unwrap(),
            DailyLimit::new(5_000_000_000)
        );
        assert_eq!("+5".parse::<DailyLimit>().unwrap(), DailyLimit::new(5));
        assert_eq!("-0".parse::<DailyLimit>().unwrap(), DailyLimit::UNLIMITED);
        assert!("9223372036854775808".parse::<DailyLimit>().is_err());

        let limit = DailyLimit::new(5_000_000_000);
        assert!(limit.permits(4_999_999));
    }

    #[test]
    fn test_tag_content() {
        assert_eq!(tag_content("Hello world"), "Hello world #Shipo-CLI");
    }

    #[test]
    fn test_qualifying_post_requires_tag_and_today() {
        let today = "2024-03-10";

        assert!(is_qualifying_post(
            "Hello #Shipo-CLI",
            "2024-03-10T08:15:00Z",
            today
        ));
        // Tagged but yesterday
        assert!(!is_qualifying_post(
            "Hello #Shipo-CLI",
            "2024-03-09T23:59:59Z",
            today
        ));
        // Today but untagged
        assert!(!is_qualifying_post("Hello", "2024-03-10T08:15:00Z", today));
        // Tag must match exactly
        assert!(!is_qualifying_post(
            "Hello #shipo-cli",
            "2024-03-10T08:15:00Z",
            today
        ));
    }

    #[test]
    fn test_platform_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&PlatformKind::Bluesky).unwrap(),
            "\"bluesky\""
        );
        assert_eq!(PlatformKind::Twitter.to_string(), "twitter");
    }
}
