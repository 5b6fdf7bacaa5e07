//! End-to-end dispatch tests
//!
//! These drive `dispatcher::run` with the real Bluesky and Twitter clients on
//! top of a mock transport, covering:
//! - posting under, at and above the daily limit
//! - multi-platform ordering
//! - failing before any request when credentials are missing
//! - abort-on-first-error

use anyhow::Result;
use libshipo::config::Config;
use libshipo::dispatcher::{self, local_today};
use libshipo::error::{ConfigError, PlatformError, ShipoError};
use libshipo::http::mock::MockTransport;
use libshipo::http::{HttpMethod, HttpResponse};
use std::sync::Arc;

const SESSION_OK: &str =
    r#"{"accessJwt":"jwt-abc","refreshJwt":"r","handle":"alice.bsky.social","did":"did:plc:alice"}"#;
const RECORD_OK: &str = r#"{"uri":"at://did:plc:alice/app.bsky.feed.post/3kabc","cid":"bafyrei"}"#;
const TWEET_OK: &str = r#"{"data":{"id":"1790000000000000000","text":"Hello world"}}"#;

fn bluesky_config(limit: &str) -> Vec<(String, String)> {
    vec![
        ("handle".to_string(), "alice.bsky.social".to_string()),
        ("password".to_string(), "app-password".to_string()),
        ("limit".to_string(), limit.to_string()),
    ]
}

fn twitter_config() -> Vec<(String, String)> {
    [
        "twitter_consumer_key",
        "twitter_consumer_secret",
        "twitter_access_token",
        "twitter_access_secret",
    ]
    .iter()
    .map(|k| (k.to_string(), format!("{}-value", k)))
    .collect()
}

/// Feed with `today_tagged` qualifying posts plus some that must not count
fn feed_json(today_tagged: usize) -> String {
    let today = local_today();
    let mut items = Vec::new();

    for i in 0..today_tagged {
        items.push(serde_json::json!({
            "post": { "record": {
                "text": format!("post {} #Shipo-CLI", i),
                "createdAt": format!("{}T0{}:00:00Z", today, i % 10)
            }}
        }));
    }
    items.push(serde_json::json!({
        "post": { "record": { "text": "no tag", "createdAt": format!("{}T12:00:00Z", today) }}
    }));
    items.push(serde_json::json!({
        "post": { "record": { "text": "old #Shipo-CLI", "createdAt": "1999-12-31T23:59:59Z" }}
    }));

    serde_json::json!({ "feed": items }).to_string()
}

fn bluesky_transport(today_tagged: usize) -> MockTransport {
    MockTransport::new()
        .on(HttpMethod::Post, "createSession", HttpResponse::new(200, SESSION_OK))
        .on(
            HttpMethod::Get,
            "getAuthorFeed",
            HttpResponse::new(200, feed_json(today_tagged)),
        )
        .on(HttpMethod::Post, "createRecord", HttpResponse::new(200, RECORD_OK))
}

fn posted_texts(transport: &MockTransport) -> Vec<String> {
    transport
        .requests_to("createRecord")
        .iter()
        .map(|r| {
            let body: serde_json::Value =
                serde_json::from_str(r.body.as_deref().unwrap_or("{}")).unwrap();
            body["record"]["text"].as_str().unwrap_or_default().to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_post_under_limit() -> Result<()> {
    let config: Config = bluesky_config("5").into_iter().collect();
    let transport = bluesky_transport(3);

    let results = dispatcher::run("Hello world", "b", &config, Arc::new(transport.clone())).await?;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].platform, "bluesky");
    assert_eq!(results[0].post_id, "at://did:plc:alice/app.bsky.feed.post/3kabc");
    assert_eq!(posted_texts(&transport), vec!["Hello world #Shipo-CLI"]);

    let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            "https://bsky.social/xrpc/com.atproto.server.createSession",
            "https://bsky.social/xrpc/app.bsky.feed.getAuthorFeed?actor=alice.bsky.social",
            "https://bsky.social/xrpc/com.atproto.repo.createRecord",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_limit_reached_blocks_post() -> Result<()> {
    let config: Config = bluesky_config("5").into_iter().collect();
    let transport = bluesky_transport(5);

    let err = dispatcher::run("Hello world", "b", &config, Arc::new(transport.clone()))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Daily post limit of 5 reached"));
    assert_eq!(err.exit_code(), 1);
    assert!(transport.requests_to("createRecord").is_empty());
    Ok(())
}

#[tokio::test]
async fn test_zero_limit_posts_regardless_of_count() -> Result<()> {
    let config: Config = bluesky_config("0").into_iter().collect();
    let transport = bluesky_transport(42);

    dispatcher::run("Hello world", "b", &config, Arc::new(transport.clone())).await?;

    assert_eq!(posted_texts(&transport).len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_both_platforms_in_order() -> Result<()> {
    let config: Config = bluesky_config("5")
        .into_iter()
        .chain(twitter_config())
        .collect();
    let transport = bluesky_transport(0).on(
        HttpMethod::Post,
        "api.x.com/2/tweets",
        HttpResponse::new(201, TWEET_OK),
    );

    for selector in ["bt", "tb"] {
        let before = transport.request_count();
        let results =
            dispatcher::run("Hello world", selector, &config, Arc::new(transport.clone())).await?;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].platform, "bluesky");
        assert_eq!(results[1].platform, "twitter");
        assert_eq!(results[1].post_id, "1790000000000000000");

        let requests = &transport.requests()[before..];
        assert_eq!(requests.len(), 4);
        assert!(requests[3].url.contains("api.x.com/2/tweets"));

        let tweet: serde_json::Value =
            serde_json::from_str(requests[3].body.as_deref().unwrap()).unwrap();
        assert_eq!(tweet["text"], "Hello world");
    }
    Ok(())
}

#[tokio::test]
async fn test_twitter_only_skips_bluesky_checks() -> Result<()> {
    // No Bluesky keys at all
    let config: Config = twitter_config().into_iter().collect();
    let transport = MockTransport::new().on(
        HttpMethod::Post,
        "/2/tweets",
        HttpResponse::new(201, TWEET_OK),
    );

    let results = dispatcher::run("Hello world", "t", &config, Arc::new(transport.clone())).await?;

    assert_eq!(results.len(), 1);
    assert_eq!(transport.request_count(), 1);
    assert!(transport.requests_to("bsky").is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_key_fails_before_any_request() -> Result<()> {
    let cases: Vec<(&str, Config, &str)> = vec![
        (
            "b",
            [("handle", "alice"), ("limit", "5")].into_iter().collect(),
            "password",
        ),
        (
            "b",
            [("password", "pw"), ("limit", "5")].into_iter().collect(),
            "handle",
        ),
        (
            "b",
            [("handle", "alice"), ("password", "pw")].into_iter().collect(),
            "limit",
        ),
        // Bluesky keys are fine but Twitter's are missing: still nothing is sent
        ("bt", bluesky_config("5").into_iter().collect(), "twitter_consumer_key"),
    ];

    for (selector, config, missing) in cases {
        let transport = bluesky_transport(0);
        let err = dispatcher::run("Hello", selector, &config, Arc::new(transport.clone()))
            .await
            .unwrap_err();

        match err {
            ShipoError::Config(ConfigError::MissingField(key)) => assert_eq!(key, missing),
            other => panic!("Expected missing {}, got {:?}", missing, other),
        }
        assert_eq!(transport.request_count(), 0, "no request expected for {}", missing);
    }
    Ok(())
}

#[tokio::test]
async fn test_empty_twitter_value_fails_before_any_request() -> Result<()> {
    let config: Config = bluesky_config("5")
        .into_iter()
        .chain(twitter_config())
        .chain([("twitter_access_secret".to_string(), String::new())])
        .collect();
    let transport = bluesky_transport(0);

    let err = dispatcher::run("Hello", "bt", &config, Arc::new(transport.clone()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ShipoError::Config(ConfigError::EmptyField(ref key)) if key == "twitter_access_secret"
    ));
    assert_eq!(transport.request_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_invalid_limit_fails_before_any_request() -> Result<()> {
    let config: Config = bluesky_config("-2").into_iter().collect();
    let transport = bluesky_transport(0);

    let err = dispatcher::run("Hello", "b", &config, Arc::new(transport.clone()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ShipoError::Config(ConfigError::InvalidLimit(_))
    ));
    assert_eq!(transport.request_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_bluesky_auth_failure_skips_twitter() -> Result<()> {
    let config: Config = bluesky_config("5")
        .into_iter()
        .chain(twitter_config())
        .collect();
    let transport = MockTransport::new()
        .on(
            HttpMethod::Post,
            "createSession",
            HttpResponse::new(401, r#"{"error":"AuthenticationRequired"}"#),
        )
        .on(HttpMethod::Post, "/2/tweets", HttpResponse::new(201, TWEET_OK));

    let err = dispatcher::run("Hello", "bt", &config, Arc::new(transport.clone()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ShipoError::Platform(PlatformError::Authentication(_))
    ));
    assert_eq!(transport.request_count(), 1);
    assert!(transport.requests_to("/2/tweets").is_empty());
    Ok(())
}

#[tokio::test]
async fn test_twitter_failure_after_bluesky_success() -> Result<()> {
    let config: Config = bluesky_config("5")
        .into_iter()
        .chain(twitter_config())
        .collect();
    let transport = bluesky_transport(0).on(
        HttpMethod::Post,
        "/2/tweets",
        HttpResponse::new(401, r#"{"title":"Unauthorized"}"#),
    );

    let mut reported = Vec::new();
    let err = dispatcher::run_with(
        "Hello",
        "bt",
        &config,
        Arc::new(transport.clone()),
        |result| reported.push(result.clone()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ShipoError::Platform(PlatformError::Posting(_))));
    // Bluesky already posted; nothing is rolled back and its result was reported
    assert_eq!(posted_texts(&transport), vec!["Hello #Shipo-CLI"]);
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].platform, "bluesky");
    assert_eq!(reported[0].post_id, "at://did:plc:alice/app.bsky.feed.post/3kabc");
    Ok(())
}

#[tokio::test]
async fn test_custom_bluesky_service() -> Result<()> {
    let config: Config = bluesky_config("5")
        .into_iter()
        .chain([("bluesky_service".to_string(), "pds.example.org".to_string())])
        .collect();
    let transport = bluesky_transport(0);

    dispatcher::run("Hello", "b", &config, Arc::new(transport.clone())).await?;

    assert!(transport
        .requests()
        .iter()
        .all(|r| r.url.starts_with("https://pds.example.org/xrpc/")));
    Ok(())
}

#[tokio::test]
async fn test_empty_selector_is_noop() -> Result<()> {
    let config = Config::default();
    let transport = MockTransport::new();

    let results = dispatcher::run("Hello", "", &config, Arc::new(transport.clone())).await?;

    assert!(results.is_empty());
    assert_eq!(transport.request_count(), 0);
    Ok(())
}
