//! OAuth 1.0a request signing (HMAC-SHA1)
//!
//! Twitter's v2 write endpoints accept user-context requests signed with the
//! four long-lived app credentials. There is no login round-trip: every
//! request carries its own `Authorization: OAuth ...` header built here.
//!
//! JSON request bodies are not part of the signature; query parameters and
//! form parameters are.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::{distributions::Alphanumeric, Rng};
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;

use crate::config::TwitterCredentials;
use crate::error::{PlatformError, Result};
use crate::http::HttpMethod;

type HmacSha1 = Hmac<Sha1>;

/// Unreserved characters of RFC 3986 stay as-is, everything else is encoded
pub const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const NONCE_LEN: usize = 32;

fn encode(value: &str) -> String {
    utf8_percent_encode(value, RFC3986).to_string()
}

/// Signs requests with a consumer key pair and an access token pair
#[derive(Debug)]
pub struct OAuthSigner {
    consumer_key: String,
    consumer_secret: SecretString,
    token: SecretString,
    token_secret: SecretString,
}

impl OAuthSigner {
    pub fn new(credentials: TwitterCredentials) -> Self {
        Self {
            consumer_key: credentials.consumer_key,
            consumer_secret: credentials.consumer_secret,
            token: credentials.access_token,
            token_secret: credentials.access_secret,
        }
    }

    /// Build the `Authorization` header value with a fresh nonce and timestamp
    pub fn authorization_header(&self, method: HttpMethod, url: &str) -> Result<String> {
        let nonce = generate_nonce();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_header_at(method, url, &[], &nonce, &timestamp)
    }

    /// Build the `Authorization` header value for a fixed nonce and timestamp
    ///
    /// `form_params` are `application/x-www-form-urlencoded` body parameters,
    /// which OAuth includes in the signature. Pass an empty slice for JSON
    /// bodies.
    pub fn authorization_header_at(
        &self,
        method: HttpMethod,
        url: &str,
        form_params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String> {
        let mut oauth_params: Vec<(String, String)> = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            (
                "oauth_token".to_string(),
                self.token.expose_secret().to_string(),
            ),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];

        let (base_url, query_params) = split_url(url);
        let mut params = oauth_params.clone();
        params.extend(query_params);
        params.extend(
            form_params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );

        let base_string = signature_base_string(method.as_str(), base_url, &params);
        let signature = sign(
            &base_string,
            self.consumer_secret.expose_secret(),
            self.token_secret.expose_secret(),
        )?;
        oauth_params.push(("oauth_signature".to_string(), signature));

        let fields: Vec<String> = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect();
        Ok(format!("OAuth {}", fields.join(", ")))
    }
}

/// `METHOD&enc(base_url)&enc(normalized params)`
pub fn signature_base_string(method: &str, base_url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(base_url),
        encode(&normalized)
    )
}

/// HMAC-SHA1 of the base string, base64 encoded
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> Result<String> {
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| PlatformError::Authentication(format!("Failed to sign request: {}", e)))?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

/// Split a URL into its base and decoded query parameters
fn split_url(url: &str) -> (&str, Vec<(String, String)>) {
    let Some((base, query)) = url.split_once('?') else {
        return (url, Vec::new());
    };

    let params = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(k), decode(v))
        })
        .collect();
    (base, params)
}

fn decode(value: &str) -> String {
    percent_decode_str(&value.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}
