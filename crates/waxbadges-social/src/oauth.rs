//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1).
//!
//! ```text
//! base string = METHOD & pct(url) & pct(sorted "k=v" pairs joined by '&')
//! signing key = pct(consumer_secret) & pct(token_secret)
//! signature   = base64(HMAC-SHA1(key, base string))
//! ```
//!
//! JSON request bodies are not part of the signature; query parameters are.

use std::fmt;

use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

use crate::{Result, SocialError};

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

/// Application and user credentials for a user-context API call.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("access_token", &self.access_token)
            .finish_non_exhaustive()
    }
}

/// RFC 3986 percent-encoding: everything but `A-Z a-z 0-9 - . _ ~`.
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Compute the `oauth_signature` value.
///
/// `params` holds every query parameter plus every `oauth_*` parameter
/// except the signature itself.
pub fn sign(
    credentials: &OAuthCredentials,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
) -> Result<String> {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(url),
        percent_encode(&param_string)
    );
    let key = format!(
        "{}&{}",
        percent_encode(&credentials.consumer_secret),
        percent_encode(&credentials.access_secret)
    );

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| SocialError::Signing(e.to_string()))?;
    mac.update(base.as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Build the `Authorization` header value with an explicit nonce and timestamp.
pub fn authorization_header_with(
    credentials: &OAuthCredentials,
    method: &str,
    url: &str,
    query: &[(&str, &str)],
    nonce: &str,
    timestamp: u64,
) -> Result<String> {
    let timestamp = timestamp.to_string();
    let oauth: [(&str, &str); 6] = [
        ("oauth_consumer_key", &credentials.consumer_key),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", SIGNATURE_METHOD),
        ("oauth_timestamp", &timestamp),
        ("oauth_token", &credentials.access_token),
        ("oauth_version", OAUTH_VERSION),
    ];

    let mut all: Vec<(&str, &str)> = query.to_vec();
    all.extend_from_slice(&oauth);
    let signature = sign(credentials, method, url, &all)?;

    let mut fields: Vec<String> = oauth
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", percent_encode(v)))
        .collect();
    fields.push(format!("oauth_signature=\"{}\"", percent_encode(&signature)));
    fields.sort();
    Ok(format!("OAuth {}", fields.join(", ")))
}

/// Build the `Authorization` header value with a fresh nonce and the current time.
pub fn authorization_header(
    credentials: &OAuthCredentials,
    method: &str,
    url: &str,
    query: &[(&str, &str)],
) -> Result<String> {
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect();
    let timestamp = u64::try_from(Utc::now().timestamp())
        .map_err(|_| SocialError::Signing("clock is before the Unix epoch".into()))?;
    authorization_header_with(credentials, method, url, query, &nonce, timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn twitter_doc_credentials() -> OAuthCredentials {
        OAuthCredentials {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog".into(),
            consumer_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".into(),
            access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".into(),
            access_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".into(),
        }
    }

    #[test]
    fn test_percent_encoding_is_rfc3986() {
        assert_eq!(percent_encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(percent_encode("An encoded string!"), "An%20encoded%20string%21");
        assert_eq!(percent_encode("safe-._~"), "safe-._~");
        assert_eq!(percent_encode("☃"), "%E2%98%83");
    }

    #[test]
    fn test_documented_signature() {
        let creds = twitter_doc_credentials();
        let params = [
            ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
            ("include_entities", "true"),
            ("oauth_consumer_key", "xvz1evFS4wEEPTGEFPHBog"),
            ("oauth_nonce", "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "1318622958"),
            ("oauth_token", "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb"),
            ("oauth_version", "1.0"),
        ];
        let sig = sign(
            &creds,
            "post",
            "https://api.twitter.com/1.1/statuses/update.json",
            &params,
        )
        .expect("sign");
        assert_eq!(sig, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_header_carries_documented_signature() {
        let creds = twitter_doc_credentials();
        let header = authorization_header_with(
            &creds,
            "POST",
            "https://api.twitter.com/1.1/statuses/update.json",
            &[
                ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
                ("include_entities", "true"),
            ],
            "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
            1318622958,
        )
        .expect("header");
        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(header.contains("oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(!header.contains("status="));
    }

    #[test]
    fn test_fresh_headers_differ() {
        let creds = twitter_doc_credentials();
        let url = "https://api.twitter.com/1.1/users/show.json";
        let a = authorization_header(&creds, "GET", url, &[("screen_name", "bob")]).expect("a");
        let b = authorization_header(&creds, "GET", url, &[("screen_name", "bob")]).expect("b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fresh_header_uses_current_unix_time() {
        let creds = twitter_doc_credentials();
        let before = Utc::now().timestamp();
        let url = "https://api.twitter.com/1.1/users/show.json";
        let header = authorization_header(&creds, "GET", url, &[]).expect("header");
        let after = Utc::now().timestamp();

        let stamp: i64 = header
            .split("oauth_timestamp=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .expect("timestamp field")
            .parse()
            .expect("integer seconds");
        assert!((before..=after).contains(&stamp));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", twitter_doc_credentials());
        assert!(!debug.contains("kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw"));
        assert!(!debug.contains("LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE"));
    }
}
