//! Constructor-time configuration of an OAuth2 client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::http_client::RedirectPolicy;
use super::types::{DEFAULT_GRANT_EXPIRES_IN, JWTAlgorithm, Result};

/// Number of redirects followed when `follow_redirects` is on.
pub const DEFAULT_REDIRECT_LIMIT: u32 = 10;

/// Client configuration.
///
/// Can be deserialized from JSON; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Client identifier.
    pub client_id: Option<String>,
    /// Optional client secret.
    pub client_secret: Option<String>,
    /// OAuth2 authorization endpoint URL.
    pub authorization_endpoint: Option<String>,
    /// OAuth2 token endpoint URL.
    pub token_endpoint: Option<String>,
    /// Token revocation endpoint URL; revocation falls back to the token endpoint.
    pub token_revocation_endpoint: Option<String>,
    /// Default redirect URI.
    pub redirect_uri: Option<String>,
    /// Key used to sign request objects (HMAC secret or RSA private key PEM).
    #[serde(skip_serializing)]
    pub signing_key: Option<String>,
    /// Algorithm used to sign request objects.
    pub algorithm: JWTAlgorithm,
    /// Validity window of an authorization code, in seconds.
    pub grant_expire_in: i64,
    /// Per-request timeout in seconds; none means no timeout.
    pub http_timeout: Option<u64>,
    /// Whether the transport should follow redirects.
    pub follow_redirects: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            client_id: None,
            client_secret: None,
            authorization_endpoint: None,
            token_endpoint: None,
            token_revocation_endpoint: None,
            redirect_uri: None,
            signing_key: None,
            algorithm: JWTAlgorithm::HS256,
            grant_expire_in: DEFAULT_GRANT_EXPIRES_IN,
            http_timeout: None,
            follow_redirects: true,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for `client_id` with every other value defaulted.
    pub fn new(client_id: impl Into<String>) -> Self {
        ClientConfig { client_id: Some(client_id.into()), ..Default::default() }
    }

    /// Loads a configuration from a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_authorization_endpoint(mut self, uri: impl Into<String>) -> Self {
        self.authorization_endpoint = Some(uri.into());
        self
    }

    pub fn with_token_endpoint(mut self, uri: impl Into<String>) -> Self {
        self.token_endpoint = Some(uri.into());
        self
    }

    pub fn with_revocation_endpoint(mut self, uri: impl Into<String>) -> Self {
        self.token_revocation_endpoint = Some(uri.into());
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    pub fn with_signing_key(mut self, key: impl Into<String>, algorithm: JWTAlgorithm) -> Self {
        self.signing_key = Some(key.into());
        self.algorithm = algorithm;
        self
    }

    pub fn with_grant_expire_in(mut self, seconds: i64) -> Self {
        self.grant_expire_in = seconds;
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout = Some(seconds);
        self
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.http_timeout.map(Duration::from_secs)
    }

    pub(crate) fn redirect_policy(&self) -> RedirectPolicy {
        if self.follow_redirects {
            RedirectPolicy::Limit(DEFAULT_REDIRECT_LIMIT)
        } else {
            RedirectPolicy::None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn json_config_fills_defaults() {
        let config = ClientConfig::from_json(
            r#"{"client_id":"cid","token_endpoint":"https://as.example/token","algorithm":"RS256"}"#,
        )
        .unwrap();
        assert_eq!(config.client_id.as_deref(), Some("cid"));
        assert_eq!(config.grant_expire_in, DEFAULT_GRANT_EXPIRES_IN);
        assert_eq!(config.algorithm, JWTAlgorithm::RS256);
        assert!(config.follow_redirects);
        assert_eq!(config.redirect_policy(), RedirectPolicy::Limit(DEFAULT_REDIRECT_LIMIT));
    }

    #[test]
    fn signing_key_is_not_serialized() {
        let config = ClientConfig::new("cid").with_signing_key("hmac-key-value", JWTAlgorithm::HS256);
        let text = serde_json::to_string(&config).unwrap();
        assert!(!text.contains("signing_key"));
        assert!(!text.contains("hmac-key-value"));
    }
}
