//! OAuth2 core primitives: Token, Grant and errors.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::message::{AccessTokenResponse, AuthorizationResponse, ResponseMessage};

/// Default validity window of an authorization code, in seconds.
pub const DEFAULT_GRANT_EXPIRES_IN: i64 = 600;

/// Current time as epoch seconds.
pub fn epoch_now() -> i64 {
    Utc::now().timestamp()
}

/// Core OAuth2 client error kinds.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// A required endpoint or field is neither configured nor supplied.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// No grant is registered for the flow identifier.
    #[error("missing grant for state '{0}'")]
    GrantMissing(String),
    /// The authorization code of the grant is too old to be exchanged.
    #[error("authorization code too old: {now} > {expired_at}")]
    GrantExpired { now: i64, expired_at: i64 },
    /// No valid token could be resolved.
    #[error("no valid token available")]
    TokenUnavailable,
    /// The body matched neither the success schema nor any error schema.
    #[error("parse error: {0}")]
    Parse(String),
    /// Transport failure, non-success status or unexpected content type.
    #[error("transport error: {message}")]
    Transport { status: Option<u16>, message: String },
    /// An incoming message failed its self-verification.
    #[error("verification failed: {0}")]
    Verify(#[from] VerifyError),
    /// Encoding or decoding failure outside response parsing.
    #[error("codec error: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for OAuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Codec(error.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for OAuthError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        Self::Codec(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OAuthError>;

/// Self-verification failure of a protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("missing required field '{field}' in {message}")]
    MissingField { message: &'static str, field: &'static str },
    #[error("unknown error code '{code}' in {message}")]
    UnknownErrorCode { message: &'static str, code: String },
}

/// Signing algorithms for JWT request objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JWTAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
    RS256,
}

impl From<JWTAlgorithm> for jsonwebtoken::Algorithm {
    fn from(alg: JWTAlgorithm) -> Self {
        match alg {
            JWTAlgorithm::HS256 => jsonwebtoken::Algorithm::HS256,
            JWTAlgorithm::HS384 => jsonwebtoken::Algorithm::HS384,
            JWTAlgorithm::HS512 => jsonwebtoken::Algorithm::HS512,
            JWTAlgorithm::RS256 => jsonwebtoken::Algorithm::RS256,
        }
    }
}

/// One issued access credential.
///
/// Built once from an accepted access token response and never modified;
/// a refresh appends a new `Token` to the owning [`Grant`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Access token string.
    pub access_token: String,
    /// Optional refresh token.
    pub refresh_token: Option<String>,
    /// Granted scopes; empty when the server sent none.
    pub scope: Vec<String>,
    /// Token type, usually `Bearer`.
    pub token_type: String,
    /// Lifetime in seconds as sent by the server.
    pub expires_in: Option<u64>,
    /// Absolute expiry in epoch seconds; 0 means the token never expires.
    pub token_expiration_time: i64,
    /// Non-standard parameters of the issuing response.
    pub extension: Map<String, Value>,
}

impl Token {
    /// Builds a token from an access token response received at `now`.
    pub fn from_response(resp: &AccessTokenResponse, now: i64) -> Self {
        let expires_in = resp.expires_in.filter(|secs| *secs > 0);
        let token_expiration_time = match expires_in {
            Some(secs) => now.saturating_add(i64::try_from(secs).unwrap_or(i64::MAX)),
            None => 0,
        };
        Token {
            access_token: resp.access_token.clone(),
            refresh_token: resp.refresh_token.clone().filter(|t| !t.is_empty()),
            scope: resp.scope.clone(),
            token_type: resp.token_type.clone(),
            expires_in,
            token_expiration_time,
            extension: resp.extension.clone(),
        }
    }

    /// True when the token never expires or `now` has not passed its expiry.
    pub fn is_valid(&self, now: i64) -> bool {
        self.token_expiration_time == 0 || now <= self.token_expiration_time
    }

    /// True when `scope` is one of the granted scopes.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.iter().any(|s| s == scope)
    }
}

/// The lifecycle of one authorization code plus every token issued under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    code: Option<String>,
    grant_expiration_time: i64,
    exp_in: i64,
    tokens: Vec<Token>,
}

impl Default for Grant {
    fn default() -> Self {
        Grant::new(DEFAULT_GRANT_EXPIRES_IN)
    }
}

impl Grant {
    /// Creates an empty grant whose codes stay valid for `exp_in` seconds.
    pub fn new(exp_in: i64) -> Self {
        Grant { code: None, grant_expiration_time: 0, exp_in, tokens: Vec::new() }
    }

    pub fn from_authorization_response(resp: &AuthorizationResponse, exp_in: i64, now: i64) -> Self {
        let mut grant = Grant::new(exp_in);
        grant.add_code(resp, now);
        grant
    }

    pub fn from_token_response(resp: &AccessTokenResponse, exp_in: i64, now: i64) -> Self {
        let mut grant = Grant::new(exp_in);
        grant.add_token(resp, now);
        grant
    }

    /// Creates a grant from whichever grant-bearing variant `resp` is.
    pub fn from_response(resp: &ResponseMessage, exp_in: i64, now: i64) -> Self {
        let mut grant = Grant::new(exp_in);
        grant.update(resp, now);
        grant
    }

    /// Stores a (new) code and restarts its validity window.
    pub fn add_code(&mut self, resp: &AuthorizationResponse, now: i64) {
        self.code = Some(resp.code.clone());
        self.grant_expiration_time = now.saturating_add(self.exp_in);
    }

    /// Appends a token built from `resp`.
    pub fn add_token(&mut self, resp: &AccessTokenResponse, now: i64) {
        self.tokens.push(Token::from_response(resp, now));
    }

    /// Applies a response to the grant. Non grant-bearing variants are ignored.
    pub fn update(&mut self, resp: &ResponseMessage, now: i64) {
        match resp {
            ResponseMessage::Authorization(r) => self.add_code(r, now),
            ResponseMessage::AccessToken(r) => self.add_token(r, now),
            ResponseMessage::AuthorizationError(_) | ResponseMessage::TokenError(_) => {}
        }
    }

    /// Code validity; says nothing about the tokens.
    pub fn is_valid(&self, now: i64) -> bool {
        now <= self.grant_expiration_time
    }

    /// Selects a token.
    ///
    /// With a non-empty `scope` this is the earliest token granted that scope,
    /// whether or not it is still valid. With an empty `scope` it is the
    /// earliest token that is valid right now.
    pub fn get_token(&self, scope: &str) -> Option<&Token> {
        self.get_token_at(scope, epoch_now())
    }

    /// Like [`Grant::get_token`] with an explicit clock for the validity branch.
    pub fn get_token_at(&self, scope: &str, now: i64) -> Option<&Token> {
        if scope.is_empty() {
            self.tokens.iter().find(|t| t.is_valid(now))
        } else {
            self.tokens.iter().find(|t| t.has_scope(scope))
        }
    }

    /// The most recently issued token that carries a refresh token.
    pub fn latest_refreshable(&self) -> Option<&Token> {
        self.tokens.iter().rev().find(|t| t.refresh_token.is_some())
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn grant_expiration_time(&self) -> i64 {
        self.grant_expiration_time
    }

    pub fn exp_in(&self) -> i64 {
        self.exp_in
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}
