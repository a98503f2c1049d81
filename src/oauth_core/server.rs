//! Server side decoding of incoming client requests.

use tracing::debug;

use super::encoding::query_of;
use super::message::{AccessTokenRequest, AuthorizationRequest, Message, RefreshAccessTokenRequest};
use super::types::{JWTAlgorithm, OAuthError, Result};

/// Decodes and verifies requests received by an authorization server.
#[derive(Debug, Clone, Copy, Default)]
pub struct Server;

impl Server {
    pub fn new() -> Self {
        Server
    }

    /// Decodes a request from a full URL or from its query string; `url` wins.
    pub fn parse_url_request<M: Message>(&self, url: Option<&str>, query: Option<&str>, extended: bool) -> Result<M> {
        let query = match (url, query) {
            (Some(url), _) => query_of(url),
            (None, Some(query)) => query.to_string(),
            (None, None) => return Err(OAuthError::Configuration("neither url nor query given".to_string())),
        };
        let request = M::from_urlencoded(&query, extended)?;
        request.verify()?;
        debug!(message = M::NAME, "parsed url request");
        Ok(request)
    }

    pub fn parse_authorization_request(
        &self,
        url: Option<&str>,
        query: Option<&str>,
        extended: bool,
    ) -> Result<AuthorizationRequest> {
        self.parse_url_request(url, query, extended)
    }

    /// Decodes a request object; with `verify` on, the signature is checked against `key`.
    pub fn parse_jwt_request<M: Message>(
        &self,
        token: &str,
        key: &str,
        alg: JWTAlgorithm,
        verify: bool,
        extended: bool,
    ) -> Result<M> {
        let request = M::from_jwt(token, key, alg, verify, extended)?;
        request.verify()?;
        debug!(message = M::NAME, verify, "parsed jwt request");
        Ok(request)
    }

    /// Decodes a form-encoded request body.
    pub fn parse_body_request<M: Message>(&self, body: &str, extended: bool) -> Result<M> {
        let request = M::from_urlencoded(body, extended)?;
        request.verify()?;
        debug!(message = M::NAME, "parsed body request");
        Ok(request)
    }

    pub fn parse_token_request(&self, body: &str, extended: bool) -> Result<AccessTokenRequest> {
        self.parse_body_request(body, extended)
    }

    pub fn parse_refresh_token_request(&self, body: &str, extended: bool) -> Result<RefreshAccessTokenRequest> {
        self.parse_body_request(body, extended)
    }
}
