use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, instrument, warn};

use super::http_client::{HttpMethod, HttpRequest, HttpResponse, OAuthHttpClient};
use super::message::{RequestKind, ResponseFormat, ResponseKind, ResponseMessage};
use super::oauth_client::{Client, HttpArgs, RequestArgs, RequestInfo};
use super::types::{OAuthError, Result, Token, epoch_now};

/// What the caller expects in the body of a 200 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// No body; a 200 is the whole answer.
    Nothing,
    /// A message of `kind` serialized as `format`.
    Body { kind: ResponseKind, format: ResponseFormat },
}

fn transport_error(status: Option<u16>, message: impl Into<String>) -> OAuthError {
    OAuthError::Transport { status, message: message.into() }
}

impl<C: OAuthHttpClient> Client<C> {
    /// Turns a constructed request into a transport request.
    pub fn http_request(&self, info: &RequestInfo, http_args: &HttpArgs) -> HttpRequest {
        let mut headers = info.headers.clone();
        headers.extend(http_args.headers.iter().cloned());
        if let Some(password) = &http_args.password {
            let client_id = self.config.client_id.as_deref().unwrap_or_default();
            let credentials = STANDARD.encode(format!("{}:{}", client_id, password));
            headers.push(("Authorization".into(), format!("Basic {}", credentials)));
        }
        HttpRequest {
            method: info.method,
            url: info.uri.clone(),
            headers,
            body: info.body.clone().map(String::into_bytes),
            timeout: self.config.timeout(),
            redirect_policy: self.config.redirect_policy(),
        }
    }

    /// Sends `request` and parses the answer.
    ///
    /// Only 200 is accepted. A 200 must carry the content type of the
    /// expected format; `Expected::Nothing` returns `Ok(None)` without
    /// looking at the body.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url), level = "debug")]
    pub async fn request_and_return(
        &self,
        request: HttpRequest,
        expected: Expected,
        state: &str,
        extended: bool,
    ) -> Result<Option<ResponseMessage>> {
        let response = self.http.execute(request).await.map_err(|e| {
            warn!(error = %e, "transport failure");
            transport_error(None, e.to_string())
        })?;

        match response.status {
            200 => {}
            500 => {
                warn!(status = 500, "server error");
                return Err(transport_error(Some(500), format!("server error: {}", response.body_text())));
            }
            status => {
                warn!(status, "unexpected status code");
                return Err(transport_error(Some(status), format!("unexpected status code [{}]", status)));
            }
        }

        let (kind, format) = match expected {
            Expected::Nothing => return Ok(None),
            Expected::Body { kind, format } => (kind, format),
        };
        let content_type = response.header("Content-Type").unwrap_or_default();
        if !content_type.contains(format.content_type()) {
            warn!(content_type, expected = format.content_type(), "unexpected content type");
            return Err(transport_error(
                Some(200),
                format!("unexpected content type '{}', expected '{}'", content_type, format.content_type()),
            ));
        }

        self.parse_response(kind, &response.body_text(), format, state, extended).map(Some)
    }

    /// Sends an authorization request.
    ///
    /// Without a response format the call returns `Ok(None)` on 200, which
    /// is the usual case when the user agent is redirected instead. Error
    /// responses get the request's `state` copied in.
    #[instrument(skip(self, args), level = "debug")]
    pub async fn do_authorization_request(&self, args: RequestArgs) -> Result<Option<ResponseMessage>> {
        let method = args.method.unwrap_or(HttpMethod::GET);
        let info = self.request_info(RequestKind::Authorization, method, &args)?;
        let request = self.http_request(&info, &args.http_args);
        let expected = match args.response_format {
            Some(format) => Expected::Body { kind: ResponseKind::Authorization, format },
            None => Expected::Nothing,
        };

        let mut response = self.request_and_return(request, expected, args.flow_state(), false).await?;
        if let Some(resp) = response.as_mut().filter(|r| r.is_error()) {
            if let Some(state) = info.message.state() {
                resp.set_state(state);
            }
        }
        Ok(response)
    }

    /// Exchanges the authorization code of `args.state` for a token.
    #[instrument(skip(self, args), level = "debug")]
    pub async fn do_access_token_request(&self, args: RequestArgs) -> Result<ResponseMessage> {
        self.token_endpoint_call(RequestKind::AccessToken, &args).await
    }

    /// Refreshes the token of `args.state`; the new token is appended to the grant.
    #[instrument(skip(self, args), level = "debug")]
    pub async fn do_access_token_refresh(&self, args: RequestArgs) -> Result<ResponseMessage> {
        self.token_endpoint_call(RequestKind::RefreshAccessToken, &args).await
    }

    async fn token_endpoint_call(&self, kind: RequestKind, args: &RequestArgs) -> Result<ResponseMessage> {
        let method = args.method.unwrap_or(HttpMethod::POST);
        let info = self.request_info(kind, method, args)?;
        let request = self.http_request(&info, &args.http_args);
        let format = args.response_format.unwrap_or(ResponseFormat::Json);
        let expected = Expected::Body { kind: ResponseKind::AccessToken, format };

        self.request_and_return(request, expected, args.flow_state(), false)
            .await?
            .ok_or_else(|| transport_error(Some(200), "empty response"))
    }

    /// Revokes the resolved token at the revocation endpoint.
    #[instrument(skip(self, args), level = "debug")]
    pub async fn do_revoke_token(&self, args: RequestArgs) -> Result<()> {
        let method = args.method.unwrap_or(HttpMethod::POST);
        let info = self.request_info(RequestKind::TokenRevocation, method, &args)?;
        let request = self.http_request(&info, &args.http_args);
        self.request_and_return(request, Expected::Nothing, args.flow_state(), false).await?;
        debug!(state = args.flow_state(), "token revoked");
        Ok(())
    }

    /// Calls a protected resource with a bearer token from the grant of `state`.
    ///
    /// An expired token is refreshed first; without a scope, when no valid
    /// token is left, the latest token with a refresh token is used for
    /// that. When the resource answers 401
    /// and the token can be refreshed, the call is retried once with a new
    /// token. `access_token` overrides the token taken from the grant. The
    /// whole check-refresh-use sequence runs under the flow's lock.
    #[instrument(skip(self, headers, access_token), level = "debug")]
    pub async fn fetch_protected_resource(
        &self,
        uri: &str,
        method: HttpMethod,
        headers: Vec<(String, String)>,
        state: &str,
        scope: &str,
        access_token: Option<String>,
    ) -> Result<HttpResponse> {
        let lock = self.grants().flow_lock(state).ok_or(OAuthError::TokenUnavailable)?;
        let _guard = lock.lock().await;

        // without a scope only valid tokens match, so fall back to one that can be refreshed
        let now = epoch_now();
        let mut token = self
            .grants()
            .with_grant(state, |grant| {
                let found = match grant.get_token_at(scope, now) {
                    None if scope.is_empty() => grant.latest_refreshable(),
                    found => found,
                };
                found.cloned()
            })
            .flatten()
            .ok_or(OAuthError::TokenUnavailable)?;
        let mut refreshed = false;
        if !token.is_valid(now) {
            debug!(state, "token expired, refreshing");
            token = self.refresh_with(state, token.refresh_token.as_deref()).await?;
            refreshed = true;
        }

        let bearer = access_token.clone().unwrap_or_else(|| token.access_token.clone());
        let response = self.send_with_bearer(uri, method, &headers, &bearer).await?;
        if response.status != 401 || refreshed || access_token.is_some() {
            return Ok(response);
        }

        debug!(state, "resource rejected token, refreshing once");
        let token = self.refresh_with(state, token.refresh_token.as_deref()).await?;
        self.send_with_bearer(uri, method, &headers, &token.access_token).await
    }

    async fn refresh_with(&self, state: &str, refresh_token: Option<&str>) -> Result<Token> {
        let refresh_token = refresh_token.ok_or(OAuthError::TokenUnavailable)?;
        let args = RequestArgs::new().state(state).arg("refresh_token", refresh_token);
        match self.do_access_token_refresh(args).await? {
            ResponseMessage::AccessToken(resp) => Ok(Token::from_response(&resp, epoch_now())),
            other => {
                warn!(state, error = ?other.error_code(), "refresh rejected");
                Err(OAuthError::TokenUnavailable)
            }
        }
    }

    async fn send_with_bearer(
        &self,
        uri: &str,
        method: HttpMethod,
        headers: &[(String, String)],
        bearer: &str,
    ) -> Result<HttpResponse> {
        let mut headers = headers.to_vec();
        headers.push(("Authorization".into(), format!("Bearer {}", bearer)));
        let request = HttpRequest {
            method,
            url: uri.to_string(),
            headers,
            body: None,
            timeout: self.config.timeout(),
            redirect_policy: self.config.redirect_policy(),
        };
        self.http.execute(request).await.map_err(|e| {
            warn!(error = %e, "transport failure");
            transport_error(None, e.to_string())
        })
    }
}
