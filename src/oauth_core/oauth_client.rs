use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::config::ClientConfig;
use super::http_client::{HttpMethod, OAuthHttpClient};
use super::jwt;
use super::memory::SessionRegistry;
use super::message::{
    Attempt, EndpointRole, ErrorKind, FieldDefault, RequestKind, RequestMessage, ResponseFormat, ResponseKind,
    ResponseMessage, SessionField,
};
use super::types::{Grant, OAuthError, Result, Token, epoch_now};

/// Content type of form-encoded request bodies.
pub const DEFAULT_POST_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Returns a fresh random value suitable for the `state` parameter.
pub fn generate_state() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Transport level options for one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpArgs {
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// Client password; adds HTTP Basic authentication with the client id.
    pub password: Option<String>,
}

impl HttpArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// Per-call arguments of a request.
#[derive(Debug, Clone, Default)]
pub struct RequestArgs {
    /// Message parameters. Keys outside the schema are ignored unless prefixed
    /// `extra_`, in which case the prefix is stripped and they become
    /// extension parameters.
    pub request_args: Map<String, Value>,
    /// Parameters merged last, bypassing the schema. Supplying them switches
    /// the request to extended encoding.
    pub extra_args: Option<Map<String, Value>>,
    /// Endpoint to use instead of the configured one.
    pub endpoint: Option<String>,
    /// Flow identifier the request belongs to.
    pub state: Option<String>,
    /// Scope used to select a token.
    pub scope: Option<String>,
    /// Token to use instead of selecting one from a grant.
    pub token: Option<Token>,
    /// HTTP method; each flow has its own default.
    pub method: Option<HttpMethod>,
    /// Expected response format. Token flows default to JSON; the
    /// authorization flow expects no body unless one is given.
    pub response_format: Option<ResponseFormat>,
    /// Transport options.
    pub http_args: HttpArgs,
}

impl RequestArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request_args.insert(key.into(), value.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_args.get_or_insert_with(Map::new).insert(key.into(), value.into());
        self
    }

    pub fn endpoint(mut self, uri: impl Into<String>) -> Self {
        self.endpoint = Some(uri.into());
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn http_args(mut self, http_args: HttpArgs) -> Self {
        self.http_args = http_args;
        self
    }

    /// Flow identifier, empty when none was given.
    pub fn flow_state(&self) -> &str {
        self.state.as_deref().unwrap_or_default()
    }
}

/// A request ready to be handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestInfo {
    pub method: HttpMethod,
    pub uri: String,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
    pub message: RequestMessage,
}

/// Session values that change at runtime.
#[derive(Debug, Clone, Default)]
struct Session {
    state: Option<String>,
    redirect_uri: Option<String>,
    authorization_endpoint: Option<String>,
    token_endpoint: Option<String>,
    token_revocation_endpoint: Option<String>,
}

impl Session {
    fn from_config(config: &ClientConfig) -> Self {
        Session {
            state: None,
            redirect_uri: config.redirect_uri.clone(),
            authorization_endpoint: config.authorization_endpoint.clone(),
            token_endpoint: config.token_endpoint.clone(),
            token_revocation_endpoint: config.token_revocation_endpoint.clone(),
        }
    }
}

/// OAuth2 client: session defaults, the grant registry, request construction
/// and response parsing. The HTTP flows live in `grant_helpers`.
pub struct Client<C: OAuthHttpClient> {
    pub(crate) http: C,
    pub(crate) config: ClientConfig,
    session: RwLock<Session>,
    grants: SessionRegistry,
    response_errors: HashMap<ResponseKind, Vec<ErrorKind>>,
}

impl<C: OAuthHttpClient> Client<C> {
    /// Creates a client with an empty grant registry.
    pub fn new(config: ClientConfig, http: C) -> Self {
        let response_errors = [ResponseKind::Authorization, ResponseKind::AccessToken]
            .into_iter()
            .map(|kind| (kind, kind.default_error_candidates()))
            .collect();
        Client {
            http,
            session: RwLock::new(Session::from_config(&config)),
            config,
            grants: SessionRegistry::new(),
            response_errors,
        }
    }

    /// Replaces the error schemas tried for `kind`.
    pub fn with_response_errors(mut self, kind: ResponseKind, candidates: Vec<ErrorKind>) -> Self {
        self.response_errors.insert(kind, candidates);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn http_client(&self) -> &C {
        &self.http
    }

    /// The grant registry of this client.
    pub fn grants(&self) -> &SessionRegistry {
        &self.grants
    }

    /// Snapshot of the grant registered for `state`.
    pub fn grant_from_state(&self, state: &str) -> Option<Grant> {
        self.grants.get(state)
    }

    fn session(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn session_mut(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Default `state` put into authorization requests.
    pub fn state(&self) -> Option<String> {
        self.session().state.clone()
    }

    pub fn set_state(&self, state: Option<String>) {
        self.session_mut().state = state;
    }

    /// Current default redirect URI.
    pub fn redirect_uri(&self) -> Option<String> {
        self.session().redirect_uri.clone()
    }

    pub fn set_redirect_uri(&self, uri: Option<String>) {
        self.session_mut().redirect_uri = uri;
    }

    pub fn set_endpoint(&self, role: EndpointRole, uri: Option<String>) {
        let mut session = self.session_mut();
        match role {
            EndpointRole::Authorization => session.authorization_endpoint = uri,
            EndpointRole::Token => session.token_endpoint = uri,
            EndpointRole::Revocation => session.token_revocation_endpoint = uri,
        }
    }

    /// Forgets the session: state, grants, endpoints and redirect URI.
    pub fn reset(&self) {
        *self.session_mut() = Session::default();
        self.grants.clear();
        debug!("client session reset");
    }

    /// Value a schema field falls back to when the caller omits it.
    pub fn session_value(&self, field: SessionField) -> Option<String> {
        match field {
            SessionField::ClientId => self.config.client_id.clone(),
            SessionField::ClientSecret => self.config.client_secret.clone(),
            SessionField::RedirectUri => self.session().redirect_uri.clone(),
            SessionField::State => self.session().state.clone(),
        }
    }

    /// Resolves the endpoint for `role`: the explicit URI, else the configured one.
    pub fn endpoint(&self, role: EndpointRole, explicit: Option<&str>) -> Result<String> {
        if let Some(uri) = explicit.filter(|u| !u.is_empty()) {
            return Ok(uri.to_string());
        }
        let session = self.session();
        let configured = match role {
            EndpointRole::Authorization => session.authorization_endpoint.as_ref(),
            EndpointRole::Token => session.token_endpoint.as_ref(),
            EndpointRole::Revocation => {
                session.token_revocation_endpoint.as_ref().or(session.token_endpoint.as_ref())
            }
        };
        configured
            .filter(|u| !u.is_empty())
            .cloned()
            .ok_or_else(|| OAuthError::Configuration(format!("no '{}' specified", role)))
    }

    /// Token resolution for refresh and revocation.
    ///
    /// A literal token wins; otherwise the grant of the flow is asked for a
    /// token matching the scope (or any valid token without a scope). A
    /// missing flow identifier means the `""` flow. The result must be valid
    /// at `now`. An unknown flow yields `None`.
    pub fn resolve_token(&self, args: &RequestArgs, now: i64) -> Option<Token> {
        let token = match &args.token {
            Some(token) => Some(token.clone()),
            None => {
                let scope = args.scope.as_deref().unwrap_or_default();
                self.grants
                    .with_grant(args.flow_state(), |grant| grant.get_token_at(scope, now).cloned())
                    .flatten()
            }
        };
        token.filter(|t| t.is_valid(now))
    }

    /// Merges session defaults, `request_args` and `extra_args` into a message of `kind`.
    pub fn construct_request(&self, kind: RequestKind, args: &RequestArgs) -> Result<RequestMessage> {
        self.build_request(kind, &args.request_args, args.extra_args.as_ref())
    }

    fn build_request(
        &self,
        kind: RequestKind,
        request_args: &Map<String, Value>,
        extra_args: Option<&Map<String, Value>>,
    ) -> Result<RequestMessage> {
        let fields = kind.fields();
        let known = |name: &str| fields.iter().any(|f| f.name == name);
        let absent = |args: &Map<String, Value>, name: &str| args.get(name).is_none_or(Value::is_null);

        let mut args = Map::new();
        for (key, value) in request_args {
            if known(key) {
                args.insert(key.clone(), value.clone());
            } else if let Some(name) = key.strip_prefix("extra_") {
                if !known(name) {
                    args.insert(name.to_string(), value.clone());
                }
            }
        }
        for field in fields {
            if let FieldDefault::Session(source) = field.default {
                if absent(&args, field.name) {
                    if let Some(value) = self.session_value(source) {
                        args.insert(field.name.to_string(), Value::String(value));
                    }
                }
            }
        }
        if let Some(extra) = extra_args {
            for (key, value) in extra {
                args.insert(key.clone(), value.clone());
            }
        }
        for field in fields {
            if let FieldDefault::Literal(value) = field.default {
                if absent(&args, field.name) {
                    args.insert(field.name.to_string(), Value::String(value.to_string()));
                }
            }
        }

        let message = kind.build(args)?;
        message.verify().map_err(|e| OAuthError::Configuration(e.to_string()))?;
        Ok(message)
    }

    /// Authorization request; a `redirect_uri` argument becomes the new session default.
    pub fn construct_authorization_request(&self, args: &RequestArgs) -> Result<RequestMessage> {
        if let Some(Value::String(uri)) = args.request_args.get("redirect_uri") {
            self.session_mut().redirect_uri = Some(uri.clone());
        }
        self.construct_request(RequestKind::Authorization, args)
    }

    /// Code exchange for the grant of `args.state`.
    pub fn construct_access_token_request(&self, args: &RequestArgs) -> Result<RequestMessage> {
        let state = args.flow_state();
        let now = epoch_now();
        let (code, valid, expired_at) = self
            .grants
            .with_grant(state, |grant| {
                (grant.code().map(str::to_owned), grant.is_valid(now), grant.grant_expiration_time())
            })
            .ok_or_else(|| OAuthError::GrantMissing(state.to_string()))?;
        if !valid {
            return Err(OAuthError::GrantExpired { now, expired_at });
        }

        let mut request_args = args.request_args.clone();
        if let Some(code) = code {
            request_args.insert("code".to_string(), Value::String(code));
        }
        request_args
            .entry("grant_type")
            .or_insert_with(|| Value::String("authorization_code".to_string()));
        self.build_request(RequestKind::AccessToken, &request_args, args.extra_args.as_ref())
    }

    /// Refresh request.
    ///
    /// An explicit `refresh_token` argument is used as is; otherwise a token
    /// is resolved and its refresh token and scope are carried over.
    pub fn construct_refresh_access_token_request(&self, args: &RequestArgs) -> Result<RequestMessage> {
        let mut request_args = args.request_args.clone();
        let explicit = request_args
            .get("refresh_token")
            .and_then(Value::as_str)
            .is_some_and(|t| !t.is_empty());
        if !explicit {
            let token = self.resolve_token(args, epoch_now()).ok_or(OAuthError::TokenUnavailable)?;
            let refresh_token = token.refresh_token.clone().ok_or(OAuthError::TokenUnavailable)?;
            request_args.insert("refresh_token".to_string(), Value::String(refresh_token));
            if !token.scope.is_empty() {
                request_args.insert("scope".to_string(), Value::from(token.scope.clone()));
            }
        }
        self.build_request(RequestKind::RefreshAccessToken, &request_args, args.extra_args.as_ref())
    }

    /// Revocation of the resolved token's access token.
    pub fn construct_token_revocation_request(&self, args: &RequestArgs) -> Result<RequestMessage> {
        let token = self.resolve_token(args, epoch_now()).ok_or(OAuthError::TokenUnavailable)?;
        let mut request_args = args.request_args.clone();
        request_args.insert("token".to_string(), Value::String(token.access_token));
        self.build_request(RequestKind::TokenRevocation, &request_args, args.extra_args.as_ref())
    }

    /// Runs the pre-step of `kind` and constructs the message.
    pub fn construct(&self, kind: RequestKind, args: &RequestArgs) -> Result<RequestMessage> {
        match kind {
            RequestKind::Authorization => self.construct_authorization_request(args),
            RequestKind::AccessToken => self.construct_access_token_request(args),
            RequestKind::RefreshAccessToken => self.construct_refresh_access_token_request(args),
            RequestKind::TokenRevocation => self.construct_token_revocation_request(args),
        }
    }

    /// Constructs a request and serializes it for `method`.
    ///
    /// POST puts the form in the body; any other method appends it to the
    /// endpoint as a query string.
    pub fn request_info(&self, kind: RequestKind, method: HttpMethod, args: &RequestArgs) -> Result<RequestInfo> {
        let message = self.construct(kind, args)?;
        let uri = self.endpoint(kind.endpoint_role(), args.endpoint.as_deref())?;
        let extended = args.extra_args.is_some();
        let encoded = message.to_urlencoded(extended);

        let info = match method {
            HttpMethod::POST => RequestInfo {
                method,
                uri,
                body: Some(encoded),
                headers: vec![("Content-Type".to_string(), DEFAULT_POST_CONTENT_TYPE.to_string())],
                message,
            },
            _ => RequestInfo {
                method,
                uri: super::encoding::append_query(&uri, &encoded),
                body: None,
                headers: Vec::new(),
                message,
            },
        };
        debug!(kind = ?kind, method = %info.method, uri = %info.uri, extended, "constructed request");
        Ok(info)
    }

    /// Constructs a request and signs it as a JWT request object.
    pub fn request_object(&self, kind: RequestKind, args: &RequestArgs) -> Result<String> {
        let key = self
            .config
            .signing_key
            .as_deref()
            .ok_or_else(|| OAuthError::Configuration("no signing key configured".to_string()))?;
        let message = self.construct(kind, args)?;
        jwt::encode_claims(&message.to_map(true), key, self.config.algorithm)
    }

    /// Error schemas tried for `kind`, in order.
    pub fn error_candidates(&self, kind: ResponseKind) -> &[ErrorKind] {
        self.response_errors.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Parses a response body and correlates it with the grant registry.
    ///
    /// The body is tried against the success schema of `kind`, then against
    /// each error schema in order. When nothing matches, the error reported
    /// is the success schema's verification error if that decode recognized
    /// at least one field, else the last error schema's failure.
    ///
    /// A success variant updates (or creates) the grant of the `state` it
    /// carries, falling back to `state` given here. Error variants are
    /// returned without touching any grant.
    #[instrument(skip(self, body), level = "debug")]
    pub fn parse_response(
        &self,
        kind: ResponseKind,
        body: &str,
        format: ResponseFormat,
        state: &str,
        extended: bool,
    ) -> Result<ResponseMessage> {
        let response = self.decode_response(kind, body, format, extended)?;
        if !response.is_error() {
            let key = response.state().unwrap_or(state).to_string();
            let created = self.grants.correlate(&key, &response, self.config.grant_expire_in, epoch_now());
            debug!(state = %key, created, "correlated response with grant");
        }
        Ok(response)
    }

    fn decode_response(
        &self,
        kind: ResponseKind,
        body: &str,
        format: ResponseFormat,
        extended: bool,
    ) -> Result<ResponseMessage> {
        let (populated, success_failure) = match kind.attempt(body, format, extended) {
            Attempt::Verified(message) => return Ok(message),
            Attempt::Rejected { populated, reason } => (populated, reason),
            Attempt::Undecodable(reason) => (0, reason),
        };

        let mut last_failure = None;
        for candidate in self.error_candidates(kind) {
            match candidate.attempt(body, format, extended) {
                Attempt::Verified(message) => return Ok(message),
                Attempt::Rejected { reason, .. } | Attempt::Undecodable(reason) => last_failure = Some(reason),
            }
        }

        let reason = match last_failure {
            Some(reason) if populated == 0 => reason,
            _ => success_failure,
        };
        warn!(kind = ?kind, %format, %reason, "response matched no schema");
        Err(OAuthError::Parse(reason))
    }
}

impl<C: OAuthHttpClient> std::fmt::Debug for Client<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("client_id", &self.config.client_id)
            .field("grants", &self.grants)
            .finish()
    }
}
