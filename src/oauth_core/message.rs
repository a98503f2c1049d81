//! OAuth2 protocol messages: requests, responses and error responses.
//!
//! Every message is a plain serde struct whose unknown parameters are kept in
//! an `extension` map. A message describes its own schema through a static
//! field table, which the request builder uses to resolve defaults and the
//! codec uses to decide which parameters are standard and which are
//! extensions.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::encoding::{decode_form, encode_form, form_value, lenient_u64, query_of, space_delimited};
use super::jwt;
use super::types::{JWTAlgorithm, OAuthError, Result, VerifyError};

/// Session attribute a schema field falls back to when the caller omits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionField {
    ClientId,
    ClientSecret,
    RedirectUri,
    State,
}

/// How a field that the caller did not supply gets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// No default; the field stays absent.
    Absent,
    /// Hardcoded protocol value, applied last.
    Literal(&'static str),
    /// Filled from the client session.
    Session(SessionField),
}

/// One entry of a message schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub required: bool,
    pub default: FieldDefault,
}

impl Field {
    const fn required(name: &'static str) -> Self {
        Field { name, required: true, default: FieldDefault::Absent }
    }

    const fn optional(name: &'static str) -> Self {
        Field { name, required: false, default: FieldDefault::Absent }
    }

    const fn literal(self, value: &'static str) -> Self {
        Field { default: FieldDefault::Literal(value), ..self }
    }

    const fn session(self, source: SessionField) -> Self {
        Field { default: FieldDefault::Session(source), ..self }
    }
}

/// Serialization of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseFormat {
    Json,
    UrlEncoded,
}

impl ResponseFormat {
    /// Content type a 200 response must carry for this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json",
            ResponseFormat::UrlEncoded => "application/x-www-form-urlencoded",
        }
    }

    /// Decodes `body` as message `M`. Urlencoded input may be a full URL.
    pub fn decode<M: Message>(&self, body: &str, extended: bool) -> Result<M> {
        match self {
            ResponseFormat::Json => M::from_json(body, extended),
            ResponseFormat::UrlEncoded => M::from_urlencoded(&query_of(body), extended),
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseFormat::Json => write!(f, "json"),
            ResponseFormat::UrlEncoded => write!(f, "urlencoded"),
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(ResponseFormat::Json),
            "urlencoded" => Ok(ResponseFormat::UrlEncoded),
            other => Err(OAuthError::Configuration(format!("unknown package format: '{}'", other))),
        }
    }
}

/// Common behaviour of every protocol message.
pub trait Message: Serialize + DeserializeOwned + Sized {
    /// Message name used in diagnostics.
    const NAME: &'static str;

    /// The schema of this message.
    fn fields() -> &'static [Field];

    /// Parameters outside the schema.
    fn extension(&self) -> &Map<String, Value>;

    fn extension_mut(&mut self) -> &mut Map<String, Value>;

    /// Returns true when `name` is a schema field of this message.
    fn has_field(name: &str) -> bool {
        Self::fields().iter().any(|f| f.name == name)
    }

    /// Checks that every required field carries a value.
    fn verify(&self) -> std::result::Result<(), VerifyError> {
        verify_required::<Self>(&self.to_map(false))
    }

    /// Field map of the message; extension parameters only when `extended`.
    fn to_map(&self, extended: bool) -> Map<String, Value> {
        let mut map = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        if !extended {
            map.retain(|key, _| Self::has_field(key));
        }
        map
    }

    /// Number of schema fields that carry a value.
    fn populated_fields(&self) -> usize {
        self.to_map(false).values().filter(|v| form_value(v).is_some()).count()
    }

    /// Builds a message from a field map. Unknown keys are dropped unless `extended`.
    fn from_map(map: Map<String, Value>, extended: bool) -> Result<Self> {
        let mut message: Self = serde_json::from_value(Value::Object(map))
            .map_err(|e| OAuthError::Codec(format!("{}: {}", Self::NAME, e)))?;
        if !extended {
            message.extension_mut().clear();
        }
        Ok(message)
    }

    fn from_json(text: &str, extended: bool) -> Result<Self> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Self::from_map(map, extended),
            _ => Err(OAuthError::Codec(format!("{}: expected a JSON object", Self::NAME))),
        }
    }

    fn from_urlencoded(text: &str, extended: bool) -> Result<Self> {
        Self::from_map(decode_form(text), extended)
    }

    fn to_urlencoded(&self, extended: bool) -> String {
        encode_form(&self.to_map(extended))
    }

    fn to_json(&self, extended: bool) -> String {
        Value::Object(self.to_map(extended)).to_string()
    }

    /// Signs the message, extensions included, as a compact JWS.
    fn to_jwt(&self, key: &str, alg: JWTAlgorithm) -> Result<String> {
        jwt::encode_message(self, key, alg)
    }

    fn from_jwt(text: &str, key: &str, alg: JWTAlgorithm, verify: bool, extended: bool) -> Result<Self> {
        jwt::decode_message(text, key, alg, verify, extended)
    }
}

fn verify_required<M: Message>(map: &Map<String, Value>) -> std::result::Result<(), VerifyError> {
    for field in M::fields().iter().filter(|f| f.required) {
        if map.get(field.name).and_then(form_value).is_none() {
            return Err(VerifyError::MissingField { message: M::NAME, field: field.name });
        }
    }
    Ok(())
}

fn verify_error_code<M: Message>(code: &str, allowed: &[&str]) -> std::result::Result<(), VerifyError> {
    if allowed.contains(&code) {
        Ok(())
    } else {
        Err(VerifyError::UnknownErrorCode { message: M::NAME, code: code.to_string() })
    }
}

// Requests

const AUTHORIZATION_REQUEST_FIELDS: &[Field] = &[
    Field::required("response_type").literal("code"),
    Field::required("client_id").session(SessionField::ClientId),
    Field::optional("redirect_uri").session(SessionField::RedirectUri),
    Field::optional("scope"),
    Field::optional("state").session(SessionField::State),
];

/// Authorization request (RFC 6749 §4.1.1).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    #[serde(default, with = "space_delimited", skip_serializing_if = "Vec::is_empty")]
    pub response_type: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(default, with = "space_delimited", skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extension: Map<String, Value>,
}

const ACCESS_TOKEN_REQUEST_FIELDS: &[Field] = &[
    Field::required("grant_type").literal("authorization_code"),
    Field::required("code"),
    Field::optional("redirect_uri").session(SessionField::RedirectUri),
    Field::optional("client_id").session(SessionField::ClientId),
    Field::optional("client_secret").session(SessionField::ClientSecret),
];

/// Access token request for the authorization code grant (RFC 6749 §4.1.3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub grant_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(flatten)]
    pub extension: Map<String, Value>,
}

const REFRESH_ACCESS_TOKEN_REQUEST_FIELDS: &[Field] = &[
    Field::required("grant_type").literal("refresh_token"),
    Field::required("refresh_token"),
    Field::optional("scope"),
    Field::optional("client_id").session(SessionField::ClientId),
    Field::optional("client_secret").session(SessionField::ClientSecret),
];

/// Refresh request (RFC 6749 §6).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshAccessTokenRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub grant_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    #[serde(default, with = "space_delimited", skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(flatten)]
    pub extension: Map<String, Value>,
}

const TOKEN_REVOCATION_REQUEST_FIELDS: &[Field] = &[
    Field::required("token"),
    Field::optional("token_type_hint"),
];

/// Token revocation request (RFC 7009).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenRevocationRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type_hint: Option<String>,
    #[serde(flatten)]
    pub extension: Map<String, Value>,
}

// Responses

const AUTHORIZATION_RESPONSE_FIELDS: &[Field] = &[
    Field::required("code"),
    Field::optional("state"),
];

/// Successful authorization response (RFC 6749 §4.1.2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extension: Map<String, Value>,
}

const ACCESS_TOKEN_RESPONSE_FIELDS: &[Field] = &[
    Field::required("access_token"),
    Field::required("token_type"),
    Field::optional("expires_in"),
    Field::optional("refresh_token"),
    Field::optional("scope"),
    Field::optional("state"),
];

/// Successful access token response (RFC 6749 §5.1).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    #[serde(default, deserialize_with = "lenient_u64::deserialize", skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, with = "space_delimited", skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extension: Map<String, Value>,
}

const AUTHORIZATION_ERROR_CODES: &[&str] = &[
    "invalid_request",
    "unauthorized_client",
    "access_denied",
    "unsupported_response_type",
    "invalid_scope",
    "server_error",
    "temporarily_unavailable",
];

const AUTHORIZATION_ERROR_RESPONSE_FIELDS: &[Field] = &[
    Field::required("error"),
    Field::optional("error_description"),
    Field::optional("error_uri"),
    Field::optional("state"),
];

/// Error returned from the authorization endpoint (RFC 6749 §4.1.2.1).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationErrorResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extension: Map<String, Value>,
}

const TOKEN_ERROR_CODES: &[&str] = &[
    "invalid_request",
    "invalid_client",
    "invalid_grant",
    "unauthorized_client",
    "unsupported_grant_type",
    "invalid_scope",
];

const TOKEN_ERROR_RESPONSE_FIELDS: &[Field] = &[
    Field::required("error"),
    Field::optional("error_description"),
    Field::optional("error_uri"),
];

/// Error returned from the token endpoint (RFC 6749 §5.2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenErrorResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
    #[serde(flatten)]
    pub extension: Map<String, Value>,
}

macro_rules! impl_message {
    ($ty:ty, $name:literal, $fields:expr) => {
        impl Message for $ty {
            const NAME: &'static str = $name;

            fn fields() -> &'static [Field] {
                $fields
            }

            fn extension(&self) -> &Map<String, Value> {
                &self.extension
            }

            fn extension_mut(&mut self) -> &mut Map<String, Value> {
                &mut self.extension
            }
        }
    };
    ($ty:ty, $name:literal, $fields:expr, error_codes = $codes:expr) => {
        impl Message for $ty {
            const NAME: &'static str = $name;

            fn fields() -> &'static [Field] {
                $fields
            }

            fn extension(&self) -> &Map<String, Value> {
                &self.extension
            }

            fn extension_mut(&mut self) -> &mut Map<String, Value> {
                &mut self.extension
            }

            fn verify(&self) -> std::result::Result<(), VerifyError> {
                verify_required::<Self>(&self.to_map(false))?;
                verify_error_code::<Self>(&self.error, $codes)
            }
        }
    };
}

impl_message!(AuthorizationRequest, "AuthorizationRequest", AUTHORIZATION_REQUEST_FIELDS);
impl_message!(AccessTokenRequest, "AccessTokenRequest", ACCESS_TOKEN_REQUEST_FIELDS);
impl_message!(RefreshAccessTokenRequest, "RefreshAccessTokenRequest", REFRESH_ACCESS_TOKEN_REQUEST_FIELDS);
impl_message!(TokenRevocationRequest, "TokenRevocationRequest", TOKEN_REVOCATION_REQUEST_FIELDS);
impl_message!(AuthorizationResponse, "AuthorizationResponse", AUTHORIZATION_RESPONSE_FIELDS);
impl_message!(AccessTokenResponse, "AccessTokenResponse", ACCESS_TOKEN_RESPONSE_FIELDS);
impl_message!(
    AuthorizationErrorResponse,
    "AuthorizationErrorResponse",
    AUTHORIZATION_ERROR_RESPONSE_FIELDS,
    error_codes = AUTHORIZATION_ERROR_CODES
);
impl_message!(
    TokenErrorResponse,
    "TokenErrorResponse",
    TOKEN_ERROR_RESPONSE_FIELDS,
    error_codes = TOKEN_ERROR_CODES
);

/// Role of the endpoint a request is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointRole {
    Authorization,
    Token,
    Revocation,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRole::Authorization => write!(f, "authorization_endpoint"),
            EndpointRole::Token => write!(f, "token_endpoint"),
            EndpointRole::Revocation => write!(f, "token_revocation_endpoint"),
        }
    }
}

/// The request messages the client knows how to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Authorization,
    AccessToken,
    RefreshAccessToken,
    TokenRevocation,
}

impl RequestKind {
    pub fn fields(&self) -> &'static [Field] {
        match self {
            RequestKind::Authorization => AuthorizationRequest::fields(),
            RequestKind::AccessToken => AccessTokenRequest::fields(),
            RequestKind::RefreshAccessToken => RefreshAccessTokenRequest::fields(),
            RequestKind::TokenRevocation => TokenRevocationRequest::fields(),
        }
    }

    pub fn endpoint_role(&self) -> EndpointRole {
        match self {
            RequestKind::Authorization => EndpointRole::Authorization,
            RequestKind::AccessToken | RequestKind::RefreshAccessToken => EndpointRole::Token,
            RequestKind::TokenRevocation => EndpointRole::Revocation,
        }
    }

    /// Builds the request message from a fully merged argument map.
    pub fn build(&self, args: Map<String, Value>) -> Result<RequestMessage> {
        Ok(match self {
            RequestKind::Authorization => RequestMessage::Authorization(AuthorizationRequest::from_map(args, true)?),
            RequestKind::AccessToken => RequestMessage::AccessToken(AccessTokenRequest::from_map(args, true)?),
            RequestKind::RefreshAccessToken => {
                RequestMessage::RefreshAccessToken(RefreshAccessTokenRequest::from_map(args, true)?)
            }
            RequestKind::TokenRevocation => RequestMessage::TokenRevocation(TokenRevocationRequest::from_map(args, true)?),
        })
    }
}

/// A constructed outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestMessage {
    Authorization(AuthorizationRequest),
    AccessToken(AccessTokenRequest),
    RefreshAccessToken(RefreshAccessTokenRequest),
    TokenRevocation(TokenRevocationRequest),
}

impl RequestMessage {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestMessage::Authorization(_) => RequestKind::Authorization,
            RequestMessage::AccessToken(_) => RequestKind::AccessToken,
            RequestMessage::RefreshAccessToken(_) => RequestKind::RefreshAccessToken,
            RequestMessage::TokenRevocation(_) => RequestKind::TokenRevocation,
        }
    }

    /// The `state` parameter carried by the request, if any.
    pub fn state(&self) -> Option<&str> {
        match self {
            RequestMessage::Authorization(m) => m.state.as_deref(),
            _ => None,
        }
    }

    pub fn verify(&self) -> std::result::Result<(), VerifyError> {
        match self {
            RequestMessage::Authorization(m) => m.verify(),
            RequestMessage::AccessToken(m) => m.verify(),
            RequestMessage::RefreshAccessToken(m) => m.verify(),
            RequestMessage::TokenRevocation(m) => m.verify(),
        }
    }

    pub fn to_map(&self, extended: bool) -> Map<String, Value> {
        match self {
            RequestMessage::Authorization(m) => m.to_map(extended),
            RequestMessage::AccessToken(m) => m.to_map(extended),
            RequestMessage::RefreshAccessToken(m) => m.to_map(extended),
            RequestMessage::TokenRevocation(m) => m.to_map(extended),
        }
    }

    pub fn to_urlencoded(&self, extended: bool) -> String {
        encode_form(&self.to_map(extended))
    }
}

/// Outcome of decoding and verifying a body against one schema.
#[derive(Debug)]
pub enum Attempt<M> {
    /// Decoded and verified.
    Verified(M),
    /// Decoded but failed verification; `populated` counts recognized fields.
    Rejected { populated: usize, reason: String },
    /// Could not be decoded at all.
    Undecodable(String),
}

impl<M> Attempt<M> {
    fn map<N>(self, f: impl FnOnce(M) -> N) -> Attempt<N> {
        match self {
            Attempt::Verified(m) => Attempt::Verified(f(m)),
            Attempt::Rejected { populated, reason } => Attempt::Rejected { populated, reason },
            Attempt::Undecodable(reason) => Attempt::Undecodable(reason),
        }
    }
}

/// Decodes `body` as `M` and runs its self-verification.
pub fn attempt<M: Message>(body: &str, format: ResponseFormat, extended: bool) -> Attempt<M> {
    match format.decode::<M>(body, extended) {
        Ok(message) => match message.verify() {
            Ok(()) => Attempt::Verified(message),
            Err(e) => Attempt::Rejected { populated: message.populated_fields(), reason: e.to_string() },
        },
        Err(e) => Attempt::Undecodable(e.to_string()),
    }
}

/// Success schemas a response can be parsed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    Authorization,
    AccessToken,
}

impl ResponseKind {
    /// Error schemas tried, in order, when the success schema does not match.
    pub fn default_error_candidates(&self) -> Vec<ErrorKind> {
        match self {
            ResponseKind::Authorization => vec![ErrorKind::AuthorizationError, ErrorKind::TokenError],
            ResponseKind::AccessToken => vec![ErrorKind::TokenError],
        }
    }

    pub fn attempt(&self, body: &str, format: ResponseFormat, extended: bool) -> Attempt<ResponseMessage> {
        match self {
            ResponseKind::Authorization => {
                attempt::<AuthorizationResponse>(body, format, extended).map(ResponseMessage::Authorization)
            }
            ResponseKind::AccessToken => {
                attempt::<AccessTokenResponse>(body, format, extended).map(ResponseMessage::AccessToken)
            }
        }
    }
}

/// Error schemas a response can fall back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AuthorizationError,
    TokenError,
}

impl ErrorKind {
    pub fn attempt(&self, body: &str, format: ResponseFormat, extended: bool) -> Attempt<ResponseMessage> {
        match self {
            ErrorKind::AuthorizationError => attempt::<AuthorizationErrorResponse>(body, format, extended)
                .map(ResponseMessage::AuthorizationError),
            ErrorKind::TokenError => {
                attempt::<TokenErrorResponse>(body, format, extended).map(ResponseMessage::TokenError)
            }
        }
    }
}

/// A parsed response: one success variant or one error variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseMessage {
    Authorization(AuthorizationResponse),
    AccessToken(AccessTokenResponse),
    AuthorizationError(AuthorizationErrorResponse),
    TokenError(TokenErrorResponse),
}

impl ResponseMessage {
    pub fn is_error(&self) -> bool {
        matches!(self, ResponseMessage::AuthorizationError(_) | ResponseMessage::TokenError(_))
    }

    /// The `state` carried by the response, if present and non-empty.
    pub fn state(&self) -> Option<&str> {
        let state = match self {
            ResponseMessage::Authorization(m) => m.state.as_deref(),
            ResponseMessage::AccessToken(m) => m.state.as_deref(),
            ResponseMessage::AuthorizationError(m) => m.state.as_deref(),
            ResponseMessage::TokenError(m) => m.extension.get("state").and_then(Value::as_str),
        };
        state.filter(|s| !s.is_empty())
    }

    pub fn set_state(&mut self, state: impl Into<String>) {
        let state = state.into();
        match self {
            ResponseMessage::Authorization(m) => m.state = Some(state),
            ResponseMessage::AccessToken(m) => m.state = Some(state),
            ResponseMessage::AuthorizationError(m) => m.state = Some(state),
            ResponseMessage::TokenError(m) => {
                m.extension.insert("state".to_string(), Value::String(state));
            }
        }
    }

    /// The protocol error code of an error variant.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            ResponseMessage::AuthorizationError(m) => Some(&m.error),
            ResponseMessage::TokenError(m) => Some(&m.error),
            _ => None,
        }
    }
}
