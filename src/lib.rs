pub mod oauth_core;

pub use oauth_core::config::ClientConfig;
pub use oauth_core::grant_helpers::Expected;
pub use oauth_core::http_client::{
    HttpClientError, HttpMethod, HttpRequest, HttpResponse, InMemoryHttpClient, OAuthHttpClient, RedirectPolicy,
};
#[cfg(feature = "reqwest")]
pub use oauth_core::http_client::ReqwestHttpClient;
pub use oauth_core::memory::SessionRegistry;
pub use oauth_core::message::{
    AccessTokenRequest, AccessTokenResponse, AuthorizationErrorResponse, AuthorizationRequest, AuthorizationResponse,
    EndpointRole, ErrorKind, Message, RefreshAccessTokenRequest, RequestKind, RequestMessage, ResponseFormat,
    ResponseKind, ResponseMessage, TokenErrorResponse, TokenRevocationRequest,
};
pub use oauth_core::oauth_client::{Client, HttpArgs, RequestArgs, RequestInfo, generate_state};
pub use oauth_core::server::Server;
pub use oauth_core::types::{Grant, JWTAlgorithm, OAuthError, Result, Token, VerifyError};
