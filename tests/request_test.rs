use serde_json::json;
use starberry_oauth_client::oauth_core::types::epoch_now;
use starberry_oauth_client::{
    AuthorizationRequest, AuthorizationResponse, Client, ClientConfig, EndpointRole, Grant, HttpMethod,
    InMemoryHttpClient, JWTAlgorithm, OAuthError, RequestArgs, RequestKind, RequestMessage, Server,
};

fn config() -> ClientConfig {
    ClientConfig::new("cid")
        .with_client_secret("sec")
        .with_authorization_endpoint("https://as.example/authorize")
        .with_token_endpoint("https://as.example/token")
        .with_redirect_uri("https://rp.example/cb")
}

fn client() -> Client<InMemoryHttpClient> {
    Client::new(config(), InMemoryHttpClient::new())
}

fn code_grant(code: &str, issued_at: i64) -> Grant {
    let resp = AuthorizationResponse { code: code.to_string(), ..Default::default() };
    Grant::from_authorization_response(&resp, 600, issued_at)
}

#[test]
fn test_access_token_request_uses_grant_code() {
    let client = client();
    client.grants().insert("s1", code_grant("abc123", epoch_now()));

    let info = client
        .request_info(RequestKind::AccessToken, HttpMethod::POST, &RequestArgs::new().state("s1"))
        .unwrap();
    let body = info.body.unwrap();
    assert_eq!(info.uri, "https://as.example/token");
    assert!(body.contains("code=abc123"));
    assert!(body.contains("grant_type=authorization_code"));
    assert!(body.contains("client_id=cid"));
    assert!(body.contains("client_secret=sec"));
    assert!(body.contains("redirect_uri=https%3A%2F%2Frp.example%2Fcb"));
    assert!(info.headers.iter().any(|(k, v)| k == "Content-Type" && v == "application/x-www-form-urlencoded"));
}

#[test]
fn test_access_token_request_without_grant() {
    let client = client();
    let err = client.construct_access_token_request(&RequestArgs::new().state("unknown")).unwrap_err();
    assert!(matches!(err, OAuthError::GrantMissing(ref s) if s == "unknown"));
}

#[test]
fn test_access_token_request_with_expired_code() {
    let client = client();
    let issued_at = epoch_now() - 1_000;
    client.grants().insert("old", code_grant("abc123", issued_at));
    let err = client.construct_access_token_request(&RequestArgs::new().state("old")).unwrap_err();
    match err {
        OAuthError::GrantExpired { now, expired_at } => {
            assert_eq!(expired_at, issued_at + 600);
            assert!(now > expired_at);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_argument_precedence() {
    let client = client();
    client.set_state(Some("session-state".into()));

    let args = RequestArgs::new().arg("client_id", "from-args");
    match client.construct_authorization_request(&args).unwrap() {
        RequestMessage::Authorization(req) => {
            assert_eq!(req.client_id, "from-args");
            assert_eq!(req.state.as_deref(), Some("session-state"));
            assert_eq!(req.response_type, vec!["code".to_string()]);
            assert_eq!(req.redirect_uri.as_deref(), Some("https://rp.example/cb"));
        }
        other => panic!("unexpected message: {other:?}"),
    }

    let args = RequestArgs::new().arg("client_id", "from-args").extra("client_id", "from-extra");
    match client.construct_authorization_request(&args).unwrap() {
        RequestMessage::Authorization(req) => assert_eq!(req.client_id, "from-extra"),
        other => panic!("unexpected message: {other:?}"),
    }
}

#[test]
fn test_caller_response_type_is_kept() {
    let client = client();
    let args = RequestArgs::new().arg("response_type", "code token");
    let msg = client.construct_authorization_request(&args).unwrap();
    assert_eq!(msg.to_map(false)["response_type"], json!("code token"));
}

#[test]
fn test_extension_parameters_need_extended_encoding() {
    let client = client();
    let args = RequestArgs::new().state("s").arg("extra_prompt", "login").arg("unknown", "dropped");

    let info = client.request_info(RequestKind::Authorization, HttpMethod::GET, &args).unwrap();
    assert!(info.uri.starts_with("https://as.example/authorize?"));
    assert!(!info.uri.contains("prompt"));
    assert!(!info.uri.contains("unknown"));
    assert!(info.body.is_none());

    let info = client
        .request_info(RequestKind::Authorization, HttpMethod::GET, &args.clone().extra("display", "page"))
        .unwrap();
    assert!(info.uri.contains("prompt=login"));
    assert!(info.uri.contains("display=page"));
    assert!(!info.uri.contains("unknown"));
}

#[test]
fn test_redirect_uri_argument_becomes_default() {
    let client = client();
    let args = RequestArgs::new().arg("redirect_uri", "https://rp.example/other");
    client.construct_authorization_request(&args).unwrap();
    assert_eq!(client.redirect_uri().as_deref(), Some("https://rp.example/other"));

    client.grants().insert("s1", code_grant("abc123", epoch_now()));
    let msg = client.construct_access_token_request(&RequestArgs::new().state("s1")).unwrap();
    assert_eq!(msg.to_map(false)["redirect_uri"], json!("https://rp.example/other"));
}

#[test]
fn test_missing_endpoint_and_client_id() {
    let client = Client::new(ClientConfig::new("cid"), InMemoryHttpClient::new());
    let err = client
        .request_info(RequestKind::Authorization, HttpMethod::GET, &RequestArgs::new())
        .unwrap_err();
    assert!(matches!(err, OAuthError::Configuration(ref m) if m.contains("authorization_endpoint")));

    let info = client
        .request_info(
            RequestKind::Authorization,
            HttpMethod::GET,
            &RequestArgs::new().endpoint("https://explicit.example/auth"),
        )
        .unwrap();
    assert!(info.uri.starts_with("https://explicit.example/auth?"));

    let anonymous = Client::new(ClientConfig::default(), InMemoryHttpClient::new());
    let err = anonymous.construct_authorization_request(&RequestArgs::new()).unwrap_err();
    assert!(matches!(err, OAuthError::Configuration(ref m) if m.contains("client_id")));
}

#[test]
fn test_revocation_endpoint_falls_back_to_token_endpoint() {
    let client = client();
    assert_eq!(client.endpoint(EndpointRole::Revocation, None).unwrap(), "https://as.example/token");
    client.set_endpoint(EndpointRole::Revocation, Some("https://as.example/revoke".into()));
    assert_eq!(client.endpoint(EndpointRole::Revocation, None).unwrap(), "https://as.example/revoke");
}

#[test]
fn test_reset_forgets_session() {
    let client = client();
    client.set_state(Some("s".into()));
    client.grants().insert("s", code_grant("c", epoch_now()));
    client.reset();
    assert!(client.state().is_none());
    assert!(client.redirect_uri().is_none());
    assert!(client.grant_from_state("s").is_none());
    assert!(client.endpoint(EndpointRole::Token, None).is_err());
}

#[test]
fn test_request_object_round_trip() {
    let signer = Client::new(config().with_signing_key("hmac-secret", JWTAlgorithm::HS256), InMemoryHttpClient::new());
    let args = RequestArgs::new().arg("scope", "openid profile").arg("state", "s7");
    let jwt = signer.request_object(RequestKind::Authorization, &args).unwrap();

    let server = Server::new();
    let req: AuthorizationRequest = server
        .parse_jwt_request(&jwt, "hmac-secret", JWTAlgorithm::HS256, true, false)
        .unwrap();
    assert_eq!(req.client_id, "cid");
    assert_eq!(req.scope, vec!["openid".to_string(), "profile".to_string()]);
    assert_eq!(req.state.as_deref(), Some("s7"));

    let unsigned = client().request_object(RequestKind::Authorization, &args);
    assert!(matches!(unsigned, Err(OAuthError::Configuration(_))));
}
