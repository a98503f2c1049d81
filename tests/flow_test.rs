use serde_json::json;
use starberry_oauth_client::oauth_core::types::epoch_now;
use starberry_oauth_client::{
    AccessTokenResponse, Client, ClientConfig, Grant, HttpArgs, HttpMethod, HttpResponse, InMemoryHttpClient,
    OAuthError, RequestArgs, ResponseFormat, ResponseKind, ResponseMessage,
};

const TOKEN_URL: &str = "https://as.example/token";
const RESOURCE_URL: &str = "https://rs.example/data";

fn config() -> ClientConfig {
    ClientConfig::new("cid")
        .with_client_secret("sec")
        .with_authorization_endpoint("https://as.example/authorize")
        .with_token_endpoint(TOKEN_URL)
        .with_redirect_uri("https://rp.example/cb")
}

fn token_grant(access: &str, refresh: Option<&str>, expires_in: u64, scope: &[&str], issued_at: i64) -> Grant {
    let resp = AccessTokenResponse {
        access_token: access.to_string(),
        token_type: "Bearer".to_string(),
        expires_in: Some(expires_in),
        refresh_token: refresh.map(str::to_string),
        scope: scope.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    };
    Grant::from_token_response(&resp, 600, issued_at)
}

fn token_body(access: &str) -> String {
    json!({ "access_token": access, "token_type": "Bearer", "expires_in": 3600 }).to_string()
}

#[tokio::test]
async fn test_code_flow_in_memory() {
    let http = InMemoryHttpClient::new();
    http.insert_response("https://as.example/authorize", HttpResponse::urlencoded("code=c1&state=s1"));
    http.insert_response(TOKEN_URL, HttpResponse::json(token_body("a1")));
    let client = Client::new(config(), http.clone());
    client.set_state(Some("s1".into()));

    let resp = client
        .do_authorization_request(RequestArgs::new().state("s1").response_format(ResponseFormat::UrlEncoded))
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(resp, ResponseMessage::Authorization(_)));
    let auth = http.last_request().await.unwrap();
    assert_eq!(auth.method, HttpMethod::GET);
    assert!(auth.url.contains("state=s1"));

    let resp = client.do_access_token_request(RequestArgs::new().state("s1")).await.unwrap();
    assert!(matches!(resp, ResponseMessage::AccessToken(_)));
    let exchange = http.last_request().await.unwrap();
    assert_eq!(exchange.method, HttpMethod::POST);
    assert!(exchange.body_text().contains("code=c1"));

    assert_eq!(client.grants().len(), 1);
    let grant = client.grant_from_state("s1").unwrap();
    assert_eq!(grant.code(), Some("c1"));
    assert_eq!(grant.tokens()[0].access_token, "a1");
}

#[tokio::test]
async fn test_authorization_without_response_body() {
    let http = InMemoryHttpClient::with_default(HttpResponse { status: 200, headers: vec![], body: vec![] });
    let client = Client::new(config(), http);
    let resp = client.do_authorization_request(RequestArgs::new().state("s")).await.unwrap();
    assert!(resp.is_none());
    assert!(client.grants().is_empty());
}

#[tokio::test]
async fn test_authorization_error_gets_request_state() {
    let http = InMemoryHttpClient::with_default(HttpResponse::urlencoded("error=access_denied"));
    let client = Client::new(config(), http);
    let resp = client
        .do_authorization_request(
            RequestArgs::new().arg("state", "s9").response_format(ResponseFormat::UrlEncoded),
        )
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(resp, ResponseMessage::AuthorizationError(_)));
    assert_eq!(resp.state(), Some("s9"));
    assert!(client.grants().is_empty());
}

#[tokio::test]
async fn test_refresh_flow_in_memory() {
    let http = InMemoryHttpClient::new();
    http.insert_response(TOKEN_URL, HttpResponse::json(token_body("a2")));
    let client = Client::new(config(), http.clone());
    client.grants().insert("flow1", token_grant("a1", Some("r1"), 3600, &["read"], epoch_now()));

    let resp = client.do_access_token_refresh(RequestArgs::new().state("flow1")).await.unwrap();
    assert!(matches!(resp, ResponseMessage::AccessToken(_)));

    let request = http.last_request().await.unwrap();
    assert_eq!(request.url, TOKEN_URL);
    let body = request.body_text();
    assert!(body.contains("refresh_token=r1"));
    assert!(body.contains("grant_type=refresh_token"));
    assert!(body.contains("scope=read"));

    let grant = client.grant_from_state("flow1").unwrap();
    let issued: Vec<&str> = grant.tokens().iter().map(|t| t.access_token.as_str()).collect();
    assert_eq!(issued, vec!["a1", "a2"]);
}

#[tokio::test]
async fn test_refresh_and_revoke_without_state() {
    let http = InMemoryHttpClient::new();
    http.insert_response(TOKEN_URL, HttpResponse::json(token_body("a2")));
    let client = Client::new(config(), http.clone());
    let body = json!({ "access_token": "a1", "token_type": "Bearer", "refresh_token": "r1" }).to_string();
    client
        .parse_response(ResponseKind::AccessToken, &body, ResponseFormat::Json, "", false)
        .unwrap();
    assert!(client.grants().contains(""));

    client.do_access_token_refresh(RequestArgs::new()).await.unwrap();
    let request = http.last_request().await.unwrap();
    assert!(request.body_text().contains("refresh_token=r1"));
    assert_eq!(client.grant_from_state("").unwrap().tokens().len(), 2);

    client.do_revoke_token(RequestArgs::new()).await.unwrap();
    let request = http.last_request().await.unwrap();
    assert!(request.body_text().contains("token=a1"));
}

#[tokio::test]
async fn test_refresh_unknown_flow() {
    let http = InMemoryHttpClient::with_default(HttpResponse::json(token_body("never")));
    let client = Client::new(config(), http.clone());
    let err = client.do_access_token_refresh(RequestArgs::new().state("nope")).await.unwrap_err();
    assert!(matches!(err, OAuthError::TokenUnavailable));
    assert!(!client.grants().contains("nope"));
    assert!(http.requests().await.is_empty());
}

#[tokio::test]
async fn test_refresh_without_refresh_token() {
    let client = Client::new(config(), InMemoryHttpClient::new());
    client.grants().insert("f", token_grant("a1", None, 3600, &[], epoch_now()));
    let err = client.do_access_token_refresh(RequestArgs::new().state("f")).await.unwrap_err();
    assert!(matches!(err, OAuthError::TokenUnavailable));
}

#[tokio::test]
async fn test_revoke_uses_revocation_endpoint() {
    let http = InMemoryHttpClient::new();
    http.insert_response("https://as.example/revoke", HttpResponse { status: 200, headers: vec![], body: vec![] });
    let client = Client::new(config().with_revocation_endpoint("https://as.example/revoke"), http.clone());
    client.grants().insert("f", token_grant("a1", Some("r1"), 3600, &[], epoch_now()));

    client.do_revoke_token(RequestArgs::new().state("f")).await.unwrap();
    let request = http.last_request().await.unwrap();
    assert_eq!(request.url, "https://as.example/revoke");
    assert!(request.body_text().contains("token=a1"));
}

#[tokio::test]
async fn test_transport_status_mapping() {
    let http = InMemoryHttpClient::new();
    let client = Client::new(config(), http.clone());
    client.grants().insert("f", token_grant("a1", Some("r1"), 3600, &[], epoch_now()));

    http.insert_response(TOKEN_URL, HttpResponse::with_content_type(500, "text/plain", "boom"));
    let err = client.do_access_token_refresh(RequestArgs::new().state("f")).await.unwrap_err();
    assert!(matches!(err, OAuthError::Transport { status: Some(500), ref message } if message.contains("boom")));

    http.insert_response(TOKEN_URL, HttpResponse::with_content_type(400, "application/json", "{}"));
    let err = client.do_access_token_refresh(RequestArgs::new().state("f")).await.unwrap_err();
    assert!(matches!(err, OAuthError::Transport { status: Some(400), .. }));

    http.insert_response(TOKEN_URL, HttpResponse::with_content_type(200, "text/html", "<html></html>"));
    let err = client.do_access_token_refresh(RequestArgs::new().state("f")).await.unwrap_err();
    assert!(matches!(err, OAuthError::Transport { status: Some(200), .. }));

    assert_eq!(client.grant_from_state("f").unwrap().tokens().len(), 1);
}

#[tokio::test]
async fn test_password_adds_basic_auth() {
    let http = InMemoryHttpClient::with_default(HttpResponse::json(token_body("a2")));
    let client = Client::new(config(), http.clone());
    client.grants().insert("f", token_grant("a1", Some("r1"), 3600, &[], epoch_now()));

    let args = RequestArgs::new()
        .state("f")
        .http_args(HttpArgs::new().password("pw").header("X-Trace", "t1"));
    client.do_access_token_refresh(args).await.unwrap();

    let request = http.last_request().await.unwrap();
    assert_eq!(request.header("authorization"), Some("Basic Y2lkOnB3"));
    assert_eq!(request.header("x-trace"), Some("t1"));
}

#[tokio::test]
async fn test_fetch_refreshes_expired_token() {
    let http = InMemoryHttpClient::new();
    http.insert_response(TOKEN_URL, HttpResponse::json(token_body("a2")));
    http.insert_response(RESOURCE_URL, HttpResponse::json(r#"{"ok":true}"#));
    let client = Client::new(config(), http.clone());
    client.grants().insert("f", token_grant("a1", Some("r1"), 10, &["read"], epoch_now() - 100));

    let resp = client
        .fetch_protected_resource(RESOURCE_URL, HttpMethod::GET, vec![], "f", "read", None)
        .await
        .unwrap();
    assert_eq!(resp.status, 200);

    let requests = http.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url, TOKEN_URL);
    assert!(requests[0].body_text().contains("refresh_token=r1"));
    assert_eq!(requests[1].header("Authorization"), Some("Bearer a2"));
    assert_eq!(client.grant_from_state("f").unwrap().tokens().len(), 2);
}

#[tokio::test]
async fn test_fetch_without_scope_refreshes_expired_token() {
    let http = InMemoryHttpClient::new();
    http.insert_response(TOKEN_URL, HttpResponse::json(token_body("a2")));
    http.insert_response(RESOURCE_URL, HttpResponse::json(r#"{"ok":true}"#));
    let client = Client::new(config(), http.clone());
    client.grants().insert("f", token_grant("a1", Some("r1"), 10, &[], epoch_now() - 100));

    let resp = client
        .fetch_protected_resource(RESOURCE_URL, HttpMethod::GET, vec![], "f", "", None)
        .await
        .unwrap();
    assert_eq!(resp.status, 200);

    let requests = http.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(requests[0].body_text().contains("refresh_token=r1"));
    assert_eq!(requests[1].header("Authorization"), Some("Bearer a2"));
}

#[tokio::test]
async fn test_fetch_retries_once_after_unauthorized() {
    let http = InMemoryHttpClient::new();
    http.insert_response(TOKEN_URL, HttpResponse::json(token_body("a2")));
    http.insert_response(RESOURCE_URL, HttpResponse::with_content_type(401, "text/plain", "denied"));
    let client = Client::new(config(), http.clone());
    client.grants().insert("f", token_grant("a1", Some("r1"), 3600, &[], epoch_now()));

    let resp = client
        .fetch_protected_resource(RESOURCE_URL, HttpMethod::GET, vec![], "f", "", None)
        .await
        .unwrap();
    assert_eq!(resp.status, 401);

    let requests = http.requests().await;
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].header("Authorization"), Some("Bearer a1"));
    assert_eq!(requests[1].url, TOKEN_URL);
    assert_eq!(requests[2].header("Authorization"), Some("Bearer a2"));
}

#[tokio::test]
async fn test_fetch_without_token() {
    let client = Client::new(config(), InMemoryHttpClient::new());
    let err = client
        .fetch_protected_resource(RESOURCE_URL, HttpMethod::GET, vec![], "missing", "", None)
        .await
        .unwrap_err();
    assert!(matches!(err, OAuthError::TokenUnavailable));
}

#[tokio::test]
async fn test_fetch_with_explicit_access_token() {
    let http = InMemoryHttpClient::with_default(HttpResponse::with_content_type(401, "text/plain", "denied"));
    let client = Client::new(config(), http.clone());
    client.grants().insert("f", token_grant("a1", Some("r1"), 3600, &[], epoch_now()));

    let resp = client
        .fetch_protected_resource(RESOURCE_URL, HttpMethod::GET, vec![], "f", "", Some("given".into()))
        .await
        .unwrap();
    assert_eq!(resp.status, 401);
    let requests = http.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].header("Authorization"), Some("Bearer given"));
}
