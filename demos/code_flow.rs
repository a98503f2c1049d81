//! Authorization code flow against a canned authorization server
//! Run with: `cargo run --example code_flow`

use starberry_oauth_client::{
    Client, ClientConfig, HttpMethod, HttpResponse, InMemoryHttpClient, OAuthError, RequestArgs, RequestKind,
    ResponseFormat, ResponseKind, generate_state,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), OAuthError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let http = InMemoryHttpClient::new();
    http.insert_response(
        "https://as.example/token",
        HttpResponse::json(r#"{"access_token":"AT-1","token_type":"Bearer","expires_in":3600,"refresh_token":"RT-1"}"#),
    );
    http.insert_response("https://rs.example/me", HttpResponse::json(r#"{"name":"demo"}"#));

    let config = ClientConfig::new("demo-client")
        .with_client_secret("demo-secret")
        .with_authorization_endpoint("https://as.example/authorize")
        .with_token_endpoint("https://as.example/token")
        .with_redirect_uri("https://rp.example/callback");
    let client = Client::new(config, http);

    // Where the user agent would be sent.
    let state = generate_state();
    client.set_state(Some(state.clone()));
    let info = client.request_info(RequestKind::Authorization, HttpMethod::GET, &RequestArgs::new().arg("scope", "profile"))?;
    println!("authorize at: {}", info.uri);

    // What the user agent brings back to the redirect URI.
    let callback = format!("https://rp.example/callback?code=CODE-1&state={}", state);
    client.parse_response(ResponseKind::Authorization, &callback, ResponseFormat::UrlEncoded, "", false)?;

    client.do_access_token_request(RequestArgs::new().state(state.as_str())).await?;
    let resource = client
        .fetch_protected_resource("https://rs.example/me", HttpMethod::GET, Vec::new(), &state, "", None)
        .await?;
    println!("resource answered {}: {}", resource.status, resource.body_text());
    Ok(())
}
