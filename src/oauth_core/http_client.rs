use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::RwLock;

/// HTTP methods used by OAuth flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    HEAD,
    PATCH,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::PATCH => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP redirect policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectPolicy {
    /// Do not follow redirections.
    None,
    /// Follow up to `u32` redirections.
    Limit(u32),
}

/// HTTP request for executing a call.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method (GET, POST, etc.).
    pub method: HttpMethod,
    /// Target URL.
    pub url: String,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Optional request body.
    pub body: Option<Vec<u8>>,
    /// Optional timeout duration.
    pub timeout: Option<Duration>,
    /// Redirect policy to use for this request.
    pub redirect_policy: RedirectPolicy,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Body as text, lossy.
    pub fn body_text(&self) -> String {
        self.body.as_deref().map(|b| String::from_utf8_lossy(b).into_owned()).unwrap_or_default()
    }
}

/// HTTP response from executing a call.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A 200 response with a JSON body.
    pub fn json(body: impl Into<String>) -> Self {
        Self::with_content_type(200, "application/json", body)
    }

    /// A 200 response with a form-encoded body.
    pub fn urlencoded(body: impl Into<String>) -> Self {
        Self::with_content_type(200, "application/x-www-form-urlencoded", body)
    }

    pub fn with_content_type(status: u16, content_type: &str, body: impl Into<String>) -> Self {
        HttpResponse {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.into().into_bytes(),
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Body as text, lossy.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Error type for HTTP client operations.
pub type HttpClientError = Box<dyn Error + Send + Sync>;

/// Generic HTTP client interface for OAuth flows.
pub trait OAuthHttpClient: Send + Sync + Clone + 'static {
    /// Execute an HTTP request asynchronously.
    fn execute(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpClientError>> + Send + 'static>>;
}

/// In-memory HTTP client stub for testing.
///
/// Responses are looked up by exact URL first, then by the URL without its
/// query string. Every executed request is recorded.
#[derive(Clone, Default)]
pub struct InMemoryHttpClient {
    responses: Arc<DashMap<String, HttpResponse>>,
    default_response: Option<HttpResponse>,
    requests: Arc<RwLock<Vec<HttpRequest>>>,
}

impl InMemoryHttpClient {
    /// Creates a new in-memory HTTP client with no default response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory HTTP client with a default response on miss.
    pub fn with_default(response: HttpResponse) -> Self {
        Self { default_response: Some(response), ..Self::default() }
    }

    /// Register a mock response for a specific URL.
    pub fn insert_response(&self, url: impl Into<String>, response: HttpResponse) {
        self.responses.insert(url.into(), response);
    }

    /// Requests executed so far, oldest first.
    pub async fn requests(&self) -> Vec<HttpRequest> {
        self.requests.read().await.clone()
    }

    /// The most recent request, if any.
    pub async fn last_request(&self) -> Option<HttpRequest> {
        self.requests.read().await.last().cloned()
    }
}

impl OAuthHttpClient for InMemoryHttpClient {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpClientError>> + Send + 'static>> {
        let responses = self.responses.clone();
        let default = self.default_response.clone();
        let requests = self.requests.clone();
        Box::pin(async move {
            let url = request.url.clone();
            requests.write().await.push(request);
            let base = url.split('?').next().unwrap_or_default();
            if let Some(entry) = responses.get(&url).or_else(|| responses.get(base)) {
                Ok(entry.value().clone())
            } else if let Some(resp) = default {
                Ok(resp)
            } else {
                Err(format!("no mock response for url {}", url).into())
            }
        })
    }
}

/// HTTP client backed by `reqwest`.
///
/// Redirects are governed by the policy given at construction; the
/// per-request `redirect_policy` is not consulted.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHttpClient {
    inner: reqwest::Client,
}

#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
    pub fn new(redirect_policy: RedirectPolicy) -> Result<Self, HttpClientError> {
        let policy = match redirect_policy {
            RedirectPolicy::None => reqwest::redirect::Policy::none(),
            RedirectPolicy::Limit(max) => reqwest::redirect::Policy::limited(max as usize),
        };
        let inner = reqwest::Client::builder().redirect(policy).build()?;
        Ok(Self { inner })
    }

    /// Wraps an already configured `reqwest` client.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

#[cfg(feature = "reqwest")]
impl OAuthHttpClient for ReqwestHttpClient {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpClientError>> + Send + 'static>> {
        let client = self.inner.clone();
        Box::pin(async move {
            let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())?;
            let mut builder = client.request(method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }
            if let Some(timeout) = request.timeout {
                builder = builder.timeout(timeout);
            }
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
                .collect();
            let body = response.bytes().await?.to_vec();
            Ok(HttpResponse { status, headers, body })
        })
    }
}
