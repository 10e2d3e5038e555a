//! API client for the Brainely backend.
//!
//! This module provides the `ApiClient` struct: a thin wrapper around
//! `reqwest` with a fixed timeout, a uniform header set, and failure
//! classification into [`ApiError`].

use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::Credentials;
use crate::config::{APP_NAME, APP_VERSION};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds for sign-in and sign-up calls.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

pub const SIGNIN_PATH: &str = "/signin";
pub const SIGNUP_PATH: &str = "/signup";

#[derive(Debug, Clone, Deserialize)]
pub struct SignInResponse {
    /// Absent and `null` both read as no message.
    #[serde(default)]
    pub msg: Option<String>,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpResponse {
    #[serde(default)]
    pub msg: Option<String>,
}

/// A response whose body is kept as untyped JSON.
///
/// Bodies that are not JSON are wrapped as a JSON string.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: header::HeaderMap,
    pub body: serde_json::Value,
}

/// API client for the Brainely backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client with the standard request timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", APP_NAME, APP_VERSION))
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            timeout: self.timeout,
            token: Some(token),
        }
    }

    /// Join a path onto the base URL. An empty path addresses the base itself.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    // ===== Authentication =====

    /// Sign in and return the issued session token
    pub async fn signin(&self, credentials: &Credentials) -> Result<SignInResponse, ApiError> {
        self.post(SIGNIN_PATH, credentials).await
    }

    /// Register a new account
    pub async fn signup(&self, credentials: &Credentials) -> Result<SignUpResponse, ApiError> {
        self.post(SIGNUP_PATH, credentials).await
    }

    // ===== Request Helpers =====

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::Request(format!("Invalid token header: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .client
            .request(method, self.url(path))
            .headers(self.auth_headers()?))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, self.timeout))?;
        Self::check_response(response).await
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            warn!(
                url = %url,
                status = %status,
                body = %ApiError::truncate_body(&body),
                "Request rejected by server"
            );
            Err(ApiError::from_status(status, body))
        }
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::from_transport(e, self.timeout))
    }

    async fn into_raw(&self, response: Response) -> Result<RawResponse, ApiError> {
        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(e, self.timeout))?;
        let body = if text.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        };
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(url = %self.url(path), "GET");
        let request = self
            .request(Method::GET, path)?
            .header(header::ACCEPT, "application/json");
        let response = self.send(request).await?;
        self.decode(response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        debug!(url = %self.url(path), "POST");
        let request = self
            .request(Method::POST, path)?
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .json(body);
        let response = self.send(request).await?;
        self.decode(response).await
    }

    /// GET with extra headers, keeping the body untyped
    pub async fn get_raw(
        &self,
        path: &str,
        headers: header::HeaderMap,
    ) -> Result<RawResponse, ApiError> {
        let request = self.request(Method::GET, path)?.headers(headers);
        let response = self.send(request).await?;
        self.into_raw(response).await
    }

    /// POST with extra headers, keeping the body untyped
    pub async fn post_raw<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        headers: header::HeaderMap,
    ) -> Result<RawResponse, ApiError> {
        let request = self
            .request(Method::POST, path)?
            .header(header::CONTENT_TYPE, "application/json")
            .headers(headers)
            .json(body);
        let response = self.send(request).await?;
        self.into_raw(response).await
    }

    /// OPTIONS request, used for CORS preflight checks
    pub async fn options(
        &self,
        path: &str,
        headers: header::HeaderMap,
    ) -> Result<RawResponse, ApiError> {
        let request = self.request(Method::OPTIONS, path)?.headers(headers);
        let response = self.send(request).await?;
        self.into_raw(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials::new("alice", "hunter22").expect("valid credentials")
    }

    #[test]
    fn test_url_joining() {
        let client = ApiClient::new("https://api.example.com/").expect("client");
        assert_eq!(client.url("/signin"), "https://api.example.com/signin");
        assert_eq!(client.url("signup"), "https://api.example.com/signup");
        assert_eq!(client.url(""), "https://api.example.com");
    }

    #[test]
    fn test_default_timeout() {
        let client = ApiClient::new("http://localhost:3000").expect("client");
        assert_eq!(client.timeout(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_signin_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signin"))
            .and(header_eq("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "username": "alice",
                "password": "hunter22"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "msg": "ok", "token": "abc123" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).expect("client");
        let response = client.signin(&credentials()).await.expect("signin");
        assert_eq!(response.token, "abc123");
        assert_eq!(response.msg.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_error_status_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signin"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "msg": "invalid credentials" })),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).expect("client");
        let err = client.signin(&credentials()).await.unwrap_err();
        match &err {
            ApiError::Status {
                status,
                status_text,
                body,
            } => {
                assert_eq!(*status, StatusCode::UNAUTHORIZED);
                assert_eq!(status_text, "Unauthorized");
                assert!(body.contains("invalid credentials"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
        assert_eq!(err.user_message(), "invalid credentials");
    }

    #[tokio::test]
    async fn test_timeout_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signin"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "msg": "ok", "token": "late" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client =
            ApiClient::with_timeout(server.uri(), Duration::from_millis(100)).expect("client");
        let err = client.signin(&credentials()).await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(_)), "got {:?}", err);
        assert_eq!(err.user_message(), "timeout of 100ms exceeded");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_no_response() {
        // Bind then drop a listener so the port is closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let client = ApiClient::new(format!("http://127.0.0.1:{}", port)).expect("client");
        let err = client.signin(&credentials()).await.unwrap_err();
        assert!(err.is_transport(), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_invalid_base_url_is_request_error() {
        let client = ApiClient::new("web-production-69a9.up.railway.app").expect("client");
        let err = client.signin(&credentials()).await.unwrap_err();
        assert!(matches!(err, ApiError::Request(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signin"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).expect("client");
        let err = client.signin(&credentials()).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header_eq("authorization", "Bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri())
            .expect("client")
            .with_token("abc123".to_string());
        let _: serde_json::Value = client.get("/").await.expect("get");
    }

    #[tokio::test]
    async fn test_raw_response_keeps_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Hello from backend"))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).expect("client");
        let raw = client
            .get_raw("", header::HeaderMap::new())
            .await
            .expect("get_raw");
        assert_eq!(raw.status, StatusCode::OK);
        assert_eq!(raw.body, serde_json::json!("Hello from backend"));
    }
}
