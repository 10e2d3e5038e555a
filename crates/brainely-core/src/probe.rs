//! Connectivity probe for the backend.
//!
//! Hits the base URL, `/signup`, and `/signin` with throwaway credentials,
//! then sends a CORS preflight. Every check runs even if an earlier one
//! fails, so one report shows the whole picture.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::{info, warn};

use crate::api::client::{SIGNIN_PATH, SIGNUP_PATH};
use crate::api::{ApiClient, ApiError, RawResponse, REQUEST_TIMEOUT_SECS};

/// User-Agent identifying probe traffic in backend logs
pub const PROBE_USER_AGENT: &str = "Brainly-Frontend-Test";

/// Origin presented in the CORS preflight
pub const PROBE_ORIGIN: &str = "https://brainly-frontend.netlify.app";

/// The preflight is expected to be quick; give it half the normal budget.
const CORS_TIMEOUT_SECS: u64 = 5;

const TEST_PASSWORD: &str = "test_password_123";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeCheck {
    BaseApi,
    Signup,
    Signin,
    CorsPreflight,
}

impl ProbeCheck {
    pub fn name(&self) -> &'static str {
        match self {
            ProbeCheck::BaseApi => "Base API",
            ProbeCheck::Signup => "Signup",
            ProbeCheck::Signin => "Signin",
            ProbeCheck::CorsPreflight => "CORS preflight",
        }
    }
}

#[derive(Debug)]
pub struct ProbeResult {
    pub check: ProbeCheck,
    pub url: String,
    pub outcome: Result<RawResponse, ApiError>,
}

impl ProbeResult {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug)]
pub struct ProbeReport {
    pub backend_url: String,
    pub results: Vec<ProbeResult>,
}

impl ProbeReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    pub fn get(&self, check: ProbeCheck) -> Option<&ProbeResult> {
        self.results.iter().find(|r| r.check == check)
    }
}

fn probe_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(header::USER_AGENT, HeaderValue::from_static(PROBE_USER_AGENT));
    headers
}

fn preflight_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ORIGIN, HeaderValue::from_static(PROBE_ORIGIN));
    headers.insert(
        header::ACCESS_CONTROL_REQUEST_METHOD,
        HeaderValue::from_static("POST"),
    );
    headers.insert(
        header::ACCESS_CONTROL_REQUEST_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers
}

/// Run every check against `base_url`.
pub async fn run_probe(base_url: &str) -> Result<ProbeReport, ApiError> {
    run_probe_with_timeouts(
        base_url,
        Duration::from_secs(REQUEST_TIMEOUT_SECS),
        Duration::from_secs(CORS_TIMEOUT_SECS),
    )
    .await
}

pub async fn run_probe_with_timeouts(
    base_url: &str,
    request_timeout: Duration,
    cors_timeout: Duration,
) -> Result<ProbeReport, ApiError> {
    let client = ApiClient::with_timeout(base_url, request_timeout)?;
    let cors_client = ApiClient::with_timeout(base_url, cors_timeout)?;

    info!(backend_url = %base_url, "Testing backend connection");

    let mut results = Vec::with_capacity(4);

    let outcome = client.get_raw("", probe_headers()).await;
    results.push(record(ProbeCheck::BaseApi, client.url(""), outcome));

    let body = serde_json::json!({
        "username": format!("test_user_{}", Utc::now().timestamp_millis()),
        "password": TEST_PASSWORD,
    });
    for (check, path) in [
        (ProbeCheck::Signup, SIGNUP_PATH),
        (ProbeCheck::Signin, SIGNIN_PATH),
    ] {
        let outcome = client.post_raw(path, &body, probe_headers()).await;
        results.push(record(check, client.url(path), outcome));
    }

    let outcome = cors_client.options("", preflight_headers()).await;
    results.push(record(ProbeCheck::CorsPreflight, cors_client.url(""), outcome));

    Ok(ProbeReport {
        backend_url: base_url.to_string(),
        results,
    })
}

fn record(
    check: ProbeCheck,
    url: String,
    outcome: Result<RawResponse, ApiError>,
) -> ProbeResult {
    match &outcome {
        Ok(response) => info!(check = check.name(), status = %response.status, "Probe passed"),
        Err(e) => warn!(check = check.name(), error = %e, "Probe failed"),
    }
    ProbeResult {
        check,
        url,
        outcome,
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Testing backend connection")?;
        writeln!(f, "Backend URL: {}", self.backend_url)?;

        for result in &self.results {
            writeln!(f)?;
            writeln!(f, "Testing {}: {}", result.check.name(), result.url)?;
            match &result.outcome {
                Ok(response) if result.check == ProbeCheck::CorsPreflight => {
                    writeln!(f, "  OK   {}", response.status)?;
                    for (name, value) in response.headers.iter() {
                        if name.as_str().starts_with("access-control-") {
                            writeln!(
                                f,
                                "       {}: {}",
                                name.as_str(),
                                value.to_str().unwrap_or("<binary>")
                            )?;
                        }
                    }
                }
                Ok(response) => {
                    writeln!(f, "  OK   {}", response.status)?;
                    writeln!(f, "       Response: {}", response.body)?;
                }
                Err(ApiError::Status {
                    status,
                    status_text,
                    body,
                }) => {
                    writeln!(f, "  FAIL Status: {}", status.as_u16())?;
                    writeln!(f, "       Status Text: {}", status_text)?;
                    writeln!(f, "       Response Data: {}", ApiError::truncate_body(body))?;
                }
                Err(e) if e.is_transport() => {
                    writeln!(f, "  FAIL Request was made but no response received")?;
                    writeln!(f, "       {}", e)?;
                }
                Err(e) => {
                    writeln!(f, "  FAIL Error Message: {}", e)?;
                }
            }
        }

        writeln!(f)?;
        write!(
            f,
            "Backend connection test completed: {}/{} checks passed",
            self.passed(),
            self.results.len()
        )
    }
}
