use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Fallback shown when neither the server nor the transport says anything useful.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Failure of a single backend request.
///
/// The variants keep the three cases apart because they carry different
/// detail: a server answer has a status and body to inspect, a lost
/// request has only a transport message, and a request that never left
/// has only a construction message.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server responded with a non-success status.
    #[error("Request failed with status code {}", .status.as_u16())]
    Status {
        status: StatusCode,
        status_text: String,
        body: String,
    },

    /// The request was sent but no response arrived in time.
    #[error("timeout of {}ms exceeded", .0.as_millis())]
    Timeout(Duration),

    /// The request was sent but the connection failed (network drop, refused, CORS).
    #[error("Network error: {0}")]
    NoResponse(String),

    /// The request could not be built or sent at all.
    #[error("{0}")]
    Request(String),

    /// A success status whose body could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in log output
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: StatusCode, body: String) -> Self {
        ApiError::Status {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        }
    }

    /// Classify a reqwest failure. `timeout` is the limit the request ran under.
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_builder() {
            ApiError::Request(err.to_string())
        } else if err.is_timeout() {
            ApiError::Timeout(timeout)
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::NoResponse(err.to_string())
        }
    }

    /// Status code, if the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the request went out but nothing usable came back.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Timeout(_) | ApiError::NoResponse(_))
    }

    /// The `msg` field of a JSON error body, if the server sent one.
    pub fn server_message(&self) -> Option<String> {
        match self {
            ApiError::Status { body, .. } => serde_json::from_str::<ErrorBody>(body)
                .ok()
                .and_then(|b| b.msg)
                .filter(|m| !m.trim().is_empty()),
            _ => None,
        }
    }

    /// Message to show the user: server message, then transport message,
    /// then a generic fallback.
    pub fn user_message(&self) -> String {
        if let Some(msg) = self.server_message() {
            return msg;
        }
        let transport = self.to_string();
        if transport.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            transport
        }
    }
}
