//! REST API client module for the Brainely backend.
//!
//! This module provides the `ApiClient` for issuing JSON requests against
//! the backend base URL, and `ApiError` for classifying what went wrong.
//!
//! Sign-in returns an opaque session token that is sent as a bearer token
//! on later requests.

pub mod client;
pub mod error;

pub use client::{ApiClient, RawResponse, SignInResponse, SignUpResponse, REQUEST_TIMEOUT_SECS};
pub use error::{ApiError, UNKNOWN_ERROR};
