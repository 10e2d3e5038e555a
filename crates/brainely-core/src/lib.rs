//! Core library for the Brainely client.
//!
//! - `config`: backend URL resolution and persisted settings
//! - `api`: HTTP client wrapper and failure classification
//! - `auth`: credentials, token storage, and the sign-in/sign-up flow
//! - `diagnostics`: key/value report of the resolved configuration
//! - `probe`: connectivity checks against the backend endpoints

pub mod api;
pub mod auth;
pub mod config;
pub mod diagnostics;
pub mod probe;
