//! Authentication module for signing in and keeping the session token.
//!
//! This module provides:
//! - `Credentials`: validated username/password pair from a form
//! - `TokenStore`: persistent slot for the session token (file, keychain, memory)
//! - `AuthFlow`: the sign-in/sign-up state machine
//!
//! The token is stored under the fixed key `"token"` and overwritten on
//! every successful sign-in.

pub mod credentials;
pub mod error;
pub mod flow;
pub mod store;

pub use credentials::Credentials;
pub use error::{AuthError, MISSING_CREDENTIALS};
pub use flow::{send, AuthFlow, AuthMode, AuthResponse, FlowState, Navigator, Route, SubmitOutcome};
pub use store::{
    open_token_store, FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY,
};
