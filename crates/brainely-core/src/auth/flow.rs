//! Sign-in / sign-up request flow.
//!
//! `Idle -> Submitting -> {Authenticated, Failed}`. A failed attempt drops
//! back to `Idle` so the user can retry; only one request may be in flight
//! at a time.
//!
//! The flow is split into [`AuthFlow::begin`] and [`AuthFlow::finish`] so a
//! UI can run the network call on a background task and hand the result
//! back later. [`AuthFlow::submit`] does all three steps inline.

use tracing::{error, info, warn};

use crate::api::{ApiClient, ApiError, SignInResponse, SignUpResponse};

use super::{AuthError, Credentials, TokenStore};

// ============================================================================
// Navigation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    SignIn,
    SignUp,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::SignIn => "/signin",
            Route::SignUp => "/signup",
            Route::Dashboard => "/dashboard",
        }
    }
}

pub trait Navigator {
    fn navigate(&mut self, route: Route);
}

// ============================================================================
// Flow Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

impl AuthMode {
    pub fn title(&self) -> &'static str {
        match self {
            AuthMode::SignIn => "Sign In",
            AuthMode::SignUp => "Sign Up",
        }
    }

    fn failure_prefix(&self) -> &'static str {
        match self {
            AuthMode::SignIn => "Sign in failed",
            AuthMode::SignUp => "Sign up failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Submitting(AuthMode),
    Authenticated,
}

/// Successful backend answer for either mode.
#[derive(Debug, Clone)]
pub enum AuthResponse {
    SignedIn(SignInResponse),
    SignedUp(SignUpResponse),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Submission refused before any request was sent.
    Rejected { message: String },
    /// Token stored and navigated to the dashboard.
    Authenticated { message: String },
    /// Account created; navigated to sign-in.
    Registered { message: String },
    Failed { mode: AuthMode, message: String },
}

impl SubmitOutcome {
    /// Text for a user-facing alert or inline notice.
    pub fn display_text(&self) -> String {
        match self {
            SubmitOutcome::Rejected { message }
            | SubmitOutcome::Authenticated { message }
            | SubmitOutcome::Registered { message } => message.clone(),
            SubmitOutcome::Failed { mode, message } => {
                format!("{}: {}", mode.failure_prefix(), message)
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SubmitOutcome::Authenticated { .. } | SubmitOutcome::Registered { .. }
        )
    }
}

// ============================================================================
// Flow
// ============================================================================

/// Issue the backend request for `mode`.
///
/// Free-standing so a UI can run it on a cloned client in a spawned task
/// and pass the result to [`AuthFlow::finish`].
pub async fn send(
    api: &ApiClient,
    mode: AuthMode,
    credentials: &Credentials,
) -> Result<AuthResponse, ApiError> {
    match mode {
        AuthMode::SignIn => api.signin(credentials).await.map(AuthResponse::SignedIn),
        AuthMode::SignUp => api.signup(credentials).await.map(AuthResponse::SignedUp),
    }
}

pub struct AuthFlow<S: TokenStore> {
    api: ApiClient,
    store: S,
    state: FlowState,
}

impl<S: TokenStore> AuthFlow<S> {
    /// Create a flow, restoring a previously stored token if there is one.
    pub fn new(mut api: ApiClient, store: S) -> Self {
        let state = match store.load() {
            Ok(Some(token)) => {
                api.set_token(token);
                FlowState::Authenticated
            }
            Ok(None) => FlowState::Idle,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                FlowState::Idle
            }
        };
        Self { api, store, state }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, FlowState::Submitting(_))
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == FlowState::Authenticated
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate input and move to `Submitting`.
    pub fn begin(
        &mut self,
        mode: AuthMode,
        username: &str,
        password: &str,
    ) -> Result<Credentials, AuthError> {
        if self.is_submitting() {
            return Err(AuthError::InFlight);
        }
        let credentials = Credentials::new(username, password)?;

        info!(
            mode = mode.title(),
            username = %credentials.username(),
            backend_url = %self.api.base_url(),
            "Submitting credentials"
        );
        self.state = FlowState::Submitting(mode);
        Ok(credentials)
    }

    /// Apply the result of a request started with [`begin`](Self::begin).
    pub fn finish<N: Navigator>(
        &mut self,
        result: Result<AuthResponse, ApiError>,
        navigator: &mut N,
    ) -> SubmitOutcome {
        let mode = match self.state {
            FlowState::Submitting(mode) => mode,
            other => {
                warn!(state = ?other, "Request finished without a submission in progress");
                match &result {
                    Ok(AuthResponse::SignedUp(_)) => AuthMode::SignUp,
                    _ => AuthMode::SignIn,
                }
            }
        };

        match result {
            Ok(AuthResponse::SignedIn(response)) => {
                // Navigation only happens once the token is durably stored.
                if let Err(e) = self.store.save(&response.token) {
                    error!(error = %e, "Failed to store session token");
                    self.state = FlowState::Idle;
                    return SubmitOutcome::Failed {
                        mode,
                        message: AuthError::Storage(e.to_string()).to_string(),
                    };
                }
                self.api.set_token(response.token);
                self.state = FlowState::Authenticated;
                info!("Sign in successful");
                navigator.navigate(Route::Dashboard);
                SubmitOutcome::Authenticated {
                    message: response.msg.unwrap_or_default(),
                }
            }
            Ok(AuthResponse::SignedUp(response)) => {
                self.state = FlowState::Idle;
                info!("Sign up successful");
                navigator.navigate(Route::SignIn);
                SubmitOutcome::Registered {
                    message: response.msg.unwrap_or_default(),
                }
            }
            Err(e) => {
                error!(error = %e, status = ?e.status(), mode = mode.title(), "Request failed");
                self.state = FlowState::Idle;
                SubmitOutcome::Failed {
                    mode,
                    message: e.user_message(),
                }
            }
        }
    }

    /// Validate, send, and apply in one step.
    pub async fn submit<N: Navigator>(
        &mut self,
        mode: AuthMode,
        username: &str,
        password: &str,
        navigator: &mut N,
    ) -> SubmitOutcome {
        let credentials = match self.begin(mode, username, password) {
            Ok(credentials) => credentials,
            Err(e) => {
                return SubmitOutcome::Rejected {
                    message: e.to_string(),
                }
            }
        };
        let result = send(&self.api, mode, &credentials).await;
        self.finish(result, navigator)
    }

    /// Forget the stored token and return to the sign-in screen.
    pub fn sign_out<N: Navigator>(&mut self, navigator: &mut N) -> Result<(), AuthError> {
        self.store
            .clear()
            .map_err(|e| AuthError::ClearStorage(e.to_string()))?;
        self.api.clear_token();
        self.state = FlowState::Idle;
        info!("Signed out");
        navigator.navigate(Route::SignIn);
        Ok(())
    }
}
