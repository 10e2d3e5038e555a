//! Application state management for the Brainely terminal client.
//!
//! `App` owns the resolved configuration, the authentication flow, the
//! current route, and the sign-in/sign-up form. Requests run on a spawned
//! task and report back through a channel so the UI keeps drawing while
//! one is in flight.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use brainely_core::api::ApiError;
use brainely_core::auth::{
    self, AuthError, AuthFlow, AuthMode, AuthResponse, Navigator, Route, SubmitOutcome,
    TokenStore,
};
use brainely_core::config::AppConfig;
use brainely_core::diagnostics::DiagnosticReport;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background request channel.
/// Only one request is ever in flight, so a small buffer is plenty.
const CHANNEL_BUFFER_SIZE: usize = 4;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Shown after sign-up when the server gives no message.
const REGISTERED_NOTICE: &str = "Account created. Please sign in.";

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ConfirmingQuit,
    Quitting,
}

/// Form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    Username,
    Password,
    Button,
}

impl FormFocus {
    pub fn next(&self) -> Self {
        match self {
            FormFocus::Username => FormFocus::Password,
            FormFocus::Password => FormFocus::Button,
            FormFocus::Button => FormFocus::Username,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormFocus::Username => FormFocus::Button,
            FormFocus::Password => FormFocus::Username,
            FormFocus::Button => FormFocus::Password,
        }
    }
}

/// Current screen. Navigation from the auth flow lands here.
#[derive(Debug)]
pub struct Router {
    pub current: Route,
}

impl Navigator for Router {
    fn navigate(&mut self, route: Route) {
        debug!(from = self.current.path(), to = route.path(), "Navigate");
        self.current = route;
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: AppConfig,
    pub diagnostics: DiagnosticReport,
    pub flow: AuthFlow<Box<dyn TokenStore>>,
    pub router: Router,

    pub state: AppState,
    pub show_debug: bool,

    // Form state
    pub username: String,
    pub password: String,
    pub focus: FormFocus,
    /// Inline notice under the form (validation, sign-up success)
    pub notice: Option<String>,
    /// Blocking alert that must be dismissed (request failures)
    pub alert: Option<String>,

    // Background request channel
    results_rx: mpsc::Receiver<Result<AuthResponse, ApiError>>,
    results_tx: mpsc::Sender<Result<AuthResponse, ApiError>>,
}

impl App {
    pub fn new(config: AppConfig, flow: AuthFlow<Box<dyn TokenStore>>) -> Self {
        let diagnostics = DiagnosticReport::from_config(&config);
        let start = if flow.is_authenticated() {
            Route::Dashboard
        } else {
            Route::Home
        };
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Self {
            config,
            diagnostics,
            flow,
            router: Router { current: start },
            state: AppState::Normal,
            show_debug: false,
            username: String::new(),
            password: String::new(),
            focus: FormFocus::Username,
            notice: None,
            alert: None,
            results_rx: rx,
            results_tx: tx,
        }
    }

    pub fn route(&self) -> Route {
        self.router.current
    }

    /// Auth mode for the form currently on screen.
    pub fn form_mode(&self) -> Option<AuthMode> {
        match self.router.current {
            Route::SignIn => Some(AuthMode::SignIn),
            Route::SignUp => Some(AuthMode::SignUp),
            Route::Home | Route::Dashboard => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.flow.is_submitting()
    }

    /// Switch screens from a user action, resetting the form.
    pub fn go_to(&mut self, route: Route) {
        self.router.navigate(route);
        self.reset_form();
        self.notice = None;
    }

    fn reset_form(&mut self) {
        self.password.clear();
        self.focus = if self.username.is_empty() {
            FormFocus::Username
        } else {
            FormFocus::Password
        };
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            FormFocus::Username => {
                if can_add_char(self.username.len(), MAX_USERNAME_LENGTH, c) {
                    self.username.push(c);
                }
            }
            FormFocus::Password => {
                if can_add_char(self.password.len(), MAX_PASSWORD_LENGTH, c) {
                    self.password.push(c);
                }
            }
            FormFocus::Button => {}
        }
    }

    pub fn pop_char(&mut self) {
        match self.focus {
            FormFocus::Username => {
                self.username.pop();
            }
            FormFocus::Password => {
                self.password.pop();
            }
            FormFocus::Button => {}
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Submit the form on a background task.
    pub fn submit(&mut self) {
        let Some(mode) = self.form_mode() else {
            return;
        };

        match self.flow.begin(mode, &self.username, &self.password) {
            Ok(credentials) => {
                self.notice = None;
                let api = self.flow.api().clone();
                let tx = self.results_tx.clone();
                tokio::spawn(async move {
                    let result = auth::send(&api, mode, &credentials).await;
                    if tx.send(result).await.is_err() {
                        warn!("App closed before request finished");
                    }
                });
            }
            Err(AuthError::InFlight) => debug!("Ignoring submit while a request is in flight"),
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    /// Apply any finished requests.
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.results_rx.try_recv() {
            let outcome = self.flow.finish(result, &mut self.router);
            self.apply_outcome(outcome);
        }
    }

    fn apply_outcome(&mut self, outcome: SubmitOutcome) {
        match outcome {
            SubmitOutcome::Authenticated { .. } => {
                self.username.clear();
                self.password.clear();
                self.focus = FormFocus::Username;
                self.notice = None;
            }
            SubmitOutcome::Registered { ref message } => {
                self.reset_form();
                self.notice = Some(if message.trim().is_empty() {
                    REGISTERED_NOTICE.to_string()
                } else {
                    format!("{}. Please sign in.", message.trim_end_matches('.'))
                });
            }
            SubmitOutcome::Rejected { message } => self.notice = Some(message),
            SubmitOutcome::Failed { .. } => self.alert = Some(outcome.display_text()),
        }
    }

    pub fn sign_out(&mut self) {
        match self.flow.sign_out(&mut self.router) {
            Ok(()) => {
                info!("Signed out from dashboard");
                self.reset_form();
            }
            Err(e) => self.alert = Some(e.to_string()),
        }
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn toggle_debug(&mut self) {
        self.show_debug = !self.show_debug;
    }
}

fn can_add_char(len: usize, max: usize, c: char) -> bool {
    len < max && !c.is_control()
}
