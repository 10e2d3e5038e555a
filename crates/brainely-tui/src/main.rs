//! Brainely - a terminal client for the Brainely backend.
//!
//! Runs a sign-in/sign-up TUI by default. Subcommands cover headless
//! sign-in, the backend connectivity probe, and a configuration dump.

mod app;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use brainely_core::api::ApiClient;
use brainely_core::auth::{open_token_store, AuthFlow, AuthMode, Navigator, Route, TokenStore};
use brainely_core::config::{self, AppConfig, BuildMode, Settings, TokenStoreKind, LOCAL_HOSTNAME};
use brainely_core::diagnostics::DiagnosticReport;
use brainely_core::probe;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file prefix inside the logs directory
const LOG_FILE_PREFIX: &str = "brainely.log";

#[derive(Parser, Debug)]
#[command(name = "brainely", version, about = "Terminal client for Brainely")]
struct Cli {
    /// Build mode used to pick the backend (development or production)
    #[arg(long, env = "BRAINELY_MODE", global = true)]
    mode: Option<BuildMode>,

    /// Hostname the client considers itself served from
    #[arg(long, env = "BRAINELY_HOSTNAME", default_value = LOCAL_HOSTNAME, global = true)]
    hostname: String,

    /// Where to keep the session token (file or keyring)
    #[arg(long, env = "BRAINELY_TOKEN_STORE", global = true)]
    token_store: Option<TokenStoreKind>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in without the TUI and store the session token
    Signin(CredentialArgs),
    /// Create an account without the TUI
    Signup(CredentialArgs),
    /// Remove the stored session token
    Signout,
    /// Save where the session token is kept (file or keyring) for later runs
    SetTokenStore {
        kind: TokenStoreKind,
    },
    /// Check connectivity to the backend endpoints
    Probe {
        /// Backend to test instead of the resolved one
        #[arg(long, env = "BRAINELY_BACKEND_URL")]
        backend_url: Option<String>,
    },
    /// Print the resolved configuration
    DebugInfo,
}

#[derive(clap::Args, Debug)]
struct CredentialArgs {
    #[arg(long, short)]
    username: String,

    /// Password; prompted for when not given
    #[arg(long, env = "BRAINELY_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

/// Navigation target for headless commands: just remember where we ended up.
struct CliNavigator {
    route: Option<Route>,
}

impl Navigator for CliNavigator {
    fn navigate(&mut self, route: Route) {
        self.route = Some(route);
    }
}

/// Log to stderr for CLI commands.
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
fn init_cli_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Log to a daily file while the TUI owns the terminal.
fn init_tui_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let log_dir = config::data_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|_| PathBuf::from("./logs"));
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let _guard = if cli.command.is_none() {
        Some(init_tui_tracing())
    } else {
        init_cli_tracing();
        None
    };

    let mode = cli.mode.unwrap_or_else(BuildMode::from_build_profile);
    let app_config = config::resolve(mode, &cli.hostname);
    app_config.log_summary();

    let mut settings = Settings::load_or_default();
    let store_kind = cli.token_store.unwrap_or(settings.token_store);

    match cli.command {
        None => run_tui(app_config, store_kind).await,
        Some(Command::Signin(args)) => run_auth(&app_config, store_kind, AuthMode::SignIn, args).await,
        Some(Command::Signup(args)) => run_auth(&app_config, store_kind, AuthMode::SignUp, args).await,
        Some(Command::Signout) => run_signout(&app_config, store_kind),
        Some(Command::SetTokenStore { kind }) => {
            let path = settings.remember_token_store(kind)?;
            info!(path = %path.display(), store = ?kind, "Token store saved");
            eprintln!("Token store set to {:?} ({})", kind, path.display());
            Ok(())
        }
        Some(Command::Probe { backend_url }) => {
            let url = backend_url.unwrap_or_else(|| app_config.backend_url.clone());
            let report = probe::run_probe(&url).await?;
            println!("{}", report);
            Ok(())
        }
        Some(Command::DebugInfo) => {
            print!("{}", DiagnosticReport::from_config(&app_config));
            Ok(())
        }
    }
}

fn build_flow(config: &AppConfig, kind: TokenStoreKind) -> Result<AuthFlow<Box<dyn TokenStore>>> {
    let api = ApiClient::new(config.backend_url.clone())?;
    let store = open_token_store(kind)?;
    Ok(AuthFlow::new(api, store))
}

async fn run_auth(
    config: &AppConfig,
    kind: TokenStoreKind,
    mode: AuthMode,
    args: CredentialArgs,
) -> Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")?,
    };

    let mut flow = build_flow(config, kind)?;
    let mut navigator = CliNavigator { route: None };
    let outcome = flow.submit(mode, &args.username, &password, &mut navigator).await;

    if !outcome.is_success() {
        bail!(outcome.display_text());
    }

    let text = outcome.display_text();
    if !text.is_empty() {
        eprintln!("{}", text);
    }
    match navigator.route {
        Some(Route::Dashboard) => eprintln!("Signed in. Session token stored."),
        Some(Route::SignIn) => eprintln!("Account created. Run `brainely signin` to sign in."),
        _ => {}
    }
    Ok(())
}

fn run_signout(config: &AppConfig, kind: TokenStoreKind) -> Result<()> {
    let mut flow = build_flow(config, kind)?;
    let mut navigator = CliNavigator { route: None };
    flow.sign_out(&mut navigator)?;
    eprintln!("Signed out.");
    Ok(())
}

async fn run_tui(config: AppConfig, kind: TokenStoreKind) -> Result<()> {
    info!("Brainely TUI starting");

    let flow = build_flow(&config, kind)?;
    let mut app = App::new(config, flow);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Brainely TUI shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll with a timeout so finished requests are picked up promptly
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
