//! Application configuration.
//!
//! The backend endpoint is hardcoded: a local development server and a
//! production deployment. [`resolve`] picks one from the build mode and
//! hostname; the result is computed once at startup and passed down.
//!
//! User settings (which token store to use) live in
//! `~/.config/brainely/settings.json`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

/// Application name used for config/data directory paths
const APP_DIR: &str = "brainely";

/// Settings file name
const SETTINGS_FILE: &str = "settings.json";

pub const PRODUCTION_BACKEND_URL: &str = "https://web-production-69a9.up.railway.app";
pub const LOCAL_BACKEND_URL: &str = "http://localhost:3000";

pub const APP_NAME: &str = "Brainely";
pub const APP_VERSION: &str = "1.0.0";

/// Hostname that selects the local backend in development mode.
pub const LOCAL_HOSTNAME: &str = "localhost";

// ============================================================================
// Build Mode
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    /// Mode implied by the compilation profile: debug builds are development.
    pub fn from_build_profile() -> Self {
        if cfg!(debug_assertions) {
            BuildMode::Development
        } else {
            BuildMode::Production
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(BuildMode::Development),
            "production" | "prod" => Ok(BuildMode::Production),
            other => Err(format!("unknown build mode: {}", other)),
        }
    }
}

// ============================================================================
// Resolved Configuration
// ============================================================================

/// Backend URL failed the scheme check. Logged, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    #[error("Invalid backend URL: {0}")]
    InvalidBackendUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend_url: String,
    pub app_name: &'static str,
    pub app_version: &'static str,
    pub mode: BuildMode,
    pub hostname: String,
    pub dev_mode: bool,
}

/// Resolve the runtime configuration.
///
/// The local backend is used only when running a development build on
/// `localhost`; every other combination talks to production.
pub fn resolve(mode: BuildMode, hostname: &str) -> AppConfig {
    let is_local_dev = mode == BuildMode::Development && hostname == LOCAL_HOSTNAME;
    let backend_url = if is_local_dev {
        LOCAL_BACKEND_URL
    } else {
        PRODUCTION_BACKEND_URL
    };

    AppConfig {
        backend_url: backend_url.to_string(),
        app_name: APP_NAME,
        app_version: APP_VERSION,
        mode,
        hostname: hostname.to_string(),
        dev_mode: mode == BuildMode::Development,
    }
}

/// Accept a backend URL only if it starts with an http(s) scheme.
pub fn validate_backend_url(url: &str) -> std::result::Result<(), ConfigWarning> {
    if url.starts_with("http") {
        Ok(())
    } else {
        Err(ConfigWarning::InvalidBackendUrl(url.to_string()))
    }
}

impl AppConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigWarning> {
        validate_backend_url(&self.backend_url)
    }

    /// Origin a browser would report for this hostname.
    pub fn origin(&self) -> String {
        format!("http://{}", self.hostname)
    }

    /// Emit the resolved values for troubleshooting.
    pub fn log_summary(&self) {
        info!(
            backend_url = %self.backend_url,
            app_name = self.app_name,
            app_version = self.app_version,
            dev_mode = self.dev_mode,
            mode = %self.mode,
            hostname = %self.hostname,
            "Configuration resolved"
        );

        match self.validate() {
            Ok(()) => info!("Backend URL is valid"),
            Err(e) => error!(error = %e, "Backend URL failed validation"),
        }
    }
}

// ============================================================================
// Persisted Settings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    #[default]
    File,
    Keyring,
}

impl FromStr for TokenStoreKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(TokenStoreKind::File),
            "keyring" => Ok(TokenStoreKind::Keyring),
            other => Err(format!("unknown token store: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub token_store: TokenStoreKind,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::settings_path()?)
    }

    /// Load settings, falling back to defaults if the file is unreadable.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Failed to load settings, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse settings file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Record the token store choice for later runs. Returns the file written.
    pub fn remember_token_store(&mut self, kind: TokenStoreKind) -> Result<PathBuf> {
        let path = Self::settings_path()?;
        self.token_store = kind;
        self.save_to(&path)?;
        Ok(path)
    }

    fn settings_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_DIR).join(SETTINGS_FILE))
    }
}

/// Directory for persisted client state (token storage, logs).
pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
    Ok(data_dir.join(APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_local_dev() {
        let config = resolve(BuildMode::Development, "localhost");
        assert_eq!(config.backend_url, LOCAL_BACKEND_URL);
        assert!(config.dev_mode);
        assert_eq!(config.app_name, "Brainely");
        assert_eq!(config.app_version, "1.0.0");
    }

    #[test]
    fn test_resolve_everything_else_is_production() {
        let cases = [
            (BuildMode::Development, "127.0.0.1"),
            (BuildMode::Development, "brainly-frontend.netlify.app"),
            (BuildMode::Development, "LOCALHOST"),
            (BuildMode::Development, ""),
            (BuildMode::Production, "localhost"),
            (BuildMode::Production, "brainly-frontend.netlify.app"),
        ];
        for (mode, host) in cases {
            let config = resolve(mode, host);
            assert_eq!(
                config.backend_url, PRODUCTION_BACKEND_URL,
                "expected production for ({}, {:?})",
                mode, host
            );
        }
    }

    #[test]
    fn test_dev_mode_follows_build_mode() {
        assert!(resolve(BuildMode::Development, "example.com").dev_mode);
        assert!(!resolve(BuildMode::Production, "localhost").dev_mode);
    }

    #[test]
    fn test_validate_backend_url() {
        assert!(validate_backend_url(PRODUCTION_BACKEND_URL).is_ok());
        assert!(validate_backend_url(LOCAL_BACKEND_URL).is_ok());
        assert_eq!(
            validate_backend_url("web-production-69a9.up.railway.app"),
            Err(ConfigWarning::InvalidBackendUrl(
                "web-production-69a9.up.railway.app".to_string()
            ))
        );
    }

    #[test]
    fn test_build_mode_parse() {
        assert_eq!("development".parse::<BuildMode>(), Ok(BuildMode::Development));
        assert_eq!("Dev".parse::<BuildMode>(), Ok(BuildMode::Development));
        assert_eq!("PRODUCTION".parse::<BuildMode>(), Ok(BuildMode::Production));
        assert!("staging".parse::<BuildMode>().is_err());
    }

    #[test]
    fn test_origin() {
        assert_eq!(resolve(BuildMode::Production, "localhost").origin(), "http://localhost");
    }

    #[test]
    fn test_settings_roundtrip_and_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(SETTINGS_FILE);

        let loaded = Settings::load_from(&path).expect("missing file loads defaults");
        assert_eq!(loaded.token_store, TokenStoreKind::File);

        let settings = Settings {
            token_store: TokenStoreKind::Keyring,
        };
        settings.save_to(&path).expect("save settings");
        let loaded = Settings::load_from(&path).expect("load settings");
        assert_eq!(loaded.token_store, TokenStoreKind::Keyring);
    }

    #[test]
    fn test_settings_tolerates_missing_fields() {
        let settings: Settings = serde_json::from_str("{}").expect("parse empty settings");
        assert_eq!(settings.token_store, TokenStoreKind::File);
    }
}
