//! Troubleshooting report of the resolved configuration.
//!
//! Feeds the TUI debug overlay and the `debug-info` command.

use std::fmt;

use crate::config::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEntry {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub entries: Vec<DiagnosticEntry>,
}

impl DiagnosticReport {
    pub fn from_config(config: &AppConfig) -> Self {
        let url_check = match config.validate() {
            Ok(()) => "valid".to_string(),
            Err(e) => e.to_string(),
        };

        let entries = vec![
            ("Backend URL", config.backend_url.clone()),
            ("App Name", config.app_name.to_string()),
            ("App Version", config.app_version.to_string()),
            ("Dev Mode", config.dev_mode.to_string()),
            ("Build Mode", config.mode.to_string()),
            ("Hostname", config.hostname.clone()),
            ("Origin", config.origin()),
            ("Config", "HARDCODED".to_string()),
            ("Backend URL Check", url_check),
        ]
        .into_iter()
        .map(|(label, value)| DiagnosticEntry { label, value })
        .collect();

        Self { entries }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.value.as_str())
    }

    /// Width of the longest label, for aligned output.
    pub fn label_width(&self) -> usize {
        self.entries.iter().map(|e| e.label.len()).max().unwrap_or(0)
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.label_width();
        for entry in &self.entries {
            writeln!(f, "{:<width$} : {}", entry.label, entry.value, width = width)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, BuildMode, LOCAL_BACKEND_URL};

    #[test]
    fn test_report_entries() {
        let report = DiagnosticReport::from_config(&resolve(BuildMode::Development, "localhost"));
        assert_eq!(report.get("Backend URL"), Some(LOCAL_BACKEND_URL));
        assert_eq!(report.get("App Name"), Some("Brainely"));
        assert_eq!(report.get("Dev Mode"), Some("true"));
        assert_eq!(report.get("Build Mode"), Some("development"));
        assert_eq!(report.get("Origin"), Some("http://localhost"));
        assert_eq!(report.get("Backend URL Check"), Some("valid"));
        assert_eq!(report.entries[0].label, "Backend URL");
    }

    #[test]
    fn test_report_flags_invalid_url() {
        let config = AppConfig {
            backend_url: "ftp://example.com".to_string(),
            ..resolve(BuildMode::Production, "example.com")
        };
        let report = DiagnosticReport::from_config(&config);
        assert_eq!(
            report.get("Backend URL Check"),
            Some("Invalid backend URL: ftp://example.com")
        );
    }

    #[test]
    fn test_display_aligns_labels() {
        let report = DiagnosticReport::from_config(&resolve(BuildMode::Production, "localhost"));
        let text = report.to_string();
        assert_eq!(text.lines().count(), report.entries.len());
        assert!(text.starts_with("Backend URL       : https://"));
    }
}
