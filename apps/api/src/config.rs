use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::layout::LayoutConfig;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the resume storage / scoring service.
    pub collaborator_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Bounds each delete call.
    pub remote_timeout: Duration,
    /// Bounds `/match`, which runs model scoring on the collaborator side.
    pub match_timeout: Duration,
    pub report_layout_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            collaborator_url: env_or("COLLABORATOR_URL", "http://localhost:8000"),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            remote_timeout: secs("REMOTE_TIMEOUT_SECS", 30)?,
            match_timeout: secs("MATCH_TIMEOUT_SECS", 300)?,
            report_layout_file: std::env::var("REPORT_LAYOUT_FILE").ok().map(PathBuf::from),
        })
    }

    /// Report geometry: the JSON override file if configured, otherwise A4 defaults.
    pub fn load_layout(&self) -> Result<LayoutConfig> {
        let layout = match &self.report_layout_file {
            Some(path) => LayoutConfig::from_json_file(path)?,
            None => LayoutConfig::default(),
        };
        layout.validate().context("invalid report layout")?;
        Ok(layout)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn secs(key: &str, default: u64) -> Result<Duration> {
    let raw = env_or(key, &default.to_string());
    let secs = raw
        .parse::<u64>()
        .with_context(|| format!("{key} must be a whole number of seconds, got '{raw}'"))?;
    anyhow::ensure!(secs > 0, "{key} must be greater than zero");
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(layout: Option<PathBuf>) -> Config {
        Config {
            collaborator_url: "http://localhost:8000".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            remote_timeout: Duration::from_secs(30),
            match_timeout: Duration::from_secs(300),
            report_layout_file: layout,
        }
    }

    #[test]
    fn test_default_layout_without_file() {
        let layout = config(None).load_layout().expect("defaults are valid");
        assert_eq!(layout, LayoutConfig::default());
    }

    #[test]
    fn test_layout_file_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("layout.json");
        std::fs::write(&path, r#"{ "body_font_size_pt": 11.0, "candidate_gap_mm": 12.0 }"#)
            .expect("write layout");

        let layout = config(Some(path)).load_layout().expect("valid override");
        assert_eq!(layout.body_font_size_pt, 11.0);
        assert_eq!(layout.candidate_gap_mm, 12.0);
        assert_eq!(layout.page_width_mm, 210.0);
    }

    #[test]
    fn test_missing_layout_file_fails() {
        let err = config(Some(PathBuf::from("/nonexistent/layout.json")))
            .load_layout()
            .expect_err("missing file");
        assert!(err.to_string().contains("layout"));
    }
}
