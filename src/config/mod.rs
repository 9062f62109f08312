//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! The tracker API token is wrapped in secrecy::SecretString to prevent log leaks.

pub mod rules;

pub use rules::{RulesConfig, TeamMember};

use crate::error::{Error, Result};
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug)]
pub struct Config {
    /// Tracker base URL, e.g. `https://acme.atlassian.net`.
    pub tracker_url: String,
    pub tracker_email: String,
    pub tracker_api_token: SecretString,
    pub listen_addr: String,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
    /// Optional TOML file overriding the default rule configuration.
    pub rules_file: Option<PathBuf>,
    /// Optional spool directory for outgoing report mail.
    pub report_outbox: Option<PathBuf>,
    /// Optional file overwritten with the last notification that failed.
    pub last_error_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    /// In production, systemd EnvironmentFile provides the vars.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            tracker_url: required_var("TRACKER_URL")?,
            tracker_email: required_var("TRACKER_EMAIL")?,
            tracker_api_token: SecretString::from(required_var("TRACKER_API_TOKEN")?),
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            rules_file: std::env::var("RULES_FILE").ok().map(PathBuf::from),
            report_outbox: std::env::var("REPORT_OUTBOX").ok().map(PathBuf::from),
            last_error_file: std::env::var("LAST_ERROR_FILE").ok().map(PathBuf::from),
        })
    }

    /// Rule configuration: the rules file if one is set, defaults otherwise.
    ///
    /// Warns for each deployment-specific value left unset; the rule that
    /// needs it then does nothing.
    pub fn rules(&self) -> Result<RulesConfig> {
        let rules = match self.rules_file {
            Some(ref path) => RulesConfig::load(path)?,
            None => RulesConfig::default(),
        };
        for key in rules.unset_deployment_values() {
            warn!(key, "rule configuration value is unset, its rule will not act");
        }
        Ok(rules)
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}
