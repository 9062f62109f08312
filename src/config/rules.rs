//! Static rule configuration.
//!
//! Keyword lists, ids and labels are deployment data, handed to the
//! dispatcher at construction. Defaults suit a stock Jira Cloud project
//! with a Polish-localized workflow ("Gotowe" is its done status).

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// A team member who may receive balanced work even with no open tasks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeamMember {
    pub account_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Case-insensitive substrings that trigger escalation.
    pub priority_keywords: Vec<String>,
    /// Account that receives issues whose description is just "bug".
    pub triage_owner: Option<String>,
    /// Issue type excluded from workload balancing.
    pub bug_issue_type: String,
    /// Status labels meaning "finished".
    pub terminal_statuses: Vec<String>,
    /// Workflow transition that moves an issue to done.
    pub done_transition_id: String,
    pub high_priority_label: String,
    pub high_priority_id: String,
    pub report_recipients: Vec<String>,
    pub report_subject: String,
    pub team: Vec<TeamMember>,
    /// Page bound for rule searches.
    pub page_size: usize,
    /// Page bound for the report query.
    pub report_page_size: usize,
    pub call_timeout_secs: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            priority_keywords: [
                "asap",
                "critical",
                "severe",
                "immediate attention",
                "outage",
                "high priority",
                "system down",
                "escalation",
                "blocking",
                "impacting",
                "major incident",
                "urgent",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            triage_owner: None,
            bug_issue_type: "Bug".to_string(),
            terminal_statuses: vec!["Done".to_string(), "Gotowe".to_string()],
            done_transition_id: "31".to_string(),
            high_priority_label: "High".to_string(),
            high_priority_id: "2".to_string(),
            report_recipients: Vec::new(),
            report_subject: "Jira automation report".to_string(),
            team: Vec::new(),
            page_size: 1000,
            report_page_size: 100,
            call_timeout_secs: 10,
        }
    }
}

impl RulesConfig {
    /// Load from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read rules file {}: {e}", path.display()))
        })?;
        let rules: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("bad rules file {}: {e}", path.display())))?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let rules: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    fn validate(&self) -> Result<()> {
        if self.terminal_statuses.is_empty() {
            return Err(Error::Config(
                "terminal_statuses must name at least one status".to_string(),
            ));
        }
        if self.page_size == 0 || self.report_page_size == 0 {
            return Err(Error::Config("page sizes must be positive".to_string()));
        }
        if self.call_timeout_secs == 0 {
            return Err(Error::Config("call_timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Keys with no usable default that a deployment has not set.
    pub fn unset_deployment_values(&self) -> Vec<&'static str> {
        let mut unset = Vec::new();
        if self.triage_owner.is_none() {
            unset.push("triage_owner");
        }
        if self.report_recipients.is_empty() {
            unset.push("report_recipients");
        }
        unset
    }
}
