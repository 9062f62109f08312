//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use triage_rs::config::{RulesConfig, TeamMember};
use triage_rs::engine::Dispatcher;
use triage_rs::error::{Error, Result};
use triage_rs::model::{Issue, IssueFields};
use triage_rs::notify::{Message, Notifier};
use triage_rs::store::InMemoryIssueStore;

/// Notifier that keeps every message it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Message>>,
    fail: Option<fn() -> Error>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: Some(mailer_unavailable),
        }
    }

    /// Fails the way a network mailer would, with a retryable error.
    pub fn failing_transport() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: Some(connection_reset),
        }
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }
}

fn mailer_unavailable() -> Error {
    Error::Report("mailer unavailable".to_string())
}

fn connection_reset() -> Error {
    Error::Transport("smtp connection reset".to_string())
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &Message) -> Result<()> {
        if let Some(fail) = self.fail {
            return Err(fail());
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub fn task(id: &str, summary: &str) -> Issue {
    Issue::new(
        id,
        IssueFields::default()
            .issue_type("Task")
            .summary(summary)
            .priority("Medium")
            .status("To Do"),
    )
}

pub fn assigned(id: &str, user: &str) -> Issue {
    Issue::new(
        id,
        IssueFields::default()
            .issue_type("Task")
            .summary(format!("work item {id}"))
            .status("In Progress")
            .assignee(user, user.to_uppercase()),
    )
}

pub fn rules() -> RulesConfig {
    RulesConfig::default()
}

pub fn rules_with_team(ids: &[&str]) -> RulesConfig {
    RulesConfig {
        team: ids
            .iter()
            .map(|id| TeamMember {
                account_id: id.to_string(),
                display_name: id.to_uppercase(),
            })
            .collect(),
        ..RulesConfig::default()
    }
}

pub fn dispatcher(
    store: Arc<InMemoryIssueStore>,
    notifier: Arc<RecordingNotifier>,
    rules: &RulesConfig,
) -> Dispatcher {
    Dispatcher::new(store, notifier, rules)
}

/// Notification body with a genuine first change item.
pub fn notification(event: &str, id: &str, fields: Value) -> Vec<u8> {
    json!({
        "webhookEvent": event,
        "issue": {"id": id, "fields": fields},
        "changelog": {"items": [{"fromString": "To Do", "toString": "In Progress"}]}
    })
    .to_string()
    .into_bytes()
}

/// Notification body whose first change item is a no-op.
pub fn noop_notification(event: &str, id: &str, fields: Value) -> Vec<u8> {
    json!({
        "webhookEvent": event,
        "issue": {"id": id, "fields": fields},
        "changelog": {"items": [{"fromString": "Medium", "toString": "Medium"}]}
    })
    .to_string()
    .into_bytes()
}

/// Notification body without a changelog.
pub fn bare_notification(event: &str, id: &str, fields: Value) -> Vec<u8> {
    json!({
        "webhookEvent": event,
        "issue": {"id": id, "fields": fields}
    })
    .to_string()
    .into_bytes()
}
