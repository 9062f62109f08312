//! Inbound change notifications.
//!
//! A notification is parsed once into an immutable [`Event`]. The raw shape
//! is `{webhookEvent, issue: {id, fields}, changelog?: {items: [...]}}`.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::IssueFields;
use crate::model::wire::RawIssue;

/// What happened to the issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Created,
    Updated,
    /// Any other (or missing) `webhookEvent`. No rule is eligible.
    Other(String),
}

impl EventKind {
    pub fn parse(webhook_event: &str) -> Self {
        match webhook_event {
            "jira:issue_created" => Self::Created,
            "jira:issue_updated" => Self::Updated,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Other(name) => name,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// First field transition recorded in a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeItem {
    pub from_value: Option<String>,
    pub to_value: Option<String>,
}

impl ChangeItem {
    pub fn is_noop(&self) -> bool {
        self.from_value == self.to_value
    }
}

/// A parsed change notification.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub issue_id: String,
    pub fields: IssueFields,
    /// Only the first changelog item is kept.
    pub changelog: Option<ChangeItem>,
}

#[derive(Debug, Deserialize)]
struct RawNotification {
    #[serde(default, rename = "webhookEvent")]
    webhook_event: Option<String>,
    #[serde(default)]
    issue: Option<RawIssue>,
    #[serde(default)]
    changelog: Option<RawChangelog>,
}

#[derive(Debug, Deserialize)]
struct RawChangelog {
    #[serde(default)]
    items: Option<Vec<RawChangeItem>>,
}

#[derive(Debug, Deserialize)]
struct RawChangeItem {
    #[serde(default, rename = "fromString")]
    from_string: Option<String>,
    #[serde(default, rename = "toString")]
    to_string: Option<String>,
}

impl Event {
    /// Parse a raw notification body.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    /// Parse an already-decoded notification.
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawNotification = serde_json::from_value(value)?;
        let issue = raw
            .issue
            .ok_or_else(|| Error::Parse("issue is missing".to_string()))?;
        let issue_id = issue
            .id()
            .ok_or_else(|| Error::Parse("issue.id is missing".to_string()))?;
        let fields = issue
            .fields
            .ok_or_else(|| Error::Parse("issue.fields is missing".to_string()))?
            .into_fields()?;

        let changelog = raw
            .changelog
            .and_then(|c| c.items)
            .and_then(|items| items.into_iter().next())
            .map(|item| ChangeItem {
                from_value: item.from_string,
                to_value: item.to_string,
            });

        Ok(Self {
            kind: EventKind::parse(raw.webhook_event.as_deref().unwrap_or_default()),
            issue_id,
            fields,
            changelog,
        })
    }

    /// The first change item reports no actual change.
    pub fn is_noop(&self) -> bool {
        self.changelog.as_ref().is_some_and(ChangeItem::is_noop)
    }

    /// The first change item reports an actual change.
    pub fn has_genuine_change(&self) -> bool {
        self.changelog.as_ref().is_some_and(|c| !c.is_noop())
    }

    pub fn is_created(&self) -> bool {
        self.kind == EventKind::Created
    }

    pub fn is_updated(&self) -> bool {
        self.kind == EventKind::Updated
    }

    /// Created or updated, the two kinds the rules react to.
    pub fn is_change(&self) -> bool {
        self.is_created() || self.is_updated()
    }
}
