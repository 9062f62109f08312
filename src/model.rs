//! Core data model.
//!
//! An issue is a unit of work in the external tracker. The rules only look at
//! a small subset of its fields, decoded once from the tracker's JSON shape
//! into [`IssueFields`]. Anything the tracker leaves out stays `None`.

pub(crate) mod wire;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// An issue as seen by the rules: its tracker id and decoded fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Tracker-assigned id (numeric string, e.g. "10042").
    pub id: String,
    pub fields: IssueFields,
}

/// Subtasks and search results share the issue shape.
pub type IssueRef = Issue;

impl Issue {
    pub fn new(id: impl Into<String>, fields: IssueFields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decode an issue from the tracker's JSON representation.
    pub fn from_json(value: serde_json::Value) -> crate::error::Result<Self> {
        let raw: wire::RawIssue = serde_json::from_value(value)?;
        raw.into_issue()
    }
}

/// The subset of tracker fields the rules need.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueFields {
    pub issue_type: Option<String>,
    pub summary: Option<String>,
    /// Plain text of the description. Rich-text documents are flattened.
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assignee_id: Option<String>,
    pub assignee_name: Option<String>,
    pub parent_id: Option<String>,
    pub subtasks: Vec<IssueRef>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl IssueFields {
    /// Status is one of the given terminal labels.
    pub fn is_terminal(&self, terminal: &[String]) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| terminal.iter().any(|t| t == s))
    }

    /// Non-empty parent id, if any.
    pub fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|p| !p.is_empty())
    }

    pub fn duplicate_key(&self) -> DuplicateKey {
        DuplicateKey {
            issue_type: self.issue_type.clone(),
            summary: self.summary.clone(),
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .map(str::to_string),
            priority: self.priority.clone(),
        }
    }

    // Builder-style setters, mostly for tests and the in-memory store.

    pub fn issue_type(mut self, v: impl Into<String>) -> Self {
        self.issue_type = Some(v.into());
        self
    }

    pub fn summary(mut self, v: impl Into<String>) -> Self {
        self.summary = Some(v.into());
        self
    }

    pub fn description(mut self, v: impl Into<String>) -> Self {
        self.description = Some(v.into());
        self
    }

    pub fn priority(mut self, v: impl Into<String>) -> Self {
        self.priority = Some(v.into());
        self
    }

    pub fn status(mut self, v: impl Into<String>) -> Self {
        self.status = Some(v.into());
        self
    }

    pub fn assignee(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.assignee_id = Some(id.into());
        self.assignee_name = Some(name.into());
        self
    }

    pub fn parent_id(mut self, v: impl Into<String>) -> Self {
        self.parent_id = Some(v.into());
        self
    }

    pub fn subtask(mut self, sub: IssueRef) -> Self {
        self.subtasks.push(sub);
        self
    }
}

// ---------------------------------------------------------------------------
// Duplicate key
// ---------------------------------------------------------------------------

/// Equality basis for duplicate detection. Two issues with equal keys and
/// different ids are duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DuplicateKey {
    pub issue_type: Option<String>,
    pub summary: Option<String>,
    /// Trimmed plain-text description.
    pub description: Option<String>,
    pub priority: Option<String>,
}

// ---------------------------------------------------------------------------
// User load
// ---------------------------------------------------------------------------

/// Open-task count for one assignee, built per balancing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserLoad {
    pub user_id: String,
    pub display_name: String,
    pub open_task_count: usize,
}

impl UserLoad {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            open_task_count: 0,
        }
    }
}
