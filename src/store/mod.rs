//! The tracker as seen by the rules.
//!
//! [`IssueStore`] is the only way rules read or mutate issues. Every write
//! is scoped to a single issue id. Implementations map tracker failures onto
//! [`Error::NotFound`](crate::error::Error::NotFound),
//! [`Error::Unauthorized`](crate::error::Error::Unauthorized) and
//! [`Error::Transport`](crate::error::Error::Transport).

pub mod http;
pub mod memory;
pub mod timed;

pub use http::HttpIssueStore;
pub use memory::{InMemoryIssueStore, Mutation, Operation};
pub use timed::TimedStore;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::model::{Issue, IssueFields};

/// Capability for querying and mutating issues in the tracker.
#[async_trait]
pub trait IssueStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Issue>;

    /// At most `max_results` issues matching `filter`, in tracker order.
    async fn search(&self, filter: &SearchFilter, max_results: usize) -> Result<Vec<Issue>>;

    async fn update_fields(&self, id: &str, patch: &FieldPatch) -> Result<()>;

    async fn transition(&self, id: &str, transition_id: &str) -> Result<()>;

    async fn set_assignee(&self, id: &str, account_id: &str) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;
}

/// Which issues a search returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    All,
    /// Issues whose status is none of the given labels.
    StatusNotIn(Vec<String>),
}

impl SearchFilter {
    /// JQL rendering for the tracker's search endpoint.
    pub fn jql(&self) -> String {
        match self {
            Self::All => String::new(),
            Self::StatusNotIn(labels) => {
                let quoted = labels
                    .iter()
                    .map(|l| format!("\"{}\"", l.replace('"', "\\\"")))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("status not in ({quoted})")
            }
        }
    }

    pub fn matches(&self, fields: &IssueFields) -> bool {
        match self {
            Self::All => true,
            Self::StatusNotIn(labels) => !fields.is_terminal(labels),
        }
    }
}

/// Partial field update. Only the set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<IdRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdRef {
    pub id: String,
}

impl FieldPatch {
    pub fn priority_id(id: impl Into<String>) -> Self {
        Self {
            priority: Some(IdRef { id: id.into() }),
        }
    }

    /// Request body for the tracker's edit-issue endpoint.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({ "fields": self })
    }
}
