//! In-memory issue store for tests and local replay.
//!
//! Keeps issues in insertion order (the order searches return them in),
//! applies mutations to that state and records every mutation so callers can
//! assert on exactly which writes a rule issued.
//!
//! ## Limitations
//!
//! - **NOT a tracker**: workflow rules are reduced to a transition-id → status
//!   lookup, and priorities to a priority-id → label lookup
//! - **No persistence**: state is lost when the store is dropped

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{FieldPatch, IssueStore, SearchFilter};
use crate::error::{Error, Result};
use crate::model::Issue;

/// A write the store accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    UpdateFields { id: String, patch: FieldPatch },
    Transition { id: String, transition_id: String },
    SetAssignee { id: String, account_id: String },
    Delete { id: String },
}

/// Store operations, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Search,
    UpdateFields,
    Transition,
    SetAssignee,
    Delete,
}

#[derive(Debug)]
pub struct InMemoryIssueStore {
    issues: Mutex<Vec<Issue>>,
    mutations: Mutex<Vec<Mutation>>,
    /// (operation, issue id); `None` fails the operation for every issue.
    failures: Mutex<HashSet<(Operation, Option<String>)>>,
    transitions: HashMap<String, String>,
    priorities: HashMap<String, String>,
}

impl Default for InMemoryIssueStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryIssueStore {
    /// Store seeded with `issues`. Transition "31" moves to "Done" and
    /// priority id "2" is "High".
    pub fn new(issues: Vec<Issue>) -> Self {
        Self {
            issues: Mutex::new(issues),
            mutations: Mutex::new(Vec::new()),
            failures: Mutex::new(HashSet::new()),
            transitions: HashMap::from([("31".to_string(), "Done".to_string())]),
            priorities: HashMap::from([("2".to_string(), "High".to_string())]),
        }
    }

    #[must_use]
    pub fn with_transition(mut self, id: impl Into<String>, status: impl Into<String>) -> Self {
        self.transitions.insert(id.into(), status.into());
        self
    }

    #[must_use]
    pub fn with_priority(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.priorities.insert(id.into(), label.into());
        self
    }

    /// Make every call of `op` fail with a transport error.
    pub fn fail_on(&self, op: Operation) {
        lock(&self.failures).insert((op, None));
    }

    /// Make `op` fail with a transport error for one issue only.
    pub fn fail_on_issue(&self, op: Operation, id: impl Into<String>) {
        lock(&self.failures).insert((op, Some(id.into())));
    }

    pub fn insert(&self, issue: Issue) {
        lock(&self.issues).push(issue);
    }

    /// Current state of an issue, without subtask refresh.
    pub fn issue(&self, id: &str) -> Option<Issue> {
        lock(&self.issues).iter().find(|i| i.id == id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        lock(&self.issues).iter().map(|i| i.id.clone()).collect()
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        lock(&self.mutations).clone()
    }

    pub fn clear_mutations(&self) {
        lock(&self.mutations).clear();
    }

    fn check(&self, op: Operation, id: Option<&str>) -> Result<()> {
        let failures = lock(&self.failures);
        let targeted = id.is_some_and(|id| failures.contains(&(op, Some(id.to_string()))));
        if targeted || failures.contains(&(op, None)) {
            return Err(Error::Transport(format!("injected {op:?} failure")));
        }
        Ok(())
    }

    /// Copy of `issue` with subtask snapshots replaced by current state.
    fn hydrate(issues: &[Issue], issue: &Issue) -> Issue {
        let mut out = issue.clone();
        for sub in &mut out.fields.subtasks {
            if let Some(current) = issues.iter().find(|i| i.id == sub.id) {
                sub.fields = current.fields.clone();
            }
        }
        out
    }

    fn mutate(&self, id: &str, mutation: Mutation, apply: impl FnOnce(&mut Issue)) -> Result<()> {
        let mut issues = lock(&self.issues);
        let issue = issues
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        apply(issue);
        lock(&self.mutations).push(mutation);
        Ok(())
    }
}

#[async_trait]
impl IssueStore for InMemoryIssueStore {
    async fn get(&self, id: &str) -> Result<Issue> {
        self.check(Operation::Get, Some(id))?;
        let issues = lock(&self.issues);
        issues
            .iter()
            .find(|i| i.id == id)
            .map(|i| Self::hydrate(&issues, i))
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn search(&self, filter: &SearchFilter, max_results: usize) -> Result<Vec<Issue>> {
        self.check(Operation::Search, None)?;
        let issues = lock(&self.issues);
        Ok(issues
            .iter()
            .filter(|i| filter.matches(&i.fields))
            .take(max_results)
            .map(|i| Self::hydrate(&issues, i))
            .collect())
    }

    async fn update_fields(&self, id: &str, patch: &FieldPatch) -> Result<()> {
        self.check(Operation::UpdateFields, Some(id))?;
        let label = patch
            .priority
            .as_ref()
            .map(|p| self.priorities.get(&p.id).cloned().unwrap_or_else(|| p.id.clone()));
        let mutation = Mutation::UpdateFields {
            id: id.to_string(),
            patch: patch.clone(),
        };
        self.mutate(id, mutation, |issue| {
            if label.is_some() {
                issue.fields.priority = label;
            }
        })
    }

    async fn transition(&self, id: &str, transition_id: &str) -> Result<()> {
        self.check(Operation::Transition, Some(id))?;
        let status = self.transitions.get(transition_id).cloned();
        let mutation = Mutation::Transition {
            id: id.to_string(),
            transition_id: transition_id.to_string(),
        };
        self.mutate(id, mutation, |issue| {
            if status.is_some() {
                issue.fields.status = status;
            }
        })
    }

    async fn set_assignee(&self, id: &str, account_id: &str) -> Result<()> {
        self.check(Operation::SetAssignee, Some(id))?;
        let name = lock(&self.issues)
            .iter()
            .find(|i| i.fields.assignee_id.as_deref() == Some(account_id))
            .and_then(|i| i.fields.assignee_name.clone())
            .unwrap_or_else(|| account_id.to_string());
        let mutation = Mutation::SetAssignee {
            id: id.to_string(),
            account_id: account_id.to_string(),
        };
        self.mutate(id, mutation, |issue| {
            issue.fields.assignee_id = Some(account_id.to_string());
            issue.fields.assignee_name = Some(name);
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.check(Operation::Delete, Some(id))?;
        let mut issues = lock(&self.issues);
        let pos = issues
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        issues.remove(pos);
        lock(&self.mutations).push(Mutation::Delete { id: id.to_string() });
        Ok(())
    }
}
