//! Automation rules.
//!
//! Each rule reads from the tracker, decides, and conditionally writes. A
//! rule returns the number of writes it issued; the dispatcher turns that
//! (or the error) into an [`Outcome`].

pub mod balance;
pub mod completion;
pub mod duplicates;
pub mod escalate;
pub mod triage;

pub use balance::WorkloadBalancer;
pub use completion::{CompletionPropagator, CompletionReporter};
pub use duplicates::{Cluster, DuplicateReconciler};
pub use escalate::PriorityEscalator;
pub use triage::TriageAssigner;

use crate::error::Error;

/// Rule identity, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    WorkloadBalance,
    CompletionSweep,
    CompletionReport,
    PriorityEscalation,
    SubtaskRollup,
    TriageAssignment,
    DuplicateReconcile,
}

impl Rule {
    pub fn name(self) -> &'static str {
        match self {
            Rule::WorkloadBalance => "workload_balance",
            Rule::CompletionSweep => "completion_sweep",
            Rule::CompletionReport => "completion_report",
            Rule::PriorityEscalation => "priority_escalation",
            Rule::SubtaskRollup => "subtask_rollup",
            Rule::TriageAssignment => "triage_assignment",
            Rule::DuplicateReconcile => "duplicate_reconcile",
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Result of one rule run inside a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok { writes: usize },
    Failed { reason: String, retryable: bool },
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok { .. })
    }

    pub fn writes(&self) -> usize {
        match self {
            Outcome::Ok { writes } => *writes,
            Outcome::Failed { .. } => 0,
        }
    }
}

impl From<Result<usize, Error>> for Outcome {
    fn from(result: Result<usize, Error>) -> Self {
        match result {
            Ok(writes) => Outcome::Ok { writes },
            Err(e) => Outcome::Failed {
                retryable: e.is_retryable(),
                reason: e.to_string(),
            },
        }
    }
}
