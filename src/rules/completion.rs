//! Parent/subtask completion propagation and the all-closed report trigger.
//!
//! Upward: a parent whose subtasks are all terminal is transitioned to done.
//! Downward (sweep): subtasks of a done parent are closed as well. Both are
//! idempotent: an issue already terminal is never transitioned again.

use tracing::{debug, info, warn};

use crate::config::RulesConfig;
use crate::error::{Error, Result};
use crate::model::IssueFields;
use crate::notify::{Message, Notifier};
use crate::report::ReportGenerator;
use crate::store::{IssueStore, SearchFilter};
use crate::telemetry::metrics;

#[derive(Debug, Clone)]
pub struct CompletionPropagator {
    terminal: Vec<String>,
    done_transition: String,
    page_size: usize,
}

impl CompletionPropagator {
    pub fn new(rules: &RulesConfig) -> Self {
        Self {
            terminal: rules.terminal_statuses.clone(),
            done_transition: rules.done_transition_id.clone(),
            page_size: rules.page_size,
        }
    }

    pub fn is_terminal(&self, fields: &IssueFields) -> bool {
        fields.is_terminal(&self.terminal)
    }

    /// Has subtasks and every one of them is terminal.
    pub fn all_subtasks_done(&self, fields: &IssueFields) -> bool {
        !fields.subtasks.is_empty()
            && fields
                .subtasks
                .iter()
                .all(|s| self.is_terminal(&s.fields))
    }

    /// Local mode: close `issue_id` if all its subtasks are done.
    pub async fn check_subtasks(
        &self,
        store: &dyn IssueStore,
        issue_id: &str,
        fields: &IssueFields,
    ) -> Result<usize> {
        if self.is_terminal(fields) {
            debug!(issue_id, "already done");
            return Ok(0);
        }
        if fields.subtasks.is_empty() {
            debug!(issue_id, "no subtasks");
            return Ok(0);
        }
        if !self.all_subtasks_done(fields) {
            return Ok(0);
        }
        store.transition(issue_id, &self.done_transition).await?;
        info!(
            issue_id,
            subtasks = fields.subtasks.len(),
            "all subtasks done, closed parent"
        );
        Ok(1)
    }

    /// Remote mode: fetch the parent and apply the local rule to it.
    /// A vanished parent is not an error.
    pub async fn check_parent(&self, store: &dyn IssueStore, parent_id: &str) -> Result<usize> {
        let parent = match store.get(parent_id).await {
            Ok(parent) => parent,
            Err(Error::NotFound(_)) => {
                debug!(parent_id, "parent no longer exists");
                return Ok(0);
            }
            Err(e) => return Err(e),
        };
        self.check_subtasks(store, &parent.id, &parent.fields).await
    }

    /// Close every open subtask of every done issue on the page.
    ///
    /// Individual transition failures are logged and skipped.
    pub async fn sweep(&self, store: &dyn IssueStore) -> Result<usize> {
        let issues = store.search(&SearchFilter::All, self.page_size).await?;
        let mut closed = 0;
        for issue in issues.iter().filter(|i| self.is_terminal(&i.fields)) {
            let open_subtasks = issue
                .fields
                .subtasks
                .iter()
                .filter(|s| !self.is_terminal(&s.fields));
            for sub in open_subtasks {
                match store.transition(&sub.id, &self.done_transition).await {
                    Ok(()) => {
                        info!(issue_id = %sub.id, parent_id = %issue.id, "closed stale subtask");
                        closed += 1;
                    }
                    Err(e) => {
                        warn!(
                            issue_id = %sub.id,
                            parent_id = %issue.id,
                            error = %e,
                            "failed to close subtask"
                        );
                    }
                }
            }
        }
        Ok(closed)
    }

    /// Every issue on the page is terminal. An empty tracker is not "all closed".
    pub async fn all_closed(&self, store: &dyn IssueStore) -> Result<bool> {
        let issues = store.search(&SearchFilter::All, self.page_size).await?;
        Ok(!issues.is_empty() && issues.iter().all(|i| self.is_terminal(&i.fields)))
    }
}

/// Sends the issue report once everything is closed.
///
/// Concurrent notifications can each observe "all closed" and each send a
/// report; nothing here deduplicates deliveries.
#[derive(Debug, Clone)]
pub struct CompletionReporter {
    propagator: CompletionPropagator,
    generator: ReportGenerator,
    recipients: Vec<String>,
    subject: String,
}

impl CompletionReporter {
    pub fn new(rules: &RulesConfig) -> Self {
        Self {
            propagator: CompletionPropagator::new(rules),
            generator: ReportGenerator::new(rules.report_page_size),
            recipients: rules.report_recipients.clone(),
            subject: rules.report_subject.clone(),
        }
    }

    /// Returns 1 when a report was delivered, 0 otherwise.
    pub async fn run(&self, store: &dyn IssueStore, notifier: &dyn Notifier) -> Result<usize> {
        if !self.propagator.all_closed(store).await? {
            return Ok(0);
        }
        if self.recipients.is_empty() {
            warn!("all issues closed but no report recipients configured");
            return Ok(0);
        }

        let report = self
            .generator
            .generate(store)
            .await
            .map_err(|e| Error::Report(format!("generate report: {e}")))?;
        let message = Message {
            recipients: self.recipients.clone(),
            subject: self.subject.clone(),
            body: format!(
                "All issues are closed. Snapshot of {} issue(s) generated at {}.",
                report.rows.len(),
                report.generated_at.to_rfc3339()
            ),
            attachments: report.attachments()?,
        };
        notifier
            .send(&message)
            .await
            .map_err(|e| Error::Report(format!("deliver report: {e}")))?;

        metrics::reports_sent().add(1, &[]);
        info!(
            recipients = %self.recipients.join(","),
            rows = report.rows.len(),
            "completion report sent"
        );
        Ok(1)
    }
}
