//! Notification dispatch: parse, pick eligible rules, run them in order.

use std::future::Future;
use std::sync::Arc;

use opentelemetry::KeyValue;
use tracing::{Instrument, error, info};
use uuid::Uuid;

use crate::config::RulesConfig;
use crate::error::Result;
use crate::event::{Event, EventKind};
use crate::notify::Notifier;
use crate::rules::{
    CompletionPropagator, CompletionReporter, DuplicateReconciler, Outcome, PriorityEscalator,
    Rule, TriageAssigner, WorkloadBalancer,
};
use crate::store::{IssueStore, TimedStore};
use crate::telemetry::dispatch::{
    record_dispatch_result, record_rule_outcome, start_dispatch_span, start_rule_span,
};
use crate::telemetry::metrics;

/// One rule that ran, and how it went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRun {
    pub rule: Rule,
    pub outcome: Outcome,
}

/// Everything that happened while handling one notification.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub dispatch_id: Uuid,
    pub issue_id: String,
    pub kind: EventKind,
    /// In execution order.
    pub runs: Vec<RuleRun>,
}

impl DispatchReport {
    fn new(event: &Event) -> Self {
        Self {
            dispatch_id: Uuid::new_v4(),
            issue_id: event.issue_id.clone(),
            kind: event.kind.clone(),
            runs: Vec::new(),
        }
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.runs.iter().map(|r| r.rule).collect()
    }

    pub fn outcome(&self, rule: Rule) -> Option<&Outcome> {
        self.runs.iter().find(|r| r.rule == rule).map(|r| &r.outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleRun> {
        self.runs.iter().filter(|r| !r.outcome.is_ok())
    }

    /// Total writes issued across all rules.
    pub fn writes(&self) -> usize {
        self.runs.iter().map(|r| r.outcome.writes()).sum()
    }
}

/// Acknowledgement returned to the notification sender.
#[derive(Debug, Clone)]
pub enum Ack {
    /// The changelog reported no actual change; nothing ran.
    NoChanges,
    Handled(DispatchReport),
}

impl Ack {
    pub fn message(&self) -> &'static str {
        match self {
            Ack::NoChanges => "No changes detected, exiting.",
            Ack::Handled(_) => "OK",
        }
    }

    pub fn report(&self) -> Option<&DispatchReport> {
        match self {
            Ack::NoChanges => None,
            Ack::Handled(report) => Some(report),
        }
    }
}

/// Routes notifications to rules.
///
/// Holds no per-notification state, so one instance serves concurrent
/// notifications behind an `Arc`. Every tracker call goes through a
/// [`TimedStore`] bounded by the configured call timeout.
pub struct Dispatcher {
    store: Arc<dyn IssueStore>,
    notifier: Arc<dyn Notifier>,
    bug_issue_type: String,
    balancer: WorkloadBalancer,
    escalator: PriorityEscalator,
    propagator: CompletionPropagator,
    reporter: CompletionReporter,
    triage: TriageAssigner,
    reconciler: DuplicateReconciler,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn IssueStore>,
        notifier: Arc<dyn Notifier>,
        rules: &RulesConfig,
    ) -> Self {
        Self {
            store: Arc::new(TimedStore::new(store, rules.call_timeout())),
            notifier,
            bug_issue_type: rules.bug_issue_type.clone(),
            balancer: WorkloadBalancer::new(rules),
            escalator: PriorityEscalator::new(rules),
            propagator: CompletionPropagator::new(rules),
            reporter: CompletionReporter::new(rules),
            triage: TriageAssigner::new(rules),
            reconciler: DuplicateReconciler::new(rules),
        }
    }

    /// Parse and handle a raw notification body.
    ///
    /// Only a malformed notification is an error; rule failures are
    /// reported inside the returned [`Ack`].
    pub async fn dispatch(&self, body: &[u8]) -> Result<Ack> {
        let event = match Event::parse(body) {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "rejected notification");
                metrics::notifications_received().add(
                    1,
                    &[
                        KeyValue::new("kind", "unknown"),
                        KeyValue::new("result", "error"),
                    ],
                );
                return Err(e);
            }
        };
        Ok(self.dispatch_event(&event).await)
    }

    /// Handle an already-parsed event.
    pub async fn dispatch_event(&self, event: &Event) -> Ack {
        let mut report = DispatchReport::new(event);
        let span = start_dispatch_span(
            event.kind.as_str(),
            &event.issue_id,
            &report.dispatch_id,
        );

        let ack = async {
            if event.is_noop() {
                info!("no field changes, skipping rules");
                return Ack::NoChanges;
            }
            if !event.is_change() {
                info!(kind = %event.kind, "event kind has no rules");
                return Ack::Handled(report);
            }
            self.run_rules(event, &mut report).await;
            Ack::Handled(report)
        }
        .instrument(span.clone())
        .await;

        let result = match &ack {
            Ack::NoChanges => "noop",
            Ack::Handled(r) if r.failures().next().is_some() => "partial",
            Ack::Handled(_) => "handled",
        };
        record_dispatch_result(&span, result);
        metrics::notifications_received().add(
            1,
            &[
                KeyValue::new("kind", event.kind.as_str().to_string()),
                KeyValue::new("result", result),
            ],
        );
        ack
    }

    async fn run_rules(&self, event: &Event, report: &mut DispatchReport) {
        let store = self.store.as_ref();
        let id = event.issue_id.as_str();
        let fields = &event.fields;

        let is_bug = fields.issue_type.as_deref() == Some(self.bug_issue_type.as_str());
        if event.is_created() && !is_bug {
            self.run(report, Rule::WorkloadBalance, self.balancer.balance(store, id))
                .await;
        }

        if event.has_genuine_change() {
            self.run(report, Rule::CompletionSweep, self.propagator.sweep(store))
                .await;
            self.run(
                report,
                Rule::CompletionReport,
                self.reporter.run(store, self.notifier.as_ref()),
            )
            .await;
        }

        if self.escalator.is_eligible(fields) {
            self.run(
                report,
                Rule::PriorityEscalation,
                self.escalator.escalate(store, id, fields),
            )
            .await;
        }

        if event.is_updated() {
            match fields.parent() {
                Some(parent_id) => {
                    self.run(
                        report,
                        Rule::SubtaskRollup,
                        self.propagator.check_parent(store, parent_id),
                    )
                    .await
                }
                None => {
                    self.run(
                        report,
                        Rule::SubtaskRollup,
                        self.propagator.check_subtasks(store, id, fields),
                    )
                    .await
                }
            }
        }

        if TriageAssigner::applies(fields) {
            self.run(
                report,
                Rule::TriageAssignment,
                self.triage.assign(store, id, fields),
            )
            .await;
        }

        self.run(report, Rule::DuplicateReconcile, self.reconciler.reconcile(store))
            .await;
    }

    /// Run one rule inside its own span and failure boundary.
    async fn run(
        &self,
        report: &mut DispatchReport,
        rule: Rule,
        fut: impl Future<Output = Result<usize>>,
    ) {
        let span = start_rule_span(rule.name(), &report.issue_id);
        let outcome = Outcome::from(fut.instrument(span.clone()).await);

        let (failure, result) = match &outcome {
            Outcome::Ok { .. } => (None, "ok"),
            Outcome::Failed { reason, .. } => (Some(reason.as_str()), "failed"),
        };
        record_rule_outcome(&span, rule.name(), outcome.writes(), failure);
        metrics::rule_runs().add(
            1,
            &[
                KeyValue::new("rule", rule.name()),
                KeyValue::new("result", result),
            ],
        );
        report.runs.push(RuleRun { rule, outcome });
    }
}
