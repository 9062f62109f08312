//! Dispatch and rule span helpers.
//!
//! One span per notification, one child span per rule run. Rule outcomes
//! are recorded as events inside the rule span.

use tracing::Span;
use uuid::Uuid;

/// Start a span covering the handling of one notification.
///
/// `dispatch.result` is declared empty and filled by [`record_dispatch_result`].
pub fn start_dispatch_span(kind: &str, issue_id: &str, dispatch_id: &Uuid) -> Span {
    tracing::info_span!(
        "triage.dispatch",
        "dispatch.id" = %dispatch_id,
        "event.kind" = kind,
        "issue.id" = issue_id,
        "dispatch.result" = tracing::field::Empty,
    )
}

pub fn record_dispatch_result(span: &Span, result: &str) {
    span.record("dispatch.result", result);
}

/// Start a span for a single rule evaluation.
pub fn start_rule_span(rule: &str, issue_id: &str) -> Span {
    tracing::info_span!("triage.rule", "rule.name" = rule, "issue.id" = issue_id)
}

/// Record a rule outcome on the given span.
///
/// Successful runs log at `info`, failures at `error` with the reason.
pub fn record_rule_outcome(span: &Span, rule: &str, writes: usize, failure: Option<&str>) {
    span.in_scope(|| match failure {
        None => tracing::info!(rule, writes, "rule completed"),
        Some(reason) => tracing::error!(rule, writes, reason, "rule failed"),
    });
}
