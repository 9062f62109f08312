//! Metric instrument factories for triage-rs.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"triage-rs"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for triage-rs instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("triage-rs")
}

/// Counter: notifications received.
/// Labels: `kind`, `result` ("handled" | "partial" | "noop" | "error").
pub fn notifications_received() -> Counter<u64> {
    meter()
        .u64_counter("triage.notifications.received")
        .with_description("Number of change notifications received")
        .build()
}

/// Counter: rule evaluations.
/// Labels: `rule`, `result` ("ok" | "failed").
pub fn rule_runs() -> Counter<u64> {
    meter()
        .u64_counter("triage.rule.runs")
        .with_description("Number of rule evaluations")
        .build()
}

/// Counter: tracker calls.
/// Labels: `operation`, `result` ("ok" | "not_found" | "error" | "timeout").
pub fn tracker_calls() -> Counter<u64> {
    meter()
        .u64_counter("triage.tracker.calls")
        .with_description("Number of issue tracker calls")
        .build()
}

/// Histogram: tracker call duration in milliseconds.
/// Labels: `operation`.
pub fn tracker_call_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("triage.tracker.call_duration_ms")
        .with_description("Issue tracker call duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// Counter: reports delivered to recipients.
pub fn reports_sent() -> Counter<u64> {
    meter()
        .u64_counter("triage.reports.sent")
        .with_description("Number of completion reports delivered")
        .build()
}
