//! Integration tests for telemetry initialization and span helpers.

use uuid::Uuid;

#[test]
fn telemetry_initializes_without_endpoint() {
    // A global subscriber can only be installed once per process; a second
    // init returns quietly instead of panicking.
    let config = triage_rs::telemetry::TelemetryConfig {
        endpoint: None,
        service_name: "triage-test".to_string(),
        log_level: "debug".to_string(),
    };
    let _guard = triage_rs::telemetry::init_telemetry(config);
}

#[test]
fn dispatch_span_creates_and_records_result() {
    let id = Uuid::new_v4();
    let span = triage_rs::telemetry::dispatch::start_dispatch_span("updated", "10", &id);
    triage_rs::telemetry::dispatch::record_dispatch_result(&span, "handled");
}

#[test]
fn rule_span_records_success_and_failure() {
    let span = triage_rs::telemetry::dispatch::start_rule_span("subtask_rollup", "10");
    triage_rs::telemetry::dispatch::record_rule_outcome(&span, "subtask_rollup", 1, None);
    triage_rs::telemetry::dispatch::record_rule_outcome(
        &span,
        "subtask_rollup",
        0,
        Some("tracker call timed out after 10s"),
    );
}

#[test]
fn metric_instruments_are_usable_without_a_provider() {
    use opentelemetry::KeyValue;
    triage_rs::telemetry::metrics::rule_runs().add(1, &[KeyValue::new("rule", "test")]);
    triage_rs::telemetry::metrics::tracker_call_duration_ms().record(1.5, &[]);
}
