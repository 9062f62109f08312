use std::io::Write;

use secrecy::ExposeSecret;
use triage_rs::config::{Config, RulesConfig};
use triage_rs::error::Error;

const VARS: [&str; 6] = [
    "TRACKER_URL",
    "TRACKER_EMAIL",
    "TRACKER_API_TOKEN",
    "LISTEN_ADDR",
    "RULES_FILE",
    "LAST_ERROR_FILE",
];

// Env vars are process-global, so every env-dependent case lives in one test.
#[test]
fn config_from_env() {
    unsafe {
        for var in VARS {
            std::env::remove_var(var);
        }
    }
    assert!(matches!(Config::from_env(), Err(Error::Config(_))));

    unsafe {
        std::env::set_var("TRACKER_URL", "https://acme.atlassian.net");
        std::env::set_var("TRACKER_EMAIL", "bot@acme.test");
        std::env::set_var("TRACKER_API_TOKEN", "tok-123");
    }
    let config = Config::from_env().unwrap();
    assert_eq!(config.tracker_url, "https://acme.atlassian.net");
    assert_eq!(config.tracker_api_token.expose_secret(), "tok-123");
    assert_eq!(config.listen_addr, "0.0.0.0:8080");
    assert_eq!(config.last_error_file, None);
    assert!(!format!("{config:?}").contains("tok-123"));
    assert_eq!(config.rules().unwrap().done_transition_id, "31");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "triage_owner = \"qa-lead\"").unwrap();
    unsafe {
        std::env::set_var("LISTEN_ADDR", "127.0.0.1:9000");
        std::env::set_var("RULES_FILE", file.path());
        std::env::set_var("LAST_ERROR_FILE", "/var/log/triage/last_error.txt");
    }
    let config = Config::from_env().unwrap();
    assert_eq!(config.listen_addr, "127.0.0.1:9000");
    assert_eq!(
        config.last_error_file.as_deref(),
        Some(std::path::Path::new("/var/log/triage/last_error.txt"))
    );
    assert_eq!(
        config.rules().unwrap().triage_owner.as_deref(),
        Some("qa-lead")
    );

    unsafe {
        for var in VARS {
            std::env::remove_var(var);
        }
    }
}

#[test]
fn rules_defaults() {
    let rules = RulesConfig::default();
    assert_eq!(rules.priority_keywords.len(), 12);
    assert!(rules.priority_keywords.iter().any(|k| k == "system down"));
    assert_eq!(rules.terminal_statuses, ["Done", "Gotowe"]);
    assert_eq!(rules.high_priority_id, "2");
    assert_eq!(rules.page_size, 1000);
    assert_eq!(rules.report_page_size, 100);
    assert_eq!(
        rules.unset_deployment_values(),
        ["triage_owner", "report_recipients"]
    );
}

#[test]
fn rules_toml_overrides_keep_other_defaults() {
    let rules = RulesConfig::from_toml(
        r#"
        terminal_statuses = ["Closed"]
        report_recipients = ["lead@example.com"]

        [[team]]
        account_id = "u-1"
        display_name = "Ada"
        "#,
    )
    .unwrap();
    assert_eq!(rules.terminal_statuses, ["Closed"]);
    assert_eq!(rules.report_recipients, ["lead@example.com"]);
    assert_eq!(rules.team.len(), 1);
    assert_eq!(rules.team[0].display_name, "Ada");
    assert_eq!(rules.done_transition_id, "31");
    assert_eq!(rules.call_timeout().as_secs(), 10);
    assert_eq!(rules.unset_deployment_values(), ["triage_owner"]);
}

#[test]
fn rules_validation_rejects_unusable_values() {
    for bad in [
        "terminal_statuses = []",
        "page_size = 0",
        "report_page_size = 0",
        "call_timeout_secs = 0",
        "page_size = \"many\"",
    ] {
        assert!(
            matches!(RulesConfig::from_toml(bad), Err(Error::Config(_))),
            "{bad} should be rejected"
        );
    }
}

#[test]
fn missing_rules_file_names_the_path() {
    let err = RulesConfig::load(std::path::Path::new("/nonexistent/rules.toml")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/rules.toml"));
}
