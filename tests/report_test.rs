//! Integration tests for report rendering and delivery spooling.

use serde_json::Value;
use triage_rs::model::{Issue, IssueFields};
use triage_rs::notify::{Message, Notifier, OutboxNotifier};
use triage_rs::report::{CSV_FILENAME, JSON_FILENAME, Report, ReportGenerator};
use triage_rs::store::InMemoryIssueStore;

fn sample() -> Vec<Issue> {
    vec![
        Issue::new(
            "1",
            IssueFields {
                created: Some("2024-05-01T10:00:00.000+0000".into()),
                updated: Some("2024-05-02T10:00:00.000+0000".into()),
                ..IssueFields::default()
                    .summary("Login, then \"crash\"")
                    .assignee("u-1", "Ada")
                    .status("Done")
                    .priority("High")
            },
        ),
        Issue::new("2", IssueFields::default()),
    ]
}

#[test]
fn csv_has_fixed_header_and_fallbacks() {
    let csv = Report::from_issues(&sample()).to_csv();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "Summary,Assignee,Status,Priority,Created,Updated");
    assert_eq!(
        lines[1],
        r#""Login, then ""crash""","Ada","Done","High","2024-05-01T10:00:00.000+0000","2024-05-02T10:00:00.000+0000""#
    );
    assert_eq!(lines[2], r#""","Unassigned","Unknown","None","","""#);
    assert_eq!(lines.len(), 3);
}

#[test]
fn json_is_an_array_of_rows() {
    let json = Report::from_issues(&sample()).to_json().unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    let rows = value.as_array().unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["assignee"], "Ada");
    assert_eq!(rows[1]["assignee"], "Unassigned");
    assert_eq!(rows[1]["status"], "Unknown");
    assert_eq!(rows[1]["priority"], "None");
    assert!(json.contains('\n'), "expected pretty output");
}

#[tokio::test]
async fn generator_reads_a_bounded_page() {
    let issues: Vec<Issue> = (0..5)
        .map(|i| Issue::new(i.to_string(), IssueFields::default().summary(format!("s{i}"))))
        .collect();
    let store = InMemoryIssueStore::new(issues);

    let report = ReportGenerator::new(3).generate(&store).await.unwrap();
    assert_eq!(report.rows.len(), 3);
    assert_eq!(report.rows[0].summary, "s0");
}

#[tokio::test]
async fn write_to_dir_creates_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested");

    let written = Report::from_issues(&sample())
        .write_to_dir(&out)
        .await
        .unwrap();

    assert_eq!(
        written,
        vec![out.join(CSV_FILENAME), out.join(JSON_FILENAME)]
    );
    let csv = std::fs::read_to_string(out.join(CSV_FILENAME)).unwrap();
    assert!(csv.starts_with("Summary,"));
    let json = std::fs::read_to_string(out.join(JSON_FILENAME)).unwrap();
    assert!(serde_json::from_str::<Value>(&json).unwrap().is_array());
}

#[tokio::test]
async fn outbox_spools_envelope_and_attachments() {
    let dir = tempfile::tempdir().unwrap();
    let notifier = OutboxNotifier::new(dir.path());
    let report = Report::from_issues(&sample());
    let message = Message {
        recipients: vec!["lead@example.com".into()],
        subject: "Jira automation report".into(),
        body: "done".into(),
        attachments: report.attachments().unwrap(),
    };

    notifier.send(&message).await.unwrap();

    let spools: Vec<_> = std::fs::read_dir(notifier.dir())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(spools.len(), 1);
    let spool = &spools[0];
    assert!(spool.join(CSV_FILENAME).exists());
    assert!(spool.join(JSON_FILENAME).exists());

    let envelope: Value =
        serde_json::from_str(&std::fs::read_to_string(spool.join("message.json")).unwrap())
            .unwrap();
    assert_eq!(envelope["subject"], "Jira automation report");
    assert_eq!(envelope["recipients"][0], "lead@example.com");
    assert_eq!(envelope["attachments"][1], JSON_FILENAME);
}
