//! Issue snapshot report.
//!
//! One row per issue with display-friendly fallbacks for missing fields,
//! rendered as CSV (fixed six-column header) and as a JSON array.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::Issue;
use crate::notify::Attachment;
use crate::store::{IssueStore, SearchFilter};

pub const CSV_FILENAME: &str = "jira_report.csv";
pub const JSON_FILENAME: &str = "jira_report.json";
const CSV_HEADER: &str = "Summary,Assignee,Status,Priority,Created,Updated";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub summary: String,
    pub assignee: String,
    pub status: String,
    pub priority: String,
    pub created: String,
    pub updated: String,
}

impl From<&Issue> for ReportRow {
    fn from(issue: &Issue) -> Self {
        let f = &issue.fields;
        Self {
            summary: f.summary.clone().unwrap_or_default(),
            assignee: f
                .assignee_name
                .clone()
                .unwrap_or_else(|| "Unassigned".to_string()),
            status: f.status.clone().unwrap_or_else(|| "Unknown".to_string()),
            priority: f.priority.clone().unwrap_or_else(|| "None".to_string()),
            created: f.created.clone().unwrap_or_default(),
            updated: f.updated.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn from_issues(issues: &[Issue]) -> Self {
        Self {
            generated_at: Utc::now(),
            rows: issues.iter().map(ReportRow::from).collect(),
        }
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for row in &self.rows {
            let cells = [
                &row.summary,
                &row.assignee,
                &row.status,
                &row.priority,
                &row.created,
                &row.updated,
            ];
            let line = cells
                .iter()
                .map(|c| format!("\"{}\"", c.replace('"', "\"\"")))
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// Rows as a pretty-printed JSON array.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.rows)
            .map_err(|e| Error::Report(format!("serialize report: {e}")))
    }

    /// Both renderings, ready to attach to a message.
    pub fn attachments(&self) -> Result<Vec<Attachment>> {
        Ok(vec![
            Attachment {
                filename: CSV_FILENAME.to_string(),
                content_type: "text/csv".to_string(),
                content: self.to_csv().into_bytes(),
            },
            Attachment {
                filename: JSON_FILENAME.to_string(),
                content_type: "application/json".to_string(),
                content: self.to_json()?.into_bytes(),
            },
        ])
    }

    /// Write both renderings into `dir`, returning the written paths.
    pub async fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(dir).await?;
        let mut written = Vec::new();
        for attachment in self.attachments()? {
            let path = dir.join(&attachment.filename);
            tokio::fs::write(&path, &attachment.content)
                .await
                .map_err(|e| Error::Report(format!("cannot write {}: {e}", path.display())))?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Builds a [`Report`] from the tracker's current issues.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    page_size: usize,
}

impl ReportGenerator {
    pub fn new(page_size: usize) -> Self {
        Self { page_size }
    }

    pub async fn generate(&self, store: &dyn IssueStore) -> Result<Report> {
        let issues = store.search(&SearchFilter::All, self.page_size).await?;
        Ok(Report::from_issues(&issues))
    }
}
