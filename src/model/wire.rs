//! Tracker JSON shapes and their one-time decoding into the typed model.
//!
//! Every field here is optional on the wire. Conversion into [`Issue`] only
//! fails when the issue id is missing; everything else decodes to `None`.

use serde::Deserialize;
use serde_json::Value;

use super::{Issue, IssueFields};
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
pub(crate) struct RawIssue {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub fields: Option<RawFields>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawFields {
    #[serde(default)]
    issuetype: Option<Named>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    priority: Option<Named>,
    #[serde(default)]
    status: Option<Named>,
    #[serde(default)]
    assignee: Option<RawUser>,
    #[serde(default)]
    parent: Option<Box<RawIssue>>,
    #[serde(default)]
    subtasks: Option<Vec<RawIssue>>,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Named {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    #[serde(default, rename = "accountId")]
    account_id: Option<String>,
    #[serde(default, rename = "displayName")]
    display_name: Option<String>,
}

/// `{"issues": [...]}` search response.
#[derive(Debug, Deserialize)]
pub(crate) struct RawSearch {
    #[serde(default)]
    pub issues: Vec<RawIssue>,
}

impl RawIssue {
    pub fn id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Decode into an [`Issue`]. Missing `fields` decode as all-unknown.
    pub fn into_issue(self) -> Result<Issue> {
        let id = self
            .id()
            .ok_or_else(|| Error::Parse("issue.id is missing".to_string()))?;
        let fields = self.fields.unwrap_or_default().into_fields()?;
        Ok(Issue { id, fields })
    }
}

impl RawFields {
    pub fn into_fields(self) -> Result<IssueFields> {
        let subtasks = self
            .subtasks
            .unwrap_or_default()
            .into_iter()
            .map(RawIssue::into_issue)
            .collect::<Result<Vec<_>>>()?;
        let (assignee_id, assignee_name) = match self.assignee {
            Some(user) => (user.account_id, user.display_name),
            None => (None, None),
        };

        Ok(IssueFields {
            issue_type: self.issuetype.and_then(|n| n.name),
            summary: self.summary,
            description: self.description.as_ref().and_then(description_text),
            priority: self.priority.and_then(|n| n.name),
            status: self.status.and_then(|n| n.name),
            assignee_id,
            assignee_name,
            parent_id: self.parent.and_then(|p| p.id()),
            subtasks,
            created: self.created,
            updated: self.updated,
        })
    }
}

/// Plain text of a description that is either a string or a rich-text
/// document. Top-level blocks are joined with newlines.
pub(crate) fn description_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(doc) => {
            let blocks = doc.get("content")?.as_array()?;
            let text = blocks
                .iter()
                .map(|block| {
                    let mut out = String::new();
                    collect_text(block, &mut out);
                    out
                })
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            (!text.is_empty()).then_some(text)
        }
        _ => None,
    }
}

fn collect_text(node: &Value, out: &mut String) {
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        out.push_str(text);
    }
    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children {
            collect_text(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rich_text_description_is_flattened() {
        let doc = json!({
            "type": "doc",
            "content": [
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "System "},
                    {"type": "text", "text": "down"}
                ]},
                {"type": "paragraph", "content": [{"type": "text", "text": "since 9am"}]}
            ]
        });
        assert_eq!(
            description_text(&doc).as_deref(),
            Some("System down\nsince 9am")
        );
    }

    #[test]
    fn empty_or_malformed_description_is_none() {
        assert_eq!(description_text(&json!({"type": "doc"})), None);
        assert_eq!(description_text(&json!({"content": "oops"})), None);
        assert_eq!(description_text(&json!({"content": []})), None);
        assert_eq!(description_text(&json!(42)), None);
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let raw: RawIssue = serde_json::from_value(json!({"id": 10042})).unwrap();
        assert_eq!(raw.into_issue().unwrap().id, "10042");
    }

    #[test]
    fn missing_id_fails() {
        let raw: RawIssue = serde_json::from_value(json!({"fields": {}})).unwrap();
        assert!(matches!(raw.into_issue(), Err(Error::Parse(_))));
    }
}
