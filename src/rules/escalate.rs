//! Keyword-driven priority escalation.

use tracing::info;

use crate::config::RulesConfig;
use crate::error::Result;
use crate::model::IssueFields;
use crate::store::{FieldPatch, IssueStore};

#[derive(Debug, Clone)]
pub struct PriorityEscalator {
    /// Lowercased once at construction.
    keywords: Vec<String>,
    high_label: String,
    high_id: String,
}

impl PriorityEscalator {
    pub fn new(rules: &RulesConfig) -> Self {
        Self {
            keywords: rules
                .priority_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            high_label: rules.high_priority_label.clone(),
            high_id: rules.high_priority_id.clone(),
        }
    }

    /// Priority is known and not already high.
    pub fn is_eligible(&self, fields: &IssueFields) -> bool {
        fields
            .priority
            .as_deref()
            .is_some_and(|p| p != self.high_label)
    }

    /// First configured keyword found in the summary or description.
    pub fn matching_keyword(&self, fields: &IssueFields) -> Option<&str> {
        let summary = fields.summary.as_deref().map(str::to_lowercase);
        let description = fields.description.as_deref().map(str::to_lowercase);
        self.keywords
            .iter()
            .find(|k| {
                [&summary, &description]
                    .into_iter()
                    .flatten()
                    .any(|text| text.contains(k.as_str()))
            })
            .map(String::as_str)
    }

    pub async fn escalate(
        &self,
        store: &dyn IssueStore,
        issue_id: &str,
        fields: &IssueFields,
    ) -> Result<usize> {
        if !self.is_eligible(fields) {
            return Ok(0);
        }
        let Some(keyword) = self.matching_keyword(fields) else {
            return Ok(0);
        };
        store
            .update_fields(issue_id, &FieldPatch::priority_id(&self.high_id))
            .await?;
        info!(issue_id, keyword, priority = %self.high_label, "priority escalated");
        Ok(1)
    }
}
