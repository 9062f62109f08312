//! Bug triage: issues described only as "bug" go to the triage owner.

use tracing::{info, warn};

use crate::config::RulesConfig;
use crate::error::Result;
use crate::model::IssueFields;
use crate::store::IssueStore;

#[derive(Debug, Clone)]
pub struct TriageAssigner {
    owner: Option<String>,
}

impl TriageAssigner {
    pub fn new(rules: &RulesConfig) -> Self {
        Self {
            owner: rules.triage_owner.clone(),
        }
    }

    pub fn applies(fields: &IssueFields) -> bool {
        fields
            .description
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case("bug"))
    }

    pub async fn assign(
        &self,
        store: &dyn IssueStore,
        issue_id: &str,
        fields: &IssueFields,
    ) -> Result<usize> {
        if !Self::applies(fields) {
            return Ok(0);
        }
        let Some(ref owner) = self.owner else {
            warn!(issue_id, "bug report but no triage owner configured");
            return Ok(0);
        };
        store.set_assignee(issue_id, owner).await?;
        info!(issue_id, owner = %owner, "assigned to triage owner");
        Ok(1)
    }
}
