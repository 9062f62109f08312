//! Workload-balanced assignment of new issues.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::{RulesConfig, TeamMember};
use crate::error::Result;
use crate::model::{Issue, UserLoad};
use crate::store::{IssueStore, SearchFilter};

/// Assigns a new issue to the assignee with the fewest open issues.
///
/// Never invents an owner: if no open issue is assigned and no team roster
/// is configured, the issue stays unassigned.
#[derive(Debug, Clone)]
pub struct WorkloadBalancer {
    team: Vec<TeamMember>,
    open: SearchFilter,
    page_size: usize,
}

impl WorkloadBalancer {
    pub fn new(rules: &RulesConfig) -> Self {
        Self {
            team: rules.team.clone(),
            open: SearchFilter::StatusNotIn(rules.terminal_statuses.clone()),
            page_size: rules.page_size,
        }
    }

    /// Open-task counts per assignee, in first-encountered order.
    ///
    /// Roster members come first with a zero count; unassigned issues are
    /// not counted.
    pub fn tally(&self, open_issues: &[Issue]) -> Vec<UserLoad> {
        let mut loads: Vec<UserLoad> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for member in &self.team {
            if !index.contains_key(&member.account_id) {
                index.insert(member.account_id.clone(), loads.len());
                loads.push(UserLoad::new(&member.account_id, &member.display_name));
            }
        }

        for issue in open_issues {
            let Some(ref user_id) = issue.fields.assignee_id else {
                continue;
            };
            let slot = *index.entry(user_id.clone()).or_insert_with(|| {
                let name = issue.fields.assignee_name.as_deref().unwrap_or(user_id);
                loads.push(UserLoad::new(user_id, name));
                loads.len() - 1
            });
            loads[slot].open_task_count += 1;
        }
        loads
    }

    /// Strict minimum; ties go to the first entry.
    pub fn pick(loads: &[UserLoad]) -> Option<&UserLoad> {
        loads.iter().min_by_key(|l| l.open_task_count)
    }

    pub async fn balance(&self, store: &dyn IssueStore, issue_id: &str) -> Result<usize> {
        let open_issues = store.search(&self.open, self.page_size).await?;
        let loads = self.tally(&open_issues);

        for load in &loads {
            debug!(
                user = %load.display_name,
                open_tasks = load.open_task_count,
                "current load"
            );
        }

        let Some(target) = Self::pick(&loads) else {
            info!(issue_id, "no assignees on open issues, leaving unassigned");
            return Ok(0);
        };

        store.set_assignee(issue_id, &target.user_id).await?;
        info!(
            issue_id,
            assignee = %target.display_name,
            open_tasks = target.open_task_count,
            "assigned to least loaded user"
        );
        Ok(1)
    }
}
