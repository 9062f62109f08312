//! Duplicate detection and removal among open issues.
//!
//! Issues with the same [`DuplicateKey`] form a cluster. The first member in
//! page order is kept; every other member is deleted. Only ids collected
//! into a cluster are ever deleted.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::config::RulesConfig;
use crate::error::Result;
use crate::model::{DuplicateKey, Issue};
use crate::store::{IssueStore, SearchFilter};

/// Issues sharing one duplicate key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Kept.
    pub canonical: String,
    /// Deleted, in page order.
    pub duplicates: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DuplicateReconciler {
    open: SearchFilter,
    page_size: usize,
}

impl DuplicateReconciler {
    pub fn new(rules: &RulesConfig) -> Self {
        Self {
            open: SearchFilter::StatusNotIn(rules.terminal_statuses.clone()),
            page_size: rules.page_size,
        }
    }

    /// Group `issues` into clusters of two or more distinct ids, in order of
    /// first appearance. Repeated ids on the page count once.
    pub fn clusters(issues: &[Issue]) -> Vec<Cluster> {
        let mut groups: Vec<Vec<&str>> = Vec::new();
        let mut by_key: HashMap<DuplicateKey, usize> = HashMap::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for issue in issues {
            if !seen.insert(issue.id.as_str()) {
                continue;
            }
            let key = issue.fields.duplicate_key();
            match by_key.get(&key) {
                Some(&slot) => groups[slot].push(issue.id.as_str()),
                None => {
                    by_key.insert(key, groups.len());
                    groups.push(vec![issue.id.as_str()]);
                }
            }
        }

        groups
            .into_iter()
            .filter(|g| g.len() > 1)
            .map(|g| Cluster {
                canonical: g[0].to_string(),
                duplicates: g[1..].iter().map(|id| id.to_string()).collect(),
            })
            .collect()
    }

    /// Delete every non-canonical member of every cluster.
    ///
    /// Returns the number of deletions. A failed delete is logged and the
    /// remaining ids are still attempted.
    pub async fn reconcile(&self, store: &dyn IssueStore) -> Result<usize> {
        let issues = store.search(&self.open, self.page_size).await?;
        let mut deleted = 0;

        for cluster in Self::clusters(&issues) {
            info!(
                canonical = %cluster.canonical,
                duplicates = ?cluster.duplicates,
                "duplicate cluster found"
            );
            for id in &cluster.duplicates {
                match store.delete(id).await {
                    Ok(()) => {
                        info!(issue_id = %id, canonical = %cluster.canonical, "deleted duplicate");
                        deleted += 1;
                    }
                    Err(e) => warn!(issue_id = %id, error = %e, "failed to delete duplicate"),
                }
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IssueFields;

    fn issue(id: &str, summary: &str) -> Issue {
        Issue::new(
            id,
            IssueFields::default()
                .issue_type("Task")
                .summary(summary)
                .priority("Medium"),
        )
    }

    #[test]
    fn separate_clusters_each_keep_one() {
        let issues = vec![
            issue("1", "a"),
            issue("2", "b"),
            issue("3", "a"),
            issue("4", "b"),
            issue("5", "c"),
        ];
        let clusters = DuplicateReconciler::clusters(&issues);
        assert_eq!(
            clusters,
            vec![
                Cluster {
                    canonical: "1".into(),
                    duplicates: vec!["3".into()]
                },
                Cluster {
                    canonical: "2".into(),
                    duplicates: vec!["4".into()]
                },
            ]
        );
    }

    #[test]
    fn same_id_twice_is_not_a_duplicate() {
        let issues = vec![issue("1", "a"), issue("1", "a")];
        assert!(DuplicateReconciler::clusters(&issues).is_empty());
    }

    #[test]
    fn description_whitespace_is_normalized() {
        let a = Issue::new("1", IssueFields::default().summary("x").description("boom "));
        let b = Issue::new("2", IssueFields::default().summary("x").description(" boom"));
        assert_eq!(DuplicateReconciler::clusters(&[a, b]).len(), 1);
    }
}
