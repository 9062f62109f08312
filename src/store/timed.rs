//! Deadline decorator for any [`IssueStore`].
//!
//! Each call is bounded by the same timeout. An expired call surfaces as
//! [`Error::Timeout`], which rules treat as a retryable, rule-local failure.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use opentelemetry::KeyValue;

use super::{FieldPatch, IssueStore, SearchFilter};
use crate::error::{Error, Result};
use crate::model::Issue;
use crate::telemetry::metrics;

pub struct TimedStore {
    inner: Arc<dyn IssueStore>,
    timeout: Duration,
}

impl TimedStore {
    pub fn new(inner: Arc<dyn IssueStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.timeout)),
        };

        let label = match &result {
            Ok(_) => "ok",
            Err(Error::NotFound(_)) => "not_found",
            Err(Error::Timeout(_)) => "timeout",
            Err(_) => "error",
        };
        metrics::tracker_calls().add(
            1,
            &[
                KeyValue::new("operation", operation),
                KeyValue::new("result", label),
            ],
        );
        metrics::tracker_call_duration_ms().record(
            start.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("operation", operation)],
        );
        result
    }
}

#[async_trait]
impl IssueStore for TimedStore {
    async fn get(&self, id: &str) -> Result<Issue> {
        self.call("get", self.inner.get(id)).await
    }

    async fn search(&self, filter: &SearchFilter, max_results: usize) -> Result<Vec<Issue>> {
        self.call("search", self.inner.search(filter, max_results))
            .await
    }

    async fn update_fields(&self, id: &str, patch: &FieldPatch) -> Result<()> {
        self.call("update_fields", self.inner.update_fields(id, patch))
            .await
    }

    async fn transition(&self, id: &str, transition_id: &str) -> Result<()> {
        self.call("transition", self.inner.transition(id, transition_id))
            .await
    }

    async fn set_assignee(&self, id: &str, account_id: &str) -> Result<()> {
        self.call("set_assignee", self.inner.set_assignee(id, account_id))
            .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.call("delete", self.inner.delete(id)).await
    }
}
