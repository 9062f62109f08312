//! Jira Cloud REST v3 client.
//!
//! Shared `reqwest::Client` with basic auth (account email + API token).
//! Status codes map onto the crate error taxonomy: 404 is `NotFound`,
//! 401/403 is `Unauthorized`, anything else unsuccessful is `Transport`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use super::{FieldPatch, IssueStore, SearchFilter};
use crate::error::{Error, Result, truncate};
use crate::model::Issue;
use crate::model::wire::{RawIssue, RawSearch};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tracker handle. Owns the HTTP connection pool.
#[derive(Clone)]
pub struct HttpIssueStore {
    base_url: String,
    email: String,
    api_token: SecretString,
    client: reqwest::Client,
}

impl HttpIssueStore {
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        api_token: SecretString,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self {
            base_url: base_url.into(),
            email: email.into(),
            api_token,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/api/3/{path}", self.base_url.trim_end_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .basic_auth(&self.email, Some(self.api_token.expose_secret()))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn send(&self, what: &str, id: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| transport_error(what, e))?;
        let status = response.status();
        debug!(operation = what, issue_id = id, %status, "tracker responded");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, what, id, &body))
    }
}

fn transport_error(what: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(DEFAULT_REQUEST_TIMEOUT)
    } else {
        Error::Transport(format!("{what} request failed: {e}"))
    }
}

fn status_error(status: StatusCode, what: &str, id: &str, body: &str) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(id.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Unauthorized(format!("{what} returned {status}"))
        }
        _ => Error::Transport(format!("{what} returned {status}: {}", truncate(body, 200))),
    }
}

#[async_trait]
impl IssueStore for HttpIssueStore {
    async fn get(&self, id: &str) -> Result<Issue> {
        let response = self
            .send("get", id, self.request(Method::GET, &format!("issue/{id}")))
            .await?;
        let raw: RawIssue = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("invalid issue payload for {id}: {e}")))?;
        raw.into_issue()
    }

    async fn search(&self, filter: &SearchFilter, max_results: usize) -> Result<Vec<Issue>> {
        let request = self.request(Method::GET, "search").query(&[
            ("jql", filter.jql()),
            ("maxResults", max_results.to_string()),
        ]);
        let response = self.send("search", "-", request).await?;
        let raw: RawSearch = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("invalid search payload: {e}")))?;
        raw.issues.into_iter().map(RawIssue::into_issue).collect()
    }

    async fn update_fields(&self, id: &str, patch: &FieldPatch) -> Result<()> {
        let request = self
            .request(Method::PUT, &format!("issue/{id}"))
            .json(&patch.to_body());
        self.send("update_fields", id, request).await?;
        Ok(())
    }

    async fn transition(&self, id: &str, transition_id: &str) -> Result<()> {
        let request = self
            .request(Method::POST, &format!("issue/{id}/transitions"))
            .json(&json!({ "transition": { "id": transition_id } }));
        self.send("transition", id, request).await?;
        Ok(())
    }

    async fn set_assignee(&self, id: &str, account_id: &str) -> Result<()> {
        let request = self
            .request(Method::PUT, &format!("issue/{id}/assignee"))
            .json(&json!({ "accountId": account_id }));
        self.send("set_assignee", id, request).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.send("delete", id, self.request(Method::DELETE, &format!("issue/{id}")))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base: &str) -> HttpIssueStore {
        HttpIssueStore::new(base, "bot@example.com", SecretString::from("token")).unwrap()
    }

    #[test]
    fn url_joins_without_double_slash() {
        assert_eq!(
            store("https://acme.atlassian.net/").url("issue/10"),
            "https://acme.atlassian.net/rest/api/3/issue/10"
        );
    }

    #[test]
    fn status_codes_map_to_error_kinds() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "get", "10", ""),
            Error::NotFound(id) if id == "10"
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "delete", "10", ""),
            Error::Unauthorized(_)
        ));
        let err = status_error(StatusCode::BAD_GATEWAY, "search", "-", "upstream");
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.is_retryable());
    }
}
