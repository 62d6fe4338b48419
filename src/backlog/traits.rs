//! backlog::traits
//!
//! Issue tracker trait definition and request/response types.
//!
//! # Design
//!
//! The `IssueTracker` trait is async because every operation is a network
//! round trip. Create and update return the tracker's raw response body:
//! the handler hands that text back to its caller unparsed.
//!
//! Requests carry the alert event rather than pre-rendered text. The
//! rendered summary, description, comment and form fields are derived from
//! the request on demand, so every tracker implementation (including the
//! mock) observes the same encoding.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::event::AlertEvent;
use crate::render;

/// Errors from issue tracker operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// An issue as returned by the tracker's search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(deserialize_with = "crate::config::id_text")]
    pub id: String,
    #[serde(default)]
    pub issue_key: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Backlog returns `null` for issues without a description
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<IssueStatus>,
}

impl Issue {
    /// Whether this issue is tracked under `keyword`.
    ///
    /// An empty keyword never matches.
    pub fn is_tracked_by(&self, keyword: &str) -> bool {
        !keyword.is_empty()
            && self
                .description
                .as_deref()
                .is_some_and(|d| d.starts_with(keyword))
    }
}

/// Issue status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueStatus {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Request to create an issue for an alert.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIssueRequest {
    /// Correlation keyword, written as the first description line
    pub keyword: String,
    pub project_id: String,
    pub issue_type_id: String,
    pub priority_id: String,
    pub event: AlertEvent,
    /// Omitted from the request when `None`
    pub assignee_id: Option<String>,
    /// Omitted from the request when empty
    pub notified_user_ids: Vec<i64>,
}

impl CreateIssueRequest {
    /// `[{state}] {title}`
    pub fn summary(&self) -> String {
        render::summary(&self.event)
    }

    pub fn description(&self) -> String {
        render::description(&self.keyword, &self.event)
    }

    /// Form fields in the order they are sent.
    pub fn form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("projectId", self.project_id.clone()),
            ("summary", self.summary()),
            ("issueTypeId", self.issue_type_id.clone()),
            ("priorityId", self.priority_id.clone()),
            ("description", self.description()),
        ];
        if let Some(assignee_id) = self.assignee_id.as_ref().filter(|id| !id.is_empty()) {
            form.push(("assigneeId", assignee_id.clone()));
        }
        push_notified_users(&mut form, &self.notified_user_ids);
        form
    }
}

/// Request to comment on (and possibly close) a tracked issue.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateIssueRequest {
    pub issue_id: String,
    /// Status applied when the event state is `CLOSED`
    pub close_status_id: String,
    pub event: AlertEvent,
    /// Omitted from the request when empty
    pub notified_user_ids: Vec<i64>,
}

impl UpdateIssueRequest {
    pub fn comment(&self) -> String {
        render::comment(&self.event)
    }

    /// The status to set, if this update closes the issue.
    pub fn status_id(&self) -> Option<&str> {
        self.event
            .is_closed()
            .then_some(self.close_status_id.as_str())
    }

    /// Form fields in the order they are sent.
    pub fn form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![("comment", self.comment())];
        if let Some(status_id) = self.status_id() {
            form.push(("statusId", status_id.to_string()));
        }
        push_notified_users(&mut form, &self.notified_user_ids);
        form
    }
}

fn push_notified_users(form: &mut Vec<(&'static str, String)>, ids: &[i64]) {
    form.extend(ids.iter().map(|id| ("notifiedUserId[]", id.to_string())));
}

/// The IssueTracker trait for interacting with a remote issue tracker.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`.
///
/// # Error Handling
///
/// All methods return `Result<T, TrackerError>`. Nothing is retried; any
/// error aborts the invocation.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Get the tracker name (e.g., "backlog").
    fn name(&self) -> &'static str;

    /// List the project's issues of the given types matching `keyword`,
    /// newest first, at most 100.
    async fn search_issues(
        &self,
        issue_type_ids: &[String],
        keyword: &str,
    ) -> Result<Vec<Issue>, TrackerError>;

    /// Create an issue, returning the raw response body.
    async fn create_issue(&self, request: CreateIssueRequest) -> Result<String, TrackerError>;

    /// Update an issue, returning the raw response body.
    async fn update_issue(&self, request: UpdateIssueRequest) -> Result<String, TrackerError>;
}
