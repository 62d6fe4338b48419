//! backlog::mock
//!
//! Mock issue tracker for deterministic testing.
//!
//! # Design
//!
//! The mock returns a configured search result verbatim (Backlog's keyword
//! search is full-text, so it may well return issues that do not actually
//! start with the keyword) and records every call. Create and update answer
//! with a small JSON document echoing what was sent.
//!
//! # Example
//!
//! ```
//! use nr2backlog::backlog::mock::MockTracker;
//! use nr2backlog::backlog::IssueTracker;
//!
//! # tokio_test::block_on(async {
//! let tracker = MockTracker::new();
//! let issues = tracker.search_issues(&["2".to_string()], "<issueId:a>").await.unwrap();
//! assert!(issues.is_empty());
//! assert_eq!(tracker.operations().len(), 1);
//! # });
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use super::traits::{CreateIssueRequest, Issue, IssueTracker, TrackerError, UpdateIssueRequest};

/// Mock issue tracker for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockTracker {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockTrackerInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockTrackerInner {
    /// Issues returned by every search.
    search_results: Vec<Issue>,
    /// Id assigned to the next created issue.
    next_issue_id: u64,
    /// Method to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    SearchIssues(TrackerError),
    CreateIssue(TrackerError),
    UpdateIssue(TrackerError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    SearchIssues {
        issue_type_ids: Vec<String>,
        keyword: String,
    },
    CreateIssue(CreateIssueRequest),
    UpdateIssue(UpdateIssueRequest),
}

impl MockTracker {
    /// Create a mock whose searches find nothing.
    pub fn new() -> Self {
        Self::with_search_results(Vec::new())
    }

    /// Create a mock whose searches return `issues` in the given order.
    pub fn with_search_results(issues: Vec<Issue>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockTrackerInner {
                search_results: issues,
                next_issue_id: 1,
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Recorded create requests.
    pub fn created(&self) -> Vec<CreateIssueRequest> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                MockOperation::CreateIssue(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Recorded update requests.
    pub fn updated(&self) -> Vec<UpdateIssueRequest> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                MockOperation::UpdateIssue(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    /// Check if we should fail and return the error if so.
    fn check_fail(&self, expected: &str) -> Option<TrackerError> {
        let inner = self.inner.lock().unwrap();
        match &inner.fail_on {
            Some(FailOn::SearchIssues(e)) if expected == "search_issues" => Some(e.clone()),
            Some(FailOn::CreateIssue(e)) if expected == "create_issue" => Some(e.clone()),
            Some(FailOn::UpdateIssue(e)) if expected == "update_issue" => Some(e.clone()),
            _ => None,
        }
    }
}

impl Default for MockTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn search_issues(
        &self,
        issue_type_ids: &[String],
        keyword: &str,
    ) -> Result<Vec<Issue>, TrackerError> {
        self.record(MockOperation::SearchIssues {
            issue_type_ids: issue_type_ids.to_vec(),
            keyword: keyword.to_string(),
        });

        if let Some(e) = self.check_fail("search_issues") {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        Ok(inner.search_results.clone())
    }

    async fn create_issue(&self, request: CreateIssueRequest) -> Result<String, TrackerError> {
        self.record(MockOperation::CreateIssue(request.clone()));

        if let Some(e) = self.check_fail("create_issue") {
            return Err(e);
        }

        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_issue_id;
        inner.next_issue_id += 1;

        Ok(json!({
            "id": id,
            "summary": request.summary(),
            "description": request.description(),
        })
        .to_string())
    }

    async fn update_issue(&self, request: UpdateIssueRequest) -> Result<String, TrackerError> {
        self.record(MockOperation::UpdateIssue(request.clone()));

        if let Some(e) = self.check_fail("update_issue") {
            return Err(e);
        }

        Ok(json!({
            "id": request.issue_id,
            "comment": request.comment(),
            "statusId": request.status_id(),
        })
        .to_string())
    }
}
