//! handler
//!
//! Correlates an alert event with a Backlog issue.
//!
//! # Flow
//!
//! 1. Derive the correlation keyword from the event id (empty without one).
//! 2. Search the project's issues of the configured type for the keyword.
//! 3. The first result whose description starts with the keyword is the
//!    tracked issue; later duplicates are ignored. An empty keyword never
//!    matches.
//! 4. Comment on the tracked issue (closing it on `CLOSED`), or create a
//!    new issue when there is none.
//!
//! Exactly one of create or update runs per event, and its raw response
//! body is the result. Nothing is retried and nothing falls back: a failed
//! search or update aborts the invocation.

use serde_json::Value;
use thiserror::Error;

use crate::backlog::{
    BacklogClient, CreateIssueRequest, IssueTracker, TrackerError, UpdateIssueRequest,
};
use crate::config::{get_configuration, BacklogConfig, ConfigError};
use crate::event::{correlation_keyword, AlertEvent, EventEnvelope};
use crate::secrets::SecretStore;

/// Errors that abort an invocation.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("tracker request failed: {0}")]
    Tracker(#[from] TrackerError),

    #[error("invalid event: {0}")]
    InvalidEvent(#[from] serde_json::Error),
}

/// Which operation ran, with the tracker's raw response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created { response: String },
    Updated { issue_id: String, response: String },
}

impl Outcome {
    pub fn response(&self) -> &str {
        match self {
            Outcome::Created { response } | Outcome::Updated { response, .. } => response,
        }
    }

    pub fn into_response(self) -> String {
        match self {
            Outcome::Created { response } | Outcome::Updated { response, .. } => response,
        }
    }
}

/// Create or update the issue tracking `event`.
pub async fn handle_event(
    tracker: &dyn IssueTracker,
    config: &BacklogConfig,
    event: &AlertEvent,
) -> Result<Outcome, HandlerError> {
    let keyword = correlation_keyword(event);
    tracing::info!(%keyword, "derived correlation keyword");
    tracing::info!(notified_user_ids = ?config.notified_user_ids);

    let issues = tracker
        .search_issues(&[config.issue_type_id.clone()], &keyword)
        .await?;
    tracing::info!(count = issues.len(), tracker = tracker.name(), "search_issues");

    if let Some(issue) = issues.iter().find(|issue| issue.is_tracked_by(&keyword)) {
        let response = tracker
            .update_issue(UpdateIssueRequest {
                issue_id: issue.id.clone(),
                close_status_id: config.close_status_id.clone(),
                event: event.clone(),
                notified_user_ids: config.notified_user_ids.clone(),
            })
            .await?;
        tracing::info!(issue_id = %issue.id, %response, "update_issue");
        return Ok(Outcome::Updated {
            issue_id: issue.id.clone(),
            response,
        });
    }

    let response = tracker
        .create_issue(CreateIssueRequest {
            keyword,
            project_id: config.project_id.clone(),
            issue_type_id: config.issue_type_id.clone(),
            priority_id: config.priority_id.clone(),
            event: event.clone(),
            assignee_id: Some(config.assignee_id.clone()).filter(|id| !id.is_empty()),
            notified_user_ids: config.notified_user_ids.clone(),
        })
        .await?;
    tracing::info!(%response, "create_issue");

    Ok(Outcome::Created { response })
}

/// Processes raw EventBridge payloads end to end.
///
/// The configuration bundle is loaded from the secret store on every call.
pub struct EventProcessor {
    store: Box<dyn SecretStore>,
    secret_name: String,
    api_base: Option<String>,
}

impl EventProcessor {
    pub fn new(store: Box<dyn SecretStore>, secret_name: impl Into<String>) -> Self {
        Self {
            store,
            secret_name: secret_name.into(),
            api_base: None,
        }
    }

    /// Send Backlog requests to `api_base` instead of `https://{domain}`.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Handle one payload, returning the create or update response body.
    pub async fn process(&self, payload: Value) -> Result<String, HandlerError> {
        tracing::info!(event = %payload, "received event");

        let config = get_configuration(self.store.as_ref(), &self.secret_name).await?;
        let tracker = match &self.api_base {
            Some(api_base) => BacklogClient::with_api_base(&config, api_base.as_str()),
            None => BacklogClient::new(&config),
        };

        let event = decode_event(payload).inspect_err(|e| {
            tracing::error!(error = %e, "failed to decode event");
        })?;

        let outcome = handle_event(&tracker, &config, &event).await?;
        Ok(outcome.into_response())
    }
}

fn decode_event(payload: Value) -> Result<AlertEvent, serde_json::Error> {
    let envelope: EventEnvelope = serde_json::from_value(payload)?;
    envelope.alert_event()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backlog::mock::{FailOn, MockOperation, MockTracker};
    use crate::backlog::Issue;
    use serde_json::json;

    fn config() -> BacklogConfig {
        BacklogConfig::from_secret_json(
            "test",
            r#"{
                "BACKLOG_DOMAIN": "example.backlog.com",
                "BACKLOG_API_KEY": "k",
                "BACKLOG_PROJECT_ID": "1",
                "BACKLOG_ISSUE_TYPE_ID": "2",
                "BACKLOG_ISSUE_PRIORITY_ID": "3",
                "BACKLOG_ISSUE_ASSIGNEE_ID": "4",
                "BACKLOG_ISSUE_CLOSE_STATUS_ID": "5",
                "BACKLOG_ISSUE_NOTIFIED_USER_IDS": "1,2,x,3"
            }"#,
        )
        .unwrap()
    }

    fn issue(id: &str, description: Option<&str>) -> Issue {
        Issue {
            id: id.into(),
            issue_key: None,
            summary: None,
            description: description.map(String::from),
            status: None,
        }
    }

    #[tokio::test]
    async fn searches_with_configured_type_and_keyword() {
        let tracker = MockTracker::new();
        let event = AlertEvent::from_value(json!({"id": "abc"})).unwrap();
        handle_event(&tracker, &config(), &event).await.unwrap();

        assert_eq!(
            tracker.operations()[0],
            MockOperation::SearchIssues {
                issue_type_ids: vec!["2".to_string()],
                keyword: "<issueId:abc>".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn first_matching_issue_wins() {
        let tracker = MockTracker::with_search_results(vec![
            issue("10", Some("mentions <issueId:abc> later")),
            issue("11", None),
            issue("12", Some("<issueId:abc>\n(Auto-updated)")),
            issue("13", Some("<issueId:abc>\n(Auto-updated)")),
        ]);
        let event = AlertEvent::from_value(json!({"id": "abc", "state": "ACTIVATED"})).unwrap();
        let outcome = handle_event(&tracker, &config(), &event).await.unwrap();

        assert!(matches!(outcome, Outcome::Updated { ref issue_id, .. } if issue_id == "12"));
        assert_eq!(tracker.updated().len(), 1);
        assert!(tracker.created().is_empty());
    }

    #[tokio::test]
    async fn no_id_always_creates() {
        let tracker =
            MockTracker::with_search_results(vec![issue("10", Some("anything at all"))]);
        let event = AlertEvent::from_value(json!({"title": "T", "state": "ACTIVATED"})).unwrap();
        let outcome = handle_event(&tracker, &config(), &event).await.unwrap();

        assert!(matches!(outcome, Outcome::Created { .. }));
        let created = tracker.created();
        assert_eq!(created[0].keyword, "");
        assert_eq!(created[0].assignee_id.as_deref(), Some("4"));
        assert_eq!(created[0].notified_user_ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn null_assignee_creates_unassigned() {
        let config = BacklogConfig::from_secret_json(
            "test",
            r#"{
                "BACKLOG_DOMAIN": "example.backlog.com",
                "BACKLOG_API_KEY": "k",
                "BACKLOG_PROJECT_ID": "1",
                "BACKLOG_ISSUE_TYPE_ID": "2",
                "BACKLOG_ISSUE_PRIORITY_ID": "3",
                "BACKLOG_ISSUE_ASSIGNEE_ID": null,
                "BACKLOG_ISSUE_CLOSE_STATUS_ID": "5"
            }"#,
        )
        .unwrap();
        let tracker = MockTracker::new();
        let event = AlertEvent::from_value(json!({"id": "abc", "title": "T"})).unwrap();
        handle_event(&tracker, &config, &event).await.unwrap();

        let created = tracker.created();
        assert_eq!(created[0].assignee_id, None);
        assert!(!created[0].form().iter().any(|(key, _)| *key == "assigneeId"));
    }

    #[tokio::test]
    async fn falsy_id_creates_without_matching() {
        let tracker = MockTracker::with_search_results(vec![issue("10", Some("<issueId:0>"))]);
        let event = AlertEvent::from_value(json!({"id": 0, "state": "ACTIVATED"})).unwrap();
        let outcome = handle_event(&tracker, &config(), &event).await.unwrap();

        assert!(matches!(outcome, Outcome::Created { .. }));
        assert_eq!(tracker.created()[0].keyword, "");
        assert!(tracker.updated().is_empty());
    }

    #[tokio::test]
    async fn search_failure_aborts_before_create() {
        let tracker = MockTracker::new()
            .fail_on(FailOn::SearchIssues(TrackerError::Decode("bad".into())));
        let event = AlertEvent::from_value(json!({"id": "abc"})).unwrap();
        let err = handle_event(&tracker, &config(), &event).await.unwrap_err();

        assert!(matches!(err, HandlerError::Tracker(TrackerError::Decode(_))));
        assert_eq!(tracker.operations().len(), 1);
    }

    #[tokio::test]
    async fn update_failure_does_not_fall_back_to_create() {
        let tracker = MockTracker::with_search_results(vec![issue("12", Some("<issueId:abc>"))])
            .fail_on(FailOn::UpdateIssue(TrackerError::Api {
                status: 500,
                message: "boom".into(),
            }));
        let event = AlertEvent::from_value(json!({"id": "abc"})).unwrap();
        let err = handle_event(&tracker, &config(), &event).await.unwrap_err();

        assert!(matches!(err, HandlerError::Tracker(TrackerError::Api { status: 500, .. })));
        assert!(tracker.created().is_empty());
    }

    #[test]
    fn outcome_response() {
        let outcome = Outcome::Updated {
            issue_id: "1".into(),
            response: "{}".into(),
        };
        assert_eq!(outcome.response(), "{}");
        assert_eq!(outcome.into_response(), "{}");
    }

    #[test]
    fn decode_event_rejects_non_object_detail() {
        assert!(decode_event(json!({"detail": "text"})).is_err());
        assert!(decode_event(json!({})).is_ok());
    }
}
