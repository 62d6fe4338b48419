//! HTTP-level tests for the Backlog client, run against a wiremock server.

use nr2backlog::backlog::{
    BacklogClient, CreateIssueRequest, IssueTracker, TrackerError, UpdateIssueRequest,
};
use nr2backlog::config::BacklogConfig;
use nr2backlog::event::AlertEvent;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn config() -> BacklogConfig {
    BacklogConfig::from_secret_json(
        "test",
        r#"{
            "BACKLOG_DOMAIN": "example.backlog.com",
            "BACKLOG_API_KEY": "dummy_api_key",
            "BACKLOG_PROJECT_ID": "1",
            "BACKLOG_ISSUE_TYPE_ID": "2",
            "BACKLOG_ISSUE_PRIORITY_ID": "3",
            "BACKLOG_ISSUE_ASSIGNEE_ID": "4",
            "BACKLOG_ISSUE_CLOSE_STATUS_ID": "5",
            "BACKLOG_ISSUE_NOTIFIED_USER_IDS": "1,2,3"
        }"#,
    )
    .unwrap()
}

fn event(detail: serde_json::Value) -> AlertEvent {
    AlertEvent::from_value(detail).unwrap()
}

/// Decode a form-encoded request body into ordered pairs.
fn form_pairs(request: &Request) -> Vec<(String, String)> {
    let body = String::from_utf8(request.body.clone()).unwrap();
    reqwest::Url::parse(&format!("http://form.invalid/?{}", body))
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn values<'a>(pairs: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    pairs
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .collect()
}

async fn single_request(server: &MockServer) -> Request {
    let mut requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    requests.remove(0)
}

mod search {
    use super::*;

    #[tokio::test]
    async fn sends_filters_and_decodes_issues() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/issues"))
            .and(query_param("apiKey", "dummy_api_key"))
            .and(query_param("projectId[]", "1"))
            .and(query_param("issueTypeId[]", "2"))
            .and(query_param("sort", "created"))
            .and(query_param("order", "desc"))
            .and(query_param("count", "100"))
            .and(query_param("keyword", "<issueId:abc>"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 12345678, "summary": "[ACTIVATED] T", "description": "<issueId:abc>\n(Auto-updated)"},
                {"id": 12345677, "summary": "other", "description": null}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = BacklogClient::with_api_base(&config(), server.uri());
        let issues = client
            .search_issues(&["2".to_string()], "<issueId:abc>")
            .await
            .unwrap();

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].id, "12345678");
        assert!(issues[0].is_tracked_by("<issueId:abc>"));
        assert!(issues[1].description.is_none());
    }

    #[tokio::test]
    async fn empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/issues"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = BacklogClient::with_api_base(&config(), server.uri());
        let issues = client.search_issues(&["2".to_string()], "").await.unwrap();
        assert!(issues.is_empty());

        let request = single_request(&server).await;
        let keyword: Vec<String> = request
            .url
            .query_pairs()
            .filter(|(k, _)| k == "keyword")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(keyword, vec![String::new()]);
    }

    #[tokio::test]
    async fn undecodable_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/issues"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = BacklogClient::with_api_base(&config(), server.uri());
        let err = client.search_issues(&[], "k").await.unwrap_err();
        assert!(matches!(err, TrackerError::Decode(_)));
    }

    #[tokio::test]
    async fn error_status_carries_backlog_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/issues"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "errors": [{"message": "Authentication failure.", "code": 11, "moreInfo": ""}]
            })))
            .mount(&server)
            .await;

        let client = BacklogClient::with_api_base(&config(), server.uri());
        let err = client.search_issues(&[], "k").await.unwrap_err();
        assert_eq!(
            err,
            TrackerError::Api {
                status: 401,
                message: "Authentication failure.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn network_error_hides_api_key() {
        // Nothing listens on port 1.
        let client = BacklogClient::with_api_base(&config(), "http://127.0.0.1:1");
        let err = client.search_issues(&[], "k").await.unwrap_err();
        assert!(matches!(err, TrackerError::Network(_)));
        assert!(!err.to_string().contains("dummy_api_key"));
    }
}

mod create {
    use super::*;

    fn request() -> CreateIssueRequest {
        CreateIssueRequest {
            keyword: "<issueId:abc>".to_string(),
            project_id: "1".to_string(),
            issue_type_id: "2".to_string(),
            priority_id: "3".to_string(),
            event: event(json!({"id": "abc", "title": "T", "state": "ACTIVATED"})),
            assignee_id: Some("4".to_string()),
            notified_user_ids: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn posts_form_and_returns_raw_body() {
        let server = MockServer::start().await;
        let raw = r#"{"id":12345678,"summary":"[ACTIVATED] T"}"#;
        Mock::given(method("POST"))
            .and(path("/api/v2/issues"))
            .and(query_param("apiKey", "dummy_api_key"))
            .respond_with(ResponseTemplate::new(201).set_body_string(raw))
            .expect(1)
            .mount(&server)
            .await;

        let client = BacklogClient::with_api_base(&config(), server.uri());
        let response = client.create_issue(request()).await.unwrap();
        assert_eq!(response, raw);

        let sent = single_request(&server).await;
        assert_eq!(
            sent.headers
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("application/x-www-form-urlencoded")
        );
        let pairs = form_pairs(&sent);
        assert_eq!(values(&pairs, "projectId"), vec!["1"]);
        assert_eq!(values(&pairs, "summary"), vec!["[ACTIVATED] T"]);
        assert_eq!(values(&pairs, "issueTypeId"), vec!["2"]);
        assert_eq!(values(&pairs, "priorityId"), vec!["3"]);
        assert_eq!(values(&pairs, "assigneeId"), vec!["4"]);
        assert_eq!(values(&pairs, "notifiedUserId[]"), vec!["1", "2", "3"]);

        let description = values(&pairs, "description");
        assert!(description[0].starts_with("<issueId:abc>\n(Auto-updated)\n"));
        assert!(description[0].contains("\n# T\n"));
        assert!(description[0].contains("state: ACTIVATED"));
    }

    #[tokio::test]
    async fn omits_empty_optionals() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/issues"))
            .respond_with(ResponseTemplate::new(201).set_body_string("{}"))
            .mount(&server)
            .await;

        let client = BacklogClient::with_api_base(&config(), server.uri());
        let mut request = request();
        request.assignee_id = None;
        request.notified_user_ids.clear();
        client.create_issue(request).await.unwrap();

        let pairs = form_pairs(&single_request(&server).await);
        assert!(values(&pairs, "assigneeId").is_empty());
        assert!(values(&pairs, "notifiedUserId[]").is_empty());
    }

    #[tokio::test]
    async fn error_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/issues"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errors": [{"message": "Invalid priorityId.", "code": 7}]
            })))
            .mount(&server)
            .await;

        let client = BacklogClient::with_api_base(&config(), server.uri());
        let err = client.create_issue(request()).await.unwrap_err();
        assert_eq!(
            err,
            TrackerError::Api {
                status: 400,
                message: "Invalid priorityId.".to_string()
            }
        );
    }
}

mod update {
    use super::*;

    fn request(state: &str) -> UpdateIssueRequest {
        UpdateIssueRequest {
            issue_id: "12345678".to_string(),
            close_status_id: "5".to_string(),
            event: event(json!({
                "id": "abc",
                "state": state,
                "trigger": "INCIDENT_CLOSED",
                "updatedAt": 1723972836888u64
            })),
            notified_user_ids: vec![1],
        }
    }

    #[tokio::test]
    async fn closed_event_sets_status() {
        let server = MockServer::start().await;
        let raw = r#"{"id":12345678,"status":{"id":5}}"#;
        Mock::given(method("PATCH"))
            .and(path("/api/v2/issues/12345678"))
            .and(query_param("apiKey", "dummy_api_key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(raw))
            .expect(1)
            .mount(&server)
            .await;

        let client = BacklogClient::with_api_base(&config(), server.uri());
        let response = client.update_issue(request("CLOSED")).await.unwrap();
        assert_eq!(response, raw);

        let pairs = form_pairs(&single_request(&server).await);
        assert_eq!(values(&pairs, "statusId"), vec!["5"]);
        assert_eq!(values(&pairs, "notifiedUserId[]"), vec!["1"]);
        assert_eq!(
            values(&pairs, "comment"),
            vec!["(Auto-updated)\nupdated at: 2024-08-18 18:20:36\nstate: CLOSED\ntrigger: INCIDENT_CLOSED"]
        );
    }

    #[tokio::test]
    async fn open_event_only_comments() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/v2/issues/12345678"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let client = BacklogClient::with_api_base(&config(), server.uri());
        client.update_issue(request("ACTIVATED")).await.unwrap();

        let pairs = form_pairs(&single_request(&server).await);
        assert!(values(&pairs, "statusId").is_empty());
        assert_eq!(values(&pairs, "comment").len(), 1);
    }

    #[tokio::test]
    async fn missing_issue_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "errors": [{"message": "No issue.", "code": 6}]
            })))
            .mount(&server)
            .await;

        let client = BacklogClient::with_api_base(&config(), server.uri());
        let err = client.update_issue(request("CLOSED")).await.unwrap_err();
        assert!(matches!(err, TrackerError::Api { status: 404, .. }));
    }
}
