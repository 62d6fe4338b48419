//! backlog::client
//!
//! Backlog REST API v2 client.
//!
//! # Design
//!
//! This module implements the `IssueTracker` trait for Backlog. Three
//! endpoints are used:
//! - `GET /api/v2/issues` to find the issue tracking an alert
//! - `POST /api/v2/issues` to add an issue
//! - `PATCH /api/v2/issues/{id}` to comment on and optionally close it
//!
//! # Authentication
//!
//! Backlog API keys travel as the `apiKey` query parameter on every
//! request. Transport errors are rendered without their URL so the key
//! never reaches logs or error messages.
//!
//! # Example
//!
//! ```ignore
//! use nr2backlog::backlog::{BacklogClient, IssueTracker};
//!
//! let client = BacklogClient::new(&config);
//! let issues = client
//!     .search_issues(&[config.issue_type_id.clone()], "<issueId:abc>")
//!     .await?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use super::traits::{CreateIssueRequest, Issue, IssueTracker, TrackerError, UpdateIssueRequest};
use crate::config::BacklogConfig;

/// Maximum number of issues requested by a search (Backlog's own cap).
pub const SEARCH_COUNT: u32 = 100;

/// Backlog issue tracker client.
pub struct BacklogClient {
    /// HTTP client for making requests
    client: Client,
    /// Configuration bundle (domain, key, project and issue ids)
    config: BacklogConfig,
    /// API base URL, `https://{domain}` unless overridden
    api_base: String,
}

// Custom Debug so the bundle's own redaction applies
impl std::fmt::Debug for BacklogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacklogClient")
            .field("config", &self.config)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl BacklogClient {
    /// Create a client for the space named by `config.domain`.
    pub fn new(config: &BacklogConfig) -> Self {
        Self::with_api_base(config, format!("https://{}", config.domain))
    }

    /// Create a client against a custom base URL (used by tests).
    pub fn with_api_base(config: &BacklogConfig, api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            config: config.clone(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build an issues endpoint URL. `path` is appended verbatim.
    fn issues_url(&self, path: &str) -> String {
        format!("{}/api/v2/issues{}", self.api_base, path)
    }

    /// Attach the API key and send.
    async fn send(&self, request: RequestBuilder) -> Result<Response, TrackerError> {
        request
            .query(&[("apiKey", self.config.api_key())])
            .send()
            .await
            .map_err(|e| TrackerError::Network(e.without_url().to_string()))
    }

    /// Read a response body, mapping non-success statuses to errors.
    async fn read_body(response: Response) -> Result<String, TrackerError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TrackerError::Network(e.without_url().to_string()))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(TrackerError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            })
        }
    }

    /// Query parameters for an issue search, without the API key.
    fn search_params(&self, issue_type_ids: &[String], keyword: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("projectId[]", self.config.project_id.clone()),
            ("sort", "created".to_string()),
            ("order", "desc".to_string()),
            ("count", SEARCH_COUNT.to_string()),
        ];
        params.extend(
            issue_type_ids
                .iter()
                .map(|id| ("issueTypeId[]", id.clone())),
        );
        params.push(("keyword", keyword.to_string()));
        params
    }
}

/// Pull the first message out of a Backlog error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<BacklogErrorResponse>(body)
        .ok()
        .and_then(|r| r.errors.into_iter().next())
        .map(|e| e.message)
        .unwrap_or_else(|| "Unknown error".to_string())
}

#[async_trait]
impl IssueTracker for BacklogClient {
    fn name(&self) -> &'static str {
        "backlog"
    }

    async fn search_issues(
        &self,
        issue_type_ids: &[String],
        keyword: &str,
    ) -> Result<Vec<Issue>, TrackerError> {
        let params = self.search_params(issue_type_ids, keyword);
        tracing::info!(?params, "searching issues");

        let result = async {
            let response = self
                .send(self.client.get(self.issues_url("")).query(&params))
                .await?;
            let body = Self::read_body(response).await?;
            serde_json::from_str::<Vec<Issue>>(&body).map_err(|e| TrackerError::Decode(e.to_string()))
        }
        .await;

        if let Err(ref e) = result {
            tracing::error!(error = %e, "search_issues failed");
        }
        result
    }

    async fn create_issue(&self, request: CreateIssueRequest) -> Result<String, TrackerError> {
        let form = request.form();
        tracing::info!(?form, "creating issue");

        let result = async {
            let response = self
                .send(self.client.post(self.issues_url("")).form(&form))
                .await?;
            Self::read_body(response).await
        }
        .await;

        if let Err(ref e) = result {
            tracing::error!(error = %e, "create_issue failed");
        }
        result
    }

    async fn update_issue(&self, request: UpdateIssueRequest) -> Result<String, TrackerError> {
        let form = request.form();
        tracing::info!(issue_id = %request.issue_id, ?form, "updating issue");

        let url = self.issues_url(&format!("/{}", request.issue_id));
        let result = async {
            let response = self.send(self.client.patch(url).form(&form)).await?;
            Self::read_body(response).await
        }
        .await;

        if let Err(ref e) = result {
            tracing::error!(issue_id = %request.issue_id, error = %e, "update_issue failed");
        }
        result
    }
}

/// Backlog error response format.
#[derive(Deserialize)]
struct BacklogErrorResponse {
    errors: Vec<BacklogError>,
}

/// A single Backlog error entry.
#[derive(Deserialize)]
struct BacklogError {
    message: String,
}
