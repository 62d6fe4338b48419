//! config
//!
//! The Backlog configuration bundle.
//!
//! # Overview
//!
//! All settings live in a single secret whose value is a JSON object:
//!
//! | Key                               | Required | Meaning                         |
//! |-----------------------------------|----------|---------------------------------|
//! | `BACKLOG_DOMAIN`                  | yes      | Space host, e.g. `x.backlog.com` |
//! | `BACKLOG_API_KEY`                 | yes      | API key sent on every request   |
//! | `BACKLOG_PROJECT_ID`              | yes      | Project issues are filed in     |
//! | `BACKLOG_ISSUE_TYPE_ID`           | yes      | Issue type to create and search |
//! | `BACKLOG_ISSUE_PRIORITY_ID`       | yes      | Priority of created issues      |
//! | `BACKLOG_ISSUE_ASSIGNEE_ID`       | no       | Assignee of created issues      |
//! | `BACKLOG_ISSUE_CLOSE_STATUS_ID`   | yes      | Status set on `CLOSED` events   |
//! | `BACKLOG_ISSUE_NOTIFIED_USER_IDS` | no       | Comma-separated user ids        |
//!
//! ID values may be JSON strings or numbers. The only process-level setting
//! is `SECRET_NAME`, naming the secret to load.
//!
//! The bundle is re-read on every invocation; nothing is cached.

use serde::Deserialize;
use thiserror::Error;

use crate::secrets::{SecretError, SecretStore};

/// Environment variable naming the secret that holds the bundle.
pub const SECRET_NAME_VAR: &str = "SECRET_NAME";

/// Errors from loading configuration. All of them abort the invocation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("secret store error: {0}")]
    SecretStore(#[from] SecretError),

    #[error("secret '{0}' not found")]
    SecretNotFound(String),

    #[error("secret '{name}' is malformed: {message}")]
    Malformed { name: String, message: String },

    #[error("required setting '{0}' is not set")]
    MissingSetting(&'static str),
}

/// A notified-user token that is not an integer. Never fatal.
#[derive(Debug, Error)]
#[error("notified user id '{token}' is not an integer: {source}")]
pub struct NotifiedUserIdParseError {
    pub token: String,
    pub source: std::num::ParseIntError,
}

/// Settings for talking to one Backlog project.
#[derive(Clone, PartialEq, Eq)]
pub struct BacklogConfig {
    /// Backlog space host name (no scheme)
    pub domain: String,
    /// API key, kept private so it cannot leak through formatting
    api_key: String,
    pub project_id: String,
    pub issue_type_id: String,
    pub priority_id: String,
    /// Empty when issues are created unassigned
    pub assignee_id: String,
    pub close_status_id: String,
    /// Users notified on create and update, in configured order
    pub notified_user_ids: Vec<i64>,
}

// Custom Debug to avoid exposing api_key
impl std::fmt::Debug for BacklogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacklogConfig")
            .field("domain", &self.domain)
            .field("project_id", &self.project_id)
            .field("issue_type_id", &self.issue_type_id)
            .field("priority_id", &self.priority_id)
            .field("assignee_id", &self.assignee_id)
            .field("close_status_id", &self.close_status_id)
            .field("notified_user_ids", &self.notified_user_ids)
            .finish()
    }
}

impl BacklogConfig {
    /// Parse the bundle from the secret's JSON text.
    ///
    /// `name` is only used for error messages.
    pub fn from_secret_json(name: &str, value: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(value).map_err(|e| ConfigError::Malformed {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            notified_user_ids: parse_notified_user_ids(&raw.notified_user_ids),
            domain: raw.domain,
            api_key: raw.api_key,
            project_id: raw.project_id,
            issue_type_id: raw.issue_type_id,
            priority_id: raw.priority_id,
            assignee_id: raw.assignee_id,
            close_status_id: raw.close_status_id,
        })
    }

    /// The API key. Do not log it.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// Load the configuration bundle stored under `name`.
pub async fn get_configuration(
    store: &dyn SecretStore,
    name: &str,
) -> Result<BacklogConfig, ConfigError> {
    let result = match store.get(name).await {
        Ok(Some(value)) => BacklogConfig::from_secret_json(name, &value),
        Ok(None) => Err(ConfigError::SecretNotFound(name.to_string())),
        Err(e) => Err(e.into()),
    };

    if let Err(ref e) = result {
        tracing::error!(store = store.name(), error = %e, "failed to load configuration");
    }
    result
}

/// Read the secret name from the `SECRET_NAME` environment variable.
pub fn secret_name_from_env() -> Result<String, ConfigError> {
    match std::env::var(SECRET_NAME_VAR) {
        Ok(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(ConfigError::MissingSetting(SECRET_NAME_VAR)),
    }
}

/// Split a comma-separated id list into integers.
///
/// Tokens that are not integers are dropped with a warning; blank tokens
/// are skipped. Order is preserved.
pub fn parse_notified_user_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match try_parse_notified_user_id(token) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        })
        .collect()
}

fn try_parse_notified_user_id(token: &str) -> Result<i64, NotifiedUserIdParseError> {
    token
        .parse::<i64>()
        .map_err(|source| NotifiedUserIdParseError {
            token: token.to_string(),
            source,
        })
}

/// Secret JSON as stored.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(rename = "BACKLOG_DOMAIN")]
    domain: String,
    #[serde(rename = "BACKLOG_API_KEY")]
    api_key: String,
    #[serde(rename = "BACKLOG_PROJECT_ID", deserialize_with = "id_text")]
    project_id: String,
    #[serde(rename = "BACKLOG_ISSUE_TYPE_ID", deserialize_with = "id_text")]
    issue_type_id: String,
    #[serde(rename = "BACKLOG_ISSUE_PRIORITY_ID", deserialize_with = "id_text")]
    priority_id: String,
    #[serde(
        rename = "BACKLOG_ISSUE_ASSIGNEE_ID",
        default,
        deserialize_with = "optional_id_text"
    )]
    assignee_id: String,
    #[serde(rename = "BACKLOG_ISSUE_CLOSE_STATUS_ID", deserialize_with = "id_text")]
    close_status_id: String,
    #[serde(
        rename = "BACKLOG_ISSUE_NOTIFIED_USER_IDS",
        default,
        deserialize_with = "optional_id_text"
    )]
    notified_user_ids: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

pub(crate) fn id_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Number(n) => n.to_string(),
    })
}

/// Like [`id_text`], but a JSON `null` reads as an empty string.
fn optional_id_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<TextOrNumber>::deserialize(deserializer)? {
        None => String::new(),
        Some(TextOrNumber::Text(s)) => s,
        Some(TextOrNumber::Number(n)) => n.to_string(),
    })
}
