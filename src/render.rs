//! render
//!
//! Event-to-issue rendering.
//!
//! # Layout
//!
//! Every optional event field contributes exactly one line (or block) when
//! present and nothing when absent. Fields are emitted in a fixed order,
//! and the description ends with the raw event payload, so downstream tooling
//! can rely on the layout. The description always starts with the correlation
//! keyword, which is what later searches match on.
//!
//! The `(Auto-updated)` marker is written on both the create and the update
//! path.

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use thiserror::Error;

use crate::event::AlertEvent;

/// Marker line identifying text written by this handler.
pub const AUTO_MARKER: &str = "(Auto-updated)";

/// Hours east of UTC used for rendered timestamps (JST).
pub const DEFAULT_OFFSET_HOURS: i32 = 9;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A timestamp that could not be rendered. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampFormatError {
    #[error("timestamp {0} is not a number")]
    NotNumeric(String),

    #[error("timestamp {0} is out of range")]
    OutOfRange(String),

    #[error("invalid UTC offset: {0} hours")]
    InvalidOffset(i32),
}

/// Render an epoch-millisecond timestamp as `YYYY-MM-DD HH:MM:SS` at a
/// fixed offset from UTC.
///
/// A value that cannot be converted is logged and returned as its raw text.
///
/// # Example
///
/// ```
/// use nr2backlog::render::parse_datetime;
/// use serde_json::json;
///
/// assert_eq!(parse_datetime(&json!(1723972836888u64), 9), "2024-08-18 18:20:36");
/// assert_eq!(parse_datetime(&json!("soon"), 9), "soon");
/// ```
pub fn parse_datetime(timestamp_ms: &Value, offset_hours: i32) -> String {
    match try_parse_datetime(timestamp_ms, offset_hours) {
        Ok(formatted) => formatted,
        Err(e) => {
            tracing::warn!("{}", e);
            display_value(timestamp_ms)
        }
    }
}

/// Fallible core of [`parse_datetime`].
pub fn try_parse_datetime(
    timestamp_ms: &Value,
    offset_hours: i32,
) -> Result<String, TimestampFormatError> {
    let millis = match timestamp_ms {
        Value::Number(n) => match n.as_i64() {
            Some(ms) => ms,
            None => match n.as_f64() {
                Some(ms) if ms.is_finite() && ms.abs() < i64::MAX as f64 => ms.floor() as i64,
                _ => return Err(TimestampFormatError::OutOfRange(n.to_string())),
            },
        },
        other => return Err(TimestampFormatError::NotNumeric(other.to_string())),
    };

    let offset = offset_hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or(TimestampFormatError::InvalidOffset(offset_hours))?;
    let datetime = DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| TimestampFormatError::OutOfRange(millis.to_string()))?;

    Ok(datetime
        .with_timezone(&offset)
        .format(DATETIME_FORMAT)
        .to_string())
}

/// Plain-text form of a payload value.
///
/// Strings are shown bare, lists as their items joined by `, `, and
/// anything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Issue summary: `[{state}] {title}`.
pub fn summary(event: &AlertEvent) -> String {
    format!(
        "[{}] {}",
        event.state.as_deref().unwrap_or_default(),
        event.title.as_deref().unwrap_or_default()
    )
}

/// Issue description for a newly created issue.
pub fn description(keyword: &str, event: &AlertEvent) -> String {
    let mut lines: Vec<String> = vec![format!("{}\n{}\n", keyword, AUTO_MARKER)];

    if let Some(title) = &event.title {
        lines.push(format!("\n# {}\n", title));
    }

    if let Some(created_at) = &event.created_at {
        lines.push(format!(
            "created at: {}",
            parse_datetime(created_at, DEFAULT_OFFSET_HOURS)
        ));
    }
    if let Some(updated_at) = &event.updated_at {
        lines.push(format!(
            "updated at: {}",
            parse_datetime(updated_at, DEFAULT_OFFSET_HOURS)
        ));
    }

    if let Some(url) = &event.issue_url {
        lines.push(format!("[Go to issue]({})\n", url));
    }

    if let Some(state) = &event.state {
        lines.push(format!("state: {}", state));
    }
    if let Some(trigger) = &event.trigger {
        lines.push(format!("trigger: {}", trigger));
    }
    if let Some(priority) = &event.priority {
        lines.push(format!("priority: {}", priority));
    }
    if let Some(total) = &event.total_incidents {
        lines.push(format!("total incidents: {}\n", display_value(total)));
    }
    if let Some(url) = &event.violation_chart_url {
        lines.push(format!("\n![violationChartUrl]({})\n", url));
    }

    if let Some(entities) = &event.impacted_entities {
        lines.push(format!("\nimpacted entity: {}\n", display_value(entities)));
    }
    if let Some(policies) = &event.alert_policy_names {
        lines.push(format!("alert policy: {}\n", display_value(policies)));
    }
    if let Some(conditions) = &event.alert_condition_names {
        lines.push(format!("alert condition: {}\n", display_value(conditions)));
    }
    if let Some(correlated) = &event.is_correlated {
        lines.push(format!("is correlated: {}\n", display_value(correlated)));
    }
    if let Some(workflow) = &event.workflow_name {
        lines.push(format!("workflow: {}\n", workflow));
    }

    lines.push("---\n\nraw event details:\n\n```".to_string());
    lines.push(raw_event_json(event));
    lines.push("```\n".to_string());

    lines.join("\n")
}

/// Comment appended when an existing issue is updated.
pub fn comment(event: &AlertEvent) -> String {
    let mut lines: Vec<String> = vec![AUTO_MARKER.to_string()];

    if let Some(updated_at) = &event.updated_at {
        lines.push(format!(
            "updated at: {}",
            parse_datetime(updated_at, DEFAULT_OFFSET_HOURS)
        ));
    }
    if let Some(state) = &event.state {
        lines.push(format!("state: {}", state));
    }
    if let Some(trigger) = &event.trigger {
        lines.push(format!("trigger: {}", trigger));
    }
    if let Some(priority) = &event.priority {
        lines.push(format!("priority: {}", priority));
    }

    lines.join("\n")
}

fn raw_event_json(event: &AlertEvent) -> String {
    // Serializing a map of JSON values cannot fail.
    serde_json::to_string_pretty(event.raw()).unwrap_or_default()
}
