//! event
//!
//! Inbound alert events.
//!
//! # Design
//!
//! Events arrive from EventBridge as an envelope whose `detail` object is
//! the New Relic workflow payload. Every field of that payload is optional.
//! Scalar fields are read leniently (a numeric `id` is still an id) and a
//! JSON `null` counts as absent. The verbatim `detail` object is kept next
//! to the typed fields so it can be reproduced in issue descriptions.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// EventBridge envelope around an alert event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "detail-type", default)]
    pub detail_type: Option<String>,
    #[serde(default)]
    pub detail: Value,
}

impl EventEnvelope {
    /// Decode the typed alert event. A missing `detail` is an empty event.
    pub fn alert_event(&self) -> Result<AlertEvent, serde_json::Error> {
        match &self.detail {
            Value::Null => Ok(AlertEvent::default()),
            detail => AlertEvent::from_value(detail.clone()),
        }
    }
}

/// A New Relic alert-lifecycle event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    /// Falsy ids (`0`, `false`, `""`, `[]`, `{}`) count as absent
    #[serde(default, deserialize_with = "truthy_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    /// `ACTIVATED`, `CREATED`, `CLOSED`, ...
    #[serde(default, deserialize_with = "lenient_text")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub trigger: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub priority: Option<String>,
    /// Epoch milliseconds, kept raw so bad values can be shown as-is
    #[serde(default)]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub updated_at: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub issue_url: Option<String>,
    #[serde(default)]
    pub total_incidents: Option<Value>,
    #[serde(default)]
    pub impacted_entities: Option<Value>,
    #[serde(default)]
    pub alert_policy_names: Option<Value>,
    #[serde(default)]
    pub alert_condition_names: Option<Value>,
    #[serde(default)]
    pub is_correlated: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub workflow_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub violation_chart_url: Option<String>,
    /// The verbatim payload, including fields not modelled above
    #[serde(skip)]
    raw: Map<String, Value>,
}

impl AlertEvent {
    /// Decode an event from its `detail` object.
    pub fn from_value(detail: Value) -> Result<Self, serde_json::Error> {
        let Value::Object(raw) = detail else {
            return Err(serde::de::Error::custom("event detail must be a JSON object"));
        };
        let mut event = AlertEvent::deserialize(&Value::Object(raw.clone()))?;
        event.raw = raw;
        Ok(event)
    }

    /// The verbatim payload this event was decoded from.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// Whether this event reports the alert as closed.
    pub fn is_closed(&self) -> bool {
        self.state.as_deref() == Some(CLOSED_STATE)
    }
}

/// State value that closes the tracked issue.
pub const CLOSED_STATE: &str = "CLOSED";

/// Derive the correlation keyword for an event.
///
/// Returns `<issueId:{id}>`, or an empty string when the event has no id
/// (in which case no existing issue can ever be matched).
pub fn correlation_keyword(event: &AlertEvent) -> String {
    match event.id.as_deref() {
        Some(id) if !id.is_empty() => format!("<issueId:{}>", id),
        _ => String::new(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn truthy_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::Array(a)) if a.is_empty() => None,
        Some(Value::Object(o)) if o.is_empty() => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
