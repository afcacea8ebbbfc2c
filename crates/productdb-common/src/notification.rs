use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_TITLE_LEN: usize = 2048;

/// Severity of a notification shown on the message board.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MessageType {
    #[serde(rename = "ERR")]
    Error,
    #[serde(rename = "WARN")]
    Warning,
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "SUCCESS")]
    Success,
}

impl MessageType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ERR" => Some(Self::Error),
            "WARN" => Some(Self::Warning),
            "INFO" => Some(Self::Info),
            "SUCCESS" => Some(Self::Success),
            _ => None,
        }
    }
}

/// Stored under `/notifications/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationMessage {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub summary_message: String,
    pub detailed_message: String,
    pub created: DateTime<Utc>,
}

impl NotificationMessage {
    pub fn key(&self) -> String {
        notification_key(&self.id)
    }
}

pub fn notification_key(id: &str) -> String {
    format!("/notifications/{}", id)
}

/// Submitted form for a new notification. Every field is optional on the
/// wire so that missing input is reported per field instead of as a decode
/// error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewNotification {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub message_type: Option<String>,
    pub summary_message: Option<String>,
    pub detailed_message: Option<String>,
}

impl NewNotification {
    /// Validate the form and build the message. On failure returns a map of
    /// field name to error text.
    pub fn validate(self) -> Result<NotificationMessage, BTreeMap<&'static str, String>> {
        let mut errors = BTreeMap::new();

        let title = required(&mut errors, "title", self.title);
        if let Some(t) = &title {
            if t.chars().count() > MAX_TITLE_LEN {
                errors.insert("title", format!("at most {MAX_TITLE_LEN} characters"));
            }
        }

        let message_type = match self.message_type.as_deref().map(str::trim) {
            None | Some("") => {
                errors.insert("type", "this field is required".to_string());
                None
            }
            Some(code) => {
                let parsed = MessageType::from_code(code);
                if parsed.is_none() {
                    errors.insert("type", format!("unknown message type '{code}'"));
                }
                parsed
            }
        };

        let summary_message = required(&mut errors, "summary_message", self.summary_message);
        let detailed_message = required(&mut errors, "detailed_message", self.detailed_message);

        match (title, message_type, summary_message, detailed_message) {
            (Some(title), Some(message_type), Some(summary_message), Some(detailed_message))
                if errors.is_empty() =>
            {
                Ok(NotificationMessage {
                    id: Uuid::new_v4().to_string(),
                    title,
                    message_type,
                    summary_message,
                    detailed_message,
                    created: Utc::now(),
                })
            }
            _ => Err(errors),
        }
    }
}

fn required(
    errors: &mut BTreeMap<&'static str, String>,
    field: &'static str,
    value: Option<String>,
) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.insert(field, "this field is required".to_string());
            None
        }
    }
}
