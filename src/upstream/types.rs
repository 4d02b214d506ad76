//! MyTaskly API data types

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Task as returned by `GET /tasks/`
#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    #[serde(alias = "id")]
    pub task_id: i64,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub start_time: Option<String>,

    #[serde(default)]
    pub end_time: Option<String>,

    /// "Alta", "Media" or "Bassa"
    #[serde(default)]
    pub priority: Option<String>,

    /// "In sospeso", "Completato", ...
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default, alias = "category_name")]
    pub category: Option<String>,
}

/// A post-it style note to create
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct NoteDraft {
    /// Note text content (unlimited length)
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,

    /// X position on canvas
    #[serde(default = "default_position")]
    pub position_x: String,

    /// Y position on canvas
    #[serde(default = "default_position")]
    pub position_y: String,

    /// Note color in hex format, e.g. "#FFEB3B" (yellow) or "#4CAF50" (green)
    #[serde(default = "default_note_color")]
    #[validate(custom = "validate_hex_color")]
    pub color: String,
}

fn default_position() -> String {
    "0".to_string()
}

fn default_note_color() -> String {
    "#FFEB3B".to_string()
}

fn validate_hex_color(color: &str) -> Result<(), validator::ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(validator::ValidationError::new("hex_color"))
    }
}

/// Body of `POST /notes`
#[derive(Debug, Clone, Serialize)]
pub struct NewNoteRequest<'a> {
    pub user_id: Value,
    pub title: &'a str,
    pub position_x: &'a str,
    pub position_y: &'a str,
    pub color: &'a str,
}

/// Response of `POST /notes`
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedNoteResponse {
    pub note_id: Value,
}

/// Note returned to the tool caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteCreated {
    pub note_id: Value,
    pub title: String,
    pub color: String,
    pub position_x: String,
    pub position_y: String,
    pub message: String,
}

/// Result of probing `GET /health`
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UpstreamHealth {
    Healthy { status: &'static str, code: u16 },
    Unhealthy { status: &'static str, error: String },
}

impl UpstreamHealth {
    pub fn healthy(code: u16) -> Self {
        Self::Healthy {
            status: "healthy",
            code,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self::Unhealthy {
            status: "unhealthy",
            error: error.into(),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Healthy { status, .. } | Self::Unhealthy { status, .. } => status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_deserialize() {
        let task: Task = serde_json::from_value(json!({
            "task_id": 1,
            "title": "Test Task",
            "description": "Test description",
            "end_time": "2025-12-15T18:00:00+00:00",
            "start_time": null,
            "priority": "Alta",
            "status": "In sospeso",
            "category": "Lavoro",
            "user_id": 7
        }))
        .unwrap();
        assert_eq!(task.task_id, 1);
        assert_eq!(task.priority.as_deref(), Some("Alta"));
        assert!(task.start_time.is_none());
    }

    #[test]
    fn test_task_aliases() {
        let task: Task = serde_json::from_value(json!({
            "id": 9,
            "category_name": "Sport"
        }))
        .unwrap();
        assert_eq!(task.task_id, 9);
        assert_eq!(task.category.as_deref(), Some("Sport"));
        assert!(task.title.is_empty());
    }

    #[test]
    fn test_note_draft_defaults() {
        let draft: NoteDraft = serde_json::from_value(json!({"title": "Comprare il latte"})).unwrap();
        assert_eq!(draft.position_x, "0");
        assert_eq!(draft.position_y, "0");
        assert_eq!(draft.color, "#FFEB3B");
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_note_draft_validation() {
        let empty: NoteDraft = serde_json::from_value(json!({"title": ""})).unwrap();
        assert!(empty.validate().is_err());

        let bad_color: NoteDraft =
            serde_json::from_value(json!({"title": "x", "color": "green"})).unwrap();
        assert!(bad_color.validate().is_err());

        let good: NoteDraft =
            serde_json::from_value(json!({"title": "x", "color": "#4caf50"})).unwrap();
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_health_serialize() {
        let healthy = serde_json::to_value(UpstreamHealth::healthy(200)).unwrap();
        assert_eq!(healthy, json!({"status": "healthy", "code": 200}));

        let unhealthy = UpstreamHealth::unhealthy("connection refused");
        assert_eq!(unhealthy.status(), "unhealthy");
        assert_eq!(
            serde_json::to_value(unhealthy).unwrap()["error"],
            "connection refused"
        );
    }
}
