use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::null_as_default;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    SocialMedia,
    Email,
    Flyer,
    Program,
    Announcement,
    Website,
    Newsletter,
    Event,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    High,
    #[default]
    Medium,
    Low,
}

/// An obligation owed to a sponsor (logo on the flyer, shout-out post, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentTask {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_type: TaskType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_decodes_with_null_defaults() {
        let task: FulfillmentTask = serde_json::from_value(json!({
            "id": "0b7e1a52-3c1d-4f7e-8a2b-9c4d5e6f7a8b",
            "thread_id": "6f1f3c8e-8a7e-4c1f-9b0a-2d1c2b3a4f5e",
            "title": "Logo on flyer",
            "task_type": null,
            "priority": null,
            "completed": null,
            "created_at": "2024-03-01T12:00:00+00:00",
            "updated_at": "2024-03-01T12:00:00+00:00"
        }))
        .unwrap();
        assert_eq!(task.task_type, TaskType::Other);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(!task.completed);
    }
}
