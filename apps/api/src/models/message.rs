use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::null_as_default;

/// A single email in a thread, from `email_messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub gmail_message_id: Option<String>,
    pub sender_email: Option<String>,
    pub sender_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recipients: Vec<String>,
    pub subject: Option<String>,
    pub snippet: Option<String>,
    pub body_text: Option<String>,
    pub received_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_from_user: bool,
}
