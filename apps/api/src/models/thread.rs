use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::null_as_default;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    #[default]
    New,
    InProgress,
    Responded,
    Closed,
}

impl ThreadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreadStatus::New => "new",
            ThreadStatus::InProgress => "in_progress",
            ThreadStatus::Responded => "responded",
            ThreadStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityLevel {
    ReadNow,
    ReplyNow,
    #[default]
    Normal,
    Low,
    /// Legacy or unrecognised stored label. Never written back.
    #[serde(other)]
    Unrecognised,
}

impl PriorityLevel {
    pub const HIGH: [PriorityLevel; 2] = [PriorityLevel::ReadNow, PriorityLevel::ReplyNow];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::ReadNow => "READ_NOW",
            PriorityLevel::ReplyNow => "REPLY_NOW",
            PriorityLevel::Normal => "NORMAL",
            PriorityLevel::Low => "LOW",
            PriorityLevel::Unrecognised => "UNRECOGNISED",
        }
    }

    pub fn is_high(&self) -> bool {
        Self::HIGH.contains(self)
    }
}

/// What a sponsor is offering. Unrecognised stored values read as `Other`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ValueType {
    Monetary,
    InKind,
    Catering,
    Equipment,
    #[serde(other)]
    Other,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Monetary => "monetary",
            ValueType::InKind => "in-kind",
            ValueType::Catering => "catering",
            ValueType::Equipment => "equipment",
            ValueType::Other => "other",
        }
    }

    /// Monetary and equipment offers count toward the cash-like sponsor tally.
    pub fn is_monetary_like(&self) -> bool {
        matches!(self, ValueType::Monetary | ValueType::Equipment)
    }
}

/// An email conversation row from `email_threads`.
///
/// Only the columns the API reads are modelled; AI summary columns
/// (`last_action_summary`, `next_action_*`) stay opaque in the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: Uuid,
    pub gmail_thread_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub participants: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ThreadStatus,
    pub priority_level: Option<PriorityLevel>,
    pub sponsor_org_name: Option<String>,
    pub sponsor_poc_name: Option<String>,
    pub estimated_value_amount: Option<String>,
    pub value_type: Option<ValueType>,
    pub value_description: Option<String>,
    pub gmail_thread_url: Option<String>,
    /// Legacy ingestion flag; older rows may not carry it.
    pub llm_processed: Option<bool>,
    pub first_message_date: Option<DateTime<Utc>>,
    pub last_message_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update accepted by the thread PATCH routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ThreadStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_level: Option<PriorityLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor_org_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor_poc_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_value_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_description: Option<String>,
}
