//! Next-action classification for a sponsor conversation.
//!
//! The bucket depends only on who sent the latest message and how many whole
//! days have passed since it arrived. Inputs must come from the latest
//! `email_messages` row, never from stored AI summaries.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Days a conversation may sit before it escalates. Inclusive: day 2 is still fresh.
pub const FOLLOW_UP_THRESHOLD_DAYS: i64 = 2;

const MILLIS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColorTag {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    AwaitingResponse,
    Bump,
    ReadRespond,
    ReadRespondImmediately,
}

impl NextAction {
    pub fn label(&self) -> &'static str {
        match self {
            NextAction::AwaitingResponse => "Awaiting Response",
            NextAction::Bump => "Bump",
            NextAction::ReadRespond => "Read/Respond",
            NextAction::ReadRespondImmediately => "Read/Respond Immediately",
        }
    }

    pub fn urgency(&self) -> UrgencyTier {
        match self {
            NextAction::AwaitingResponse => UrgencyTier::Low,
            NextAction::Bump | NextAction::ReadRespond => UrgencyTier::Medium,
            NextAction::ReadRespondImmediately => UrgencyTier::High,
        }
    }

    pub fn color(&self) -> ColorTag {
        match self.urgency() {
            UrgencyTier::Low => ColorTag::Success,
            UrgencyTier::Medium => ColorTag::Warning,
            UrgencyTier::High => ColorTag::Error,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActionClassification {
    pub action: NextAction,
    pub action_label: &'static str,
    pub urgency_tier: UrgencyTier,
    pub color_tag: ColorTag,
    pub days_since: i64,
    pub last_message_from_user: bool,
    pub description: String,
}

/// Whole calendar days elapsed, floored. Negative when the timestamp is in the future.
pub fn days_since(last_message_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - last_message_at)
        .num_milliseconds()
        .div_euclid(MILLIS_PER_DAY)
}

pub fn classify_next_action(
    last_message_at: DateTime<Utc>,
    last_message_from_user: bool,
    now: DateTime<Utc>,
) -> ActionClassification {
    let days = days_since(last_message_at, now);
    let stale = days > FOLLOW_UP_THRESHOLD_DAYS;

    let action = match (last_message_from_user, stale) {
        (true, false) => NextAction::AwaitingResponse,
        (true, true) => NextAction::Bump,
        (false, false) => NextAction::ReadRespond,
        (false, true) => NextAction::ReadRespondImmediately,
    };

    ActionClassification {
        action,
        action_label: action.label(),
        urgency_tier: action.urgency(),
        color_tag: action.color(),
        days_since: days,
        last_message_from_user,
        description: format!(
            "Last message: {} days ago {}",
            days.max(0),
            if last_message_from_user {
                "(from you)"
            } else {
                "(from them)"
            }
        ),
    }
}
