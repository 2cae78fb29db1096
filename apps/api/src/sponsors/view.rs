use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::message::Message;
use crate::models::thread::{Thread, ThreadStatus, ValueType};
use crate::sponsors::classifier::{classify_next_action, ActionClassification};
use crate::store::{fetch_all, Filter, RecordQuery, RecordStore, StoreError, Table};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SponsorType {
    Corporate,
    #[serde(rename = "In-kind")]
    InKind,
}

impl SponsorType {
    /// Threads without a value type are presumed corporate.
    pub fn from_value_type(value_type: Option<ValueType>) -> Self {
        match value_type {
            None => SponsorType::Corporate,
            Some(vt) if vt.is_monetary_like() => SponsorType::Corporate,
            Some(_) => SponsorType::InKind,
        }
    }

    /// Parses the form value, case-insensitively. Anything not corporate is in-kind.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("corporate") {
            SponsorType::Corporate
        } else {
            SponsorType::InKind
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            SponsorType::Corporate => ValueType::Monetary,
            SponsorType::InKind => ValueType::InKind,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SponsorStatus {
    #[serde(rename = "Initial email")]
    InitialEmail,
    #[serde(rename = "See email")]
    SeeEmail,
}

impl From<ThreadStatus> for SponsorStatus {
    fn from(status: ThreadStatus) -> Self {
        match status {
            ThreadStatus::New => SponsorStatus::InitialEmail,
            _ => SponsorStatus::SeeEmail,
        }
    }
}

/// A thread seen as a sponsor, joined to its latest message at read time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorView {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub sponsor_type: SponsorType,
    pub contents: String,
    pub status: SponsorStatus,
    pub approximate_value: String,
    pub email_chain: Option<String>,
    pub contact_name: Option<String>,
    pub participants: Vec<String>,
    pub thread_status: ThreadStatus,
    pub message_count: i32,
    pub first_message_date: Option<DateTime<Utc>>,
    pub last_message_date: Option<DateTime<Utc>>,
    pub actual_last_message_date: Option<DateTime<Utc>>,
    pub last_message_from_user: bool,
    pub last_message_sender: String,
    pub last_message_snippet: String,
    pub last_message_subject: String,
    pub next_action: Option<ActionClassification>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn build_sponsor_view(
    thread: Thread,
    last_message: Option<Message>,
    now: DateTime<Utc>,
) -> SponsorView {
    let last_message_from_user = last_message.as_ref().is_some_and(|m| m.is_from_user);
    let actual_last_message_date = last_message
        .as_ref()
        .map(|m| m.received_date)
        .or(thread.last_message_date);
    let next_action = actual_last_message_date
        .map(|at| classify_next_action(at, last_message_from_user, now));

    let (sender, snippet, subject) = match last_message {
        Some(m) => (
            m.sender_name.unwrap_or_else(|| "Unknown".to_string()),
            m.snippet.unwrap_or_default(),
            m.subject.unwrap_or_default(),
        ),
        None => ("Unknown".to_string(), String::new(), String::new()),
    };

    let contents = thread
        .value_description
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| Some(thread.subject.clone()).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| "Sponsorship inquiry".to_string());

    SponsorView {
        id: thread.id,
        name: thread
            .sponsor_org_name
            .unwrap_or_else(|| "Unknown Organization".to_string()),
        sponsor_type: SponsorType::from_value_type(thread.value_type),
        contents,
        status: thread.status.into(),
        approximate_value: thread
            .estimated_value_amount
            .unwrap_or_else(|| "TBD".to_string()),
        email_chain: thread.gmail_thread_url,
        contact_name: thread.sponsor_poc_name,
        participants: thread.participants,
        thread_status: thread.status,
        message_count: thread.message_count,
        first_message_date: thread.first_message_date,
        last_message_date: thread.last_message_date,
        actual_last_message_date,
        last_message_from_user,
        last_message_sender: sender,
        last_message_snippet: snippet,
        last_message_subject: subject,
        next_action,
        created_at: thread.created_at,
        updated_at: thread.updated_at,
    }
}

/// The newest `email_messages` row for a thread, if it has any.
pub async fn latest_message(
    store: &dyn RecordStore,
    thread_id: Uuid,
) -> Result<Option<Message>, StoreError> {
    let query = RecordQuery::new()
        .filter(Filter::eq("thread_id", thread_id))
        .order_by("received_date", false)
        .limit(1);
    Ok(fetch_all::<Message>(store, Table::EmailMessages, query)
        .await?
        .into_iter()
        .next())
}

/// Loads sponsor threads and joins each to its latest message.
///
/// Lookups run concurrently; the first failure aborts the whole load.
pub async fn load_sponsor_views(
    store: &dyn RecordStore,
    limit: i64,
    now: DateTime<Utc>,
) -> Result<Vec<SponsorView>, StoreError> {
    let query = RecordQuery::new()
        .filter(Filter::not_null("sponsor_org_name"))
        .order_by("created_at", false)
        .limit(limit);
    let threads: Vec<Thread> = fetch_all(store, Table::EmailThreads, query).await?;

    let lookups = threads.iter().map(|t| latest_message(store, t.id));
    let latest = try_join_all(lookups).await?;

    Ok(threads
        .into_iter()
        .zip(latest)
        .map(|(thread, last)| build_sponsor_view(thread, last, now))
        .collect())
}
