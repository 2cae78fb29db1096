//! Record Query Interface: the only path from route handlers to persisted rows.
//!
//! Handlers speak in tables, filters, ordering and limits; the backend decides
//! how that turns into SQL. `AppState` carries an `Arc<dyn RecordStore>` that is
//! constructed once in `main` (Postgres) or per test (in-memory).

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// A stored row as a JSON object keyed by column name.
pub type Record = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid field name '{0}'")]
    InvalidField(String),

    #[error("record could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("record must be a JSON object")]
    NotAnObject,

    #[error("record has no fields to write")]
    EmptyRecord,
}

/// Tables the API is allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    EmailThreads,
    EmailMessages,
    FulfillmentTasks,
    Discovery,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::EmailThreads => "email_threads",
            Table::EmailMessages => "email_messages",
            Table::FulfillmentTasks => "fulfillment_tasks",
            Table::Discovery => "discovery",
        }
    }

    /// Whether writes stamp `updated_at`. Messages are immutable once ingested.
    pub fn tracks_updates(&self) -> bool {
        !matches!(self, Table::EmailMessages)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed value on the right-hand side of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Bool(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl FilterValue {
    /// Canonical text form, used for membership tests against text-cast columns.
    pub fn as_text(&self) -> String {
        match self {
            FilterValue::Text(s) => s.clone(),
            FilterValue::Bool(b) => b.to_string(),
            FilterValue::Uuid(u) => u.to_string(),
            FilterValue::Timestamp(t) => t.to_rfc3339(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        FilterValue::Uuid(value)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        FilterValue::Timestamp(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(FilterValue),
    In(Vec<FilterValue>),
    NotNull,
    Gte(FilterValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::Eq(value.into()),
        }
    }

    pub fn is_in<V: Into<FilterValue>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::In(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn not_null(field: &str) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::NotNull,
        }
    }

    pub fn gte(field: &str, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::Gte(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub ascending: bool,
}

/// Filter / sort / limit description for `RecordStore::query`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<i64>,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: &str, ascending: bool) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn query(&self, table: Table, query: RecordQuery) -> Result<Vec<Record>, StoreError>;

    /// Inserts a record and returns the stored row, including generated id and timestamps.
    async fn insert(&self, table: Table, record: Record) -> Result<Record, StoreError>;

    /// Applies a partial update. Returns `None` when no row has the given id.
    async fn update(
        &self,
        table: Table,
        id: Uuid,
        changes: Record,
    ) -> Result<Option<Record>, StoreError>;
}

/// Column names are interpolated into SQL, so only plain lowercase identifiers pass.
pub fn check_identifier(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_lowercase() || first == '_')
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidField(name.to_string()))
    }
}

pub fn decode<T: DeserializeOwned>(record: Record) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

pub fn to_record<T: Serialize>(value: &T) -> Result<Record, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject),
    }
}

/// Runs a query and decodes every row into `T`.
pub async fn fetch_all<T: DeserializeOwned>(
    store: &dyn RecordStore,
    table: Table,
    query: RecordQuery,
) -> Result<Vec<T>, StoreError> {
    store
        .query(table, query)
        .await?
        .into_iter()
        .map(decode)
        .collect()
}

/// Looks up a single row by primary key.
pub async fn fetch_by_id<T: DeserializeOwned>(
    store: &dyn RecordStore,
    table: Table,
    id: Uuid,
) -> Result<Option<T>, StoreError> {
    let query = RecordQuery::new().filter(Filter::eq("id", id)).limit(1);
    store
        .query(table, query)
        .await?
        .into_iter()
        .next()
        .map(decode)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_accepts_column_names() {
        assert!(check_identifier("sponsor_org_name").is_ok());
        assert!(check_identifier("_hidden2").is_ok());
    }

    #[test]
    fn test_identifier_rejects_injection() {
        assert!(check_identifier("").is_err());
        assert!(check_identifier("id; DROP TABLE email_threads").is_err());
        assert!(check_identifier("Status").is_err());
        assert!(check_identifier("1abc").is_err());
    }

    #[test]
    fn test_query_builder_accumulates() {
        let q = RecordQuery::new()
            .filter(Filter::not_null("sponsor_org_name"))
            .filter(Filter::is_in("priority_level", ["READ_NOW", "REPLY_NOW"]))
            .order_by("created_at", false)
            .limit(25);
        assert_eq!(q.filters.len(), 2);
        assert_eq!(q.limit, Some(25));
        assert_eq!(
            q.filters[1].op,
            FilterOp::In(vec!["READ_NOW".into(), "REPLY_NOW".into()])
        );
        assert!(!q.order_by.unwrap().ascending);
    }

    #[test]
    fn test_to_record_rejects_non_objects() {
        assert!(matches!(to_record(&json!([1, 2])), Err(StoreError::NotAnObject)));
        assert_eq!(to_record(&json!({"a": 1})).unwrap().len(), 1);
    }
}
