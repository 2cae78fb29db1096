use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{Filter, FilterOp, FilterValue, Record, RecordQuery, RecordStore, StoreError, Table};

/// In-process `RecordStore` used by handler tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<Table, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row verbatim, without generating ids or timestamps.
    pub fn seed(&self, table: Table, record: Value) {
        if let Value::Object(map) = record {
            self.tables
                .lock()
                .unwrap()
                .entry(table)
                .or_default()
                .push(map);
        }
    }

    pub fn rows(&self, table: Table) -> Vec<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn query(&self, table: Table, query: RecordQuery) -> Result<Vec<Record>, StoreError> {
        for filter in &query.filters {
            super::check_identifier(&filter.field)?;
        }
        let mut rows: Vec<Record> = self
            .rows(table)
            .into_iter()
            .filter(|row| query.filters.iter().all(|f| matches(row, f)))
            .collect();

        if let Some(order) = &query.order_by {
            rows.sort_by(|a, b| {
                let ord = compare(
                    a.get(&order.field).unwrap_or(&Value::Null),
                    b.get(&order.field).unwrap_or(&Value::Null),
                );
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit.max(0) as usize);
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, mut record: Record) -> Result<Record, StoreError> {
        if record.is_empty() {
            return Err(StoreError::EmptyRecord);
        }
        let now = Value::String(Utc::now().to_rfc3339());
        record
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        record.entry("created_at").or_insert_with(|| now.clone());
        if table.tracks_updates() {
            record.insert("updated_at".into(), now);
        }
        self.tables
            .lock()
            .unwrap()
            .entry(table)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        table: Table,
        id: Uuid,
        changes: Record,
    ) -> Result<Option<Record>, StoreError> {
        if changes.is_empty() {
            return Err(StoreError::EmptyRecord);
        }
        let mut tables = self.tables.lock().unwrap();
        let id = Value::String(id.to_string());
        let Some(row) = tables
            .entry(table)
            .or_default()
            .iter_mut()
            .find(|row| row.get("id") == Some(&id))
        else {
            return Ok(None);
        };
        for (key, value) in changes {
            row.insert(key, value);
        }
        if table.tracks_updates() {
            row.insert(
                "updated_at".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
        Ok(Some(row.clone()))
    }
}

fn matches(row: &Record, filter: &Filter) -> bool {
    let field = row.get(&filter.field).unwrap_or(&Value::Null);
    match &filter.op {
        FilterOp::Eq(expected) => value_eq(field, expected),
        FilterOp::In(options) => options.iter().any(|o| value_eq(field, o)),
        FilterOp::NotNull => !field.is_null(),
        FilterOp::Gte(bound) => match (bound, field) {
            (FilterValue::Timestamp(bound), Value::String(s)) => {
                parse_ts(s).map(|ts| ts >= *bound).unwrap_or(false)
            }
            (FilterValue::Text(bound), Value::String(s)) => s >= bound,
            _ => false,
        },
    }
}

fn value_eq(field: &Value, expected: &FilterValue) -> bool {
    match (field, expected) {
        (Value::Bool(b), FilterValue::Bool(e)) => b == e,
        (Value::String(s), FilterValue::Timestamp(e)) => parse_ts(s) == Some(*e),
        (Value::String(s), other) => *s == other.as_text(),
        (Value::Number(n), other) => n.to_string() == other.as_text(),
        _ => false,
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::String(x), Value::String(y)) => match (parse_ts(x), parse_ts(y)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x.cmp(y),
        },
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_filters_sort_and_limit() {
        let store = MemoryStore::new();
        store.seed(
            Table::EmailThreads,
            json!({"id": "a", "status": "new", "created_at": "2024-01-01T00:00:00Z"}),
        );
        store.seed(
            Table::EmailThreads,
            json!({"id": "b", "status": "closed", "created_at": "2024-02-01T00:00:00Z"}),
        );
        store.seed(
            Table::EmailThreads,
            json!({"id": "c", "status": "new", "created_at": "2024-03-01T00:00:00Z"}),
        );

        let rows = store
            .query(
                Table::EmailThreads,
                RecordQuery::new()
                    .filter(Filter::eq("status", "new"))
                    .order_by("created_at", false)
                    .limit(1),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "c");
    }

    #[tokio::test]
    async fn test_update_missing_row_is_none() {
        let store = MemoryStore::new();
        let mut changes = Record::new();
        changes.insert("status".into(), json!("closed"));
        let out = store
            .update(Table::EmailThreads, Uuid::new_v4(), changes)
            .await
            .unwrap();
        assert!(out.is_none());
    }
}
