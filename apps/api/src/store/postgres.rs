use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::{
    check_identifier, Filter, FilterOp, FilterValue, Record, RecordQuery, RecordStore,
    StoreError, Table,
};

/// `RecordStore` over a PostgreSQL pool.
///
/// Rows travel as `to_jsonb(row)`; writes coerce the JSON payload into the
/// table's column types with `jsonb_populate_record`, so callers never deal
/// with per-column SQL types.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn query(&self, table: Table, query: RecordQuery) -> Result<Vec<Record>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT to_jsonb(t.*) FROM ");
        qb.push(table.as_str()).push(" AS t");

        for (i, filter) in query.filters.iter().enumerate() {
            check_identifier(&filter.field)?;
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            push_filter(&mut qb, filter);
        }

        if let Some(order) = &query.order_by {
            check_identifier(&order.field)?;
            qb.push(" ORDER BY t.")
                .push(&order.field)
                .push(if order.ascending { " ASC" } else { " DESC" });
        }

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ").push_bind(limit.max(0));
        }

        debug!("query {table}: {}", qb.sql());

        let rows: Vec<(Value,)> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(|(row,)| into_record(row)).collect()
    }

    async fn insert(&self, table: Table, record: Record) -> Result<Record, StoreError> {
        let mut qb = insert_statement(table, record)?;
        debug!("insert {table}: {}", qb.sql());

        let (row,): (Value,) = qb.build_query_as().fetch_one(&self.pool).await?;
        into_record(row)
    }

    async fn update(
        &self,
        table: Table,
        id: Uuid,
        changes: Record,
    ) -> Result<Option<Record>, StoreError> {
        let columns: Vec<String> = changes
            .keys()
            .filter(|k| k.as_str() != "id" && k.as_str() != "updated_at")
            .cloned()
            .collect();
        if columns.is_empty() {
            return Err(StoreError::EmptyRecord);
        }
        for column in &columns {
            check_identifier(column)?;
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
        qb.push(table.as_str()).push(" AS t SET ");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(column).push(" = r.").push(column);
        }
        if table.tracks_updates() {
            qb.push(", updated_at = now()");
        }
        qb.push(" FROM jsonb_populate_record(NULL::")
            .push(table.as_str())
            .push(", ")
            .push_bind(Value::Object(changes))
            .push(") AS r WHERE t.id = ")
            .push_bind(id)
            .push(" RETURNING to_jsonb(t.*)");

        let row: Option<(Value,)> = qb.build_query_as().fetch_optional(&self.pool).await?;
        row.map(|(row,)| into_record(row)).transpose()
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    qb.push("t.").push(&filter.field);
    match &filter.op {
        FilterOp::Eq(value) => {
            push_comparison(qb, " = ", value);
        }
        FilterOp::In(values) => {
            let texts: Vec<String> = values.iter().map(FilterValue::as_text).collect();
            qb.push("::text = ANY(").push_bind(texts).push(")");
        }
        FilterOp::NotNull => {
            qb.push(" IS NOT NULL");
        }
        FilterOp::Gte(value) => {
            push_comparison(qb, " >= ", value);
        }
    }
}

fn push_comparison(qb: &mut QueryBuilder<'_, Postgres>, operator: &str, value: &FilterValue) {
    match value {
        // Enum-like columns compare as text regardless of their declared type.
        FilterValue::Text(s) => {
            qb.push("::text").push(operator).push_bind(s.clone());
        }
        FilterValue::Bool(b) => {
            qb.push(operator).push_bind(*b);
        }
        FilterValue::Uuid(u) => {
            qb.push(operator).push_bind(*u);
        }
        FilterValue::Timestamp(ts) => {
            qb.push(operator).push_bind(*ts);
        }
    }
}

fn insert_statement(
    table: Table,
    record: Record,
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    // Absent and null keys fall back to column defaults.
    let record: Record = record
        .into_iter()
        .filter(|(k, v)| !v.is_null() && !(table.tracks_updates() && k == "updated_at"))
        .collect();
    if record.is_empty() {
        return Err(StoreError::EmptyRecord);
    }
    for column in record.keys() {
        check_identifier(column)?;
    }
    let columns = record.keys().cloned().collect::<Vec<_>>().join(", ");

    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO ");
    qb.push(table.as_str()).push(" AS t (").push(&columns);
    if table.tracks_updates() {
        qb.push(", updated_at");
    }
    qb.push(") SELECT ").push(&columns);
    if table.tracks_updates() {
        qb.push(", now()");
    }
    qb.push(" FROM jsonb_populate_record(NULL::")
        .push(table.as_str())
        .push(", ")
        .push_bind(Value::Object(record))
        .push(") RETURNING to_jsonb(t.*)");
    Ok(qb)
}

fn into_record(row: Value) -> Result<Record, StoreError> {
    match row {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject),
    }
}
