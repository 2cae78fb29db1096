use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::message::Message;
use crate::models::thread::{PriorityLevel, Thread, ThreadStatus, ThreadUpdate};
use crate::routes::page_limit;
use crate::state::AppState;
use crate::store::{decode, fetch_all, fetch_by_id, to_record, Filter, RecordQuery, Table};

#[derive(Debug, Deserialize)]
pub struct ThreadListQuery {
    pub limit: Option<i64>,
    pub status: Option<ThreadStatus>,
    pub priority: Option<PriorityLevel>,
    pub updated_since: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ThreadDetailResponse {
    pub thread: Thread,
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadUpdateWithId {
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub changes: ThreadUpdate,
}

/// GET /api/email-threads
pub async fn handle_list_threads(
    State(state): State<AppState>,
    Query(params): Query<ThreadListQuery>,
) -> Result<Json<Vec<Thread>>, AppError> {
    let mut query = RecordQuery::new()
        .order_by("last_message_date", false)
        .limit(page_limit(params.limit, state.config.default_page_limit));
    if let Some(status) = params.status {
        query = query.filter(Filter::eq("status", status.as_str()));
    }
    if let Some(priority) = params.priority {
        check_priority(priority)?;
        query = query.filter(Filter::eq("priority_level", priority.as_str()));
    }
    if let Some(since) = params.updated_since {
        query = query.filter(Filter::gte("updated_at", since));
    }

    let threads = fetch_all(state.store.as_ref(), Table::EmailThreads, query).await?;
    Ok(Json(threads))
}

/// GET /api/email-threads/:id
///
/// Returns the thread and all of its messages, oldest first.
pub async fn handle_get_thread(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ThreadDetailResponse>, AppError> {
    let thread: Thread = fetch_by_id(state.store.as_ref(), Table::EmailThreads, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Thread {id} not found")))?;

    let messages = fetch_all(
        state.store.as_ref(),
        Table::EmailMessages,
        RecordQuery::new()
            .filter(Filter::eq("thread_id", id))
            .order_by("received_date", true),
    )
    .await?;

    Ok(Json(ThreadDetailResponse { thread, messages }))
}

/// PATCH /api/email-threads/:id
pub async fn handle_update_thread(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(changes): Json<ThreadUpdate>,
) -> Result<Json<Thread>, AppError> {
    Ok(Json(apply_update(&state, id, changes).await?))
}

/// PATCH /api/email-threads
///
/// Same as the path variant, with the thread id carried in the body.
pub async fn handle_update_thread_by_body(
    State(state): State<AppState>,
    Json(req): Json<ThreadUpdateWithId>,
) -> Result<Json<Thread>, AppError> {
    let id = req
        .id
        .ok_or_else(|| AppError::Validation("Thread ID is required".to_string()))?;
    Ok(Json(apply_update(&state, id, req.changes).await?))
}

fn check_priority(priority: PriorityLevel) -> Result<(), AppError> {
    if priority == PriorityLevel::Unrecognised {
        return Err(AppError::Validation(
            "priority_level must be one of READ_NOW, REPLY_NOW, NORMAL, LOW".to_string(),
        ));
    }
    Ok(())
}

async fn apply_update(state: &AppState, id: Uuid, changes: ThreadUpdate) -> Result<Thread, AppError> {
    if let Some(priority) = changes.priority_level {
        check_priority(priority)?;
    }
    let record = to_record(&changes)?;
    if record.is_empty() {
        return Err(AppError::Validation(
            "No updatable thread fields provided".to_string(),
        ));
    }

    let updated = state
        .store
        .update(Table::EmailThreads, id, record)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Thread {id} not found")))?;
    Ok(decode(updated)?)
}
