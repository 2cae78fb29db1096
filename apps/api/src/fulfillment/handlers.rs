use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::fulfillment::{FulfillmentTask, TaskPriority, TaskType};
use crate::models::thread::Thread;
use crate::routes::{page_limit, required};
use crate::state::AppState;
use crate::store::{
    decode, fetch_all, fetch_by_id, to_record, Filter, Record, RecordQuery, Table,
};

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub thread_id: Option<Uuid>,
    pub completed: Option<bool>,
    pub limit: Option<i64>,
}

/// The parts of the owning thread shown next to a task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskThreadSummary {
    pub subject: String,
    pub sponsor_org_name: Option<String>,
    pub sponsor_poc_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskWithThread {
    #[serde(flatten)]
    pub task: FulfillmentTask,
    pub thread: Option<TaskThreadSummary>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub thread_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub task_type: Option<TaskType>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
    pub notes: Option<String>,
}

/// GET /api/fulfillment-tasks
pub async fn handle_list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskListQuery>,
) -> Result<Json<Vec<TaskWithThread>>, AppError> {
    let mut query = RecordQuery::new()
        .order_by("created_at", false)
        .limit(page_limit(params.limit, state.config.default_page_limit));
    if let Some(thread_id) = params.thread_id {
        query = query.filter(Filter::eq("thread_id", thread_id));
    }
    if let Some(completed) = params.completed {
        query = query.filter(Filter::eq("completed", completed));
    }
    let tasks: Vec<FulfillmentTask> =
        fetch_all(state.store.as_ref(), Table::FulfillmentTasks, query).await?;

    // One membership query for every referenced thread.
    let thread_ids: HashSet<Uuid> = tasks.iter().map(|t| t.thread_id).collect();
    let threads: HashMap<Uuid, TaskThreadSummary> = if thread_ids.is_empty() {
        HashMap::new()
    } else {
        fetch_all::<Thread>(
            state.store.as_ref(),
            Table::EmailThreads,
            RecordQuery::new().filter(Filter::is_in("id", thread_ids)),
        )
        .await?
        .into_iter()
        .map(|t| {
            (
                t.id,
                TaskThreadSummary {
                    subject: t.subject,
                    sponsor_org_name: t.sponsor_org_name,
                    sponsor_poc_name: t.sponsor_poc_name,
                },
            )
        })
        .collect()
    };

    Ok(Json(
        tasks
            .into_iter()
            .map(|task| {
                let thread = threads.get(&task.thread_id).cloned();
                TaskWithThread { task, thread }
            })
            .collect(),
    ))
}

/// POST /api/fulfillment-tasks
pub async fn handle_create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<Json<FulfillmentTask>, AppError> {
    let (Some(thread_id), Some(title)) = (req.thread_id, required(req.title)) else {
        return Err(AppError::Validation(
            "Thread ID and title are required".to_string(),
        ));
    };

    let thread: Option<Thread> =
        fetch_by_id(state.store.as_ref(), Table::EmailThreads, thread_id).await?;
    if thread.is_none() {
        return Err(AppError::NotFound(format!("Thread {thread_id} not found")));
    }

    let record = to_record(&json!({
        "thread_id": thread_id,
        "title": title,
        "description": req.description,
        "task_type": req.task_type.unwrap_or_default(),
        "priority": req.priority.unwrap_or_default(),
        "due_date": req.due_date,
        "completed": false,
        "assigned_to": req.assigned_to,
        "notes": req.notes,
    }))?;

    let task: FulfillmentTask =
        decode(state.store.insert(Table::FulfillmentTasks, record).await?)?;
    info!("Created fulfillment task {} for thread {}", task.id, thread_id);
    Ok(Json(task))
}

/// PATCH /api/fulfillment-tasks/:id
///
/// Toggling `completed` stamps or clears `completed_at`.
pub async fn handle_update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<FulfillmentTask>, AppError> {
    let changes = task_changes(req, Utc::now());
    if changes.is_empty() {
        return Err(AppError::Validation(
            "No updatable task fields provided".to_string(),
        ));
    }

    let updated = state
        .store
        .update(Table::FulfillmentTasks, id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Fulfillment task {id} not found")))?;
    Ok(Json(decode(updated)?))
}

fn task_changes(req: UpdateTaskRequest, now: DateTime<Utc>) -> Record {
    let mut changes = Record::new();
    if let Some(title) = required(req.title) {
        changes.insert("title".into(), json!(title));
    }
    if let Some(completed) = req.completed {
        changes.insert("completed".into(), json!(completed));
        let completed_at = if completed { json!(now) } else { Value::Null };
        changes.insert("completed_at".into(), completed_at);
    }
    if let Some(priority) = req.priority {
        changes.insert("priority".into(), json!(priority));
    }
    if let Some(due_date) = req.due_date {
        changes.insert("due_date".into(), json!(due_date));
    }
    if let Some(assigned_to) = req.assigned_to {
        changes.insert("assigned_to".into(), json!(assigned_to));
    }
    if let Some(notes) = req.notes {
        changes.insert("notes".into(), json!(notes));
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::TimeZone;

    use crate::testing::{send, TestApp};

    #[test]
    fn test_completion_stamps_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let changes = task_changes(
            UpdateTaskRequest {
                completed: Some(true),
                ..Default::default()
            },
            now,
        );
        assert_eq!(changes["completed"], json!(true));
        assert_eq!(changes["completed_at"], json!(now));
    }

    #[test]
    fn test_reopening_clears_timestamp() {
        let changes = task_changes(
            UpdateTaskRequest {
                completed: Some(false),
                notes: Some("logo was wrong".into()),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(changes["completed_at"], Value::Null);
        assert_eq!(changes["notes"], json!("logo was wrong"));
    }

    #[tokio::test]
    async fn test_create_requires_thread_and_title() {
        let app = TestApp::new();
        let (status, _) = send(
            &app,
            "POST",
            "/api/fulfillment-tasks",
            Some(json!({"title": "Post on Instagram"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_for_unknown_thread_is_404() {
        let app = TestApp::new();
        let (status, _) = send(
            &app,
            "POST",
            "/api/fulfillment-tasks",
            Some(json!({"thread_id": Uuid::new_v4(), "title": "Logo on flyer"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_list_and_complete() {
        let app = TestApp::new();
        let thread_id = app.seed_thread(json!({
            "subject": "Re: Gold tier",
            "sponsor_org_name": "Acme",
            "sponsor_poc_name": "Dana"
        }));

        let (status, task) = send(
            &app,
            "POST",
            "/api/fulfillment-tasks",
            Some(json!({
                "thread_id": thread_id,
                "title": "Logo on flyer",
                "task_type": "flyer"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(task["priority"], "medium");
        assert_eq!(task["task_type"], "flyer");
        assert_eq!(task["completed"], false);

        let (_, listed) = send(
            &app,
            "GET",
            &format!("/api/fulfillment-tasks?thread_id={thread_id}&completed=false"),
            None,
        )
        .await;
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["thread"]["sponsor_org_name"], "Acme");
        assert_eq!(listed[0]["thread"]["subject"], "Re: Gold tier");

        let task_id = task["id"].as_str().unwrap();
        let (status, done) = send(
            &app,
            "PATCH",
            &format!("/api/fulfillment-tasks/{task_id}"),
            Some(json!({"completed": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["completed"], true);
        assert!(done["completed_at"].is_string());

        let (_, open) = send(&app, "GET", "/api/fulfillment-tasks?completed=false", None).await;
        assert!(open.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_task_is_404() {
        let app = TestApp::new();
        let (status, _) = send(
            &app,
            "PATCH",
            &format!("/api/fulfillment-tasks/{}", Uuid::new_v4()),
            Some(json!({"completed": true})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
