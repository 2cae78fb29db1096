use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::discovery::{DiscoveryItem, DiscoveryStatus};
use crate::routes::required;
use crate::state::AppState;
use crate::store::{decode, fetch_all, to_record, Record, RecordQuery, Table};

#[derive(Debug, Deserialize)]
pub struct CreateDiscoveryRequest {
    pub name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDiscoveryRequest {
    pub status: Option<DiscoveryStatus>,
    pub notes: Option<String>,
}

/// GET /api/discovery
pub async fn handle_list_discovery(
    State(state): State<AppState>,
) -> Result<Json<Vec<DiscoveryItem>>, AppError> {
    let items = fetch_all(
        state.store.as_ref(),
        Table::Discovery,
        RecordQuery::new().order_by("created_at", false),
    )
    .await?;
    Ok(Json(items))
}

/// POST /api/discovery
pub async fn handle_create_discovery(
    State(state): State<AppState>,
    Json(req): Json<CreateDiscoveryRequest>,
) -> Result<Json<DiscoveryItem>, AppError> {
    let name =
        required(req.name).ok_or_else(|| AppError::Validation("name is required".to_string()))?;

    let record = to_record(&json!({
        "name": name,
        "status": DiscoveryStatus::New,
        "notes": req.notes,
    }))?;
    let item: DiscoveryItem = decode(state.store.insert(Table::Discovery, record).await?)?;
    info!("Added discovery prospect {}", item.id);
    Ok(Json(item))
}

/// PATCH /api/discovery/:id
pub async fn handle_update_discovery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDiscoveryRequest>,
) -> Result<Json<DiscoveryItem>, AppError> {
    let mut changes = Record::new();
    if let Some(status) = req.status {
        changes.insert("status".into(), json!(status));
    }
    if let Some(notes) = req.notes {
        changes.insert("notes".into(), json!(notes));
    }
    if changes.is_empty() {
        return Err(AppError::Validation("Nothing to update".to_string()));
    }

    let updated = state
        .store
        .update(Table::Discovery, id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Discovery item {id} not found")))?;
    Ok(Json(decode(updated)?))
}
