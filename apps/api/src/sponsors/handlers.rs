use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::errors::AppError;
use crate::models::thread::{Thread, ThreadStatus};
use crate::routes::{page_limit, required};
use crate::sponsors::view::{build_sponsor_view, load_sponsor_views, SponsorType, SponsorView};
use crate::state::AppState;
use crate::store::{decode, to_record, Table};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSponsorRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub sponsor_type: Option<String>,
    pub contents: Option<String>,
    pub approximate_value: Option<String>,
}

/// GET /api/sponsors
pub async fn handle_list_sponsors(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<SponsorView>>, AppError> {
    let limit = page_limit(params.limit, state.config.default_page_limit);
    let sponsors = load_sponsor_views(state.store.as_ref(), limit, Utc::now()).await?;
    Ok(Json(sponsors))
}

/// POST /api/sponsors
///
/// Manually added sponsors are stored as a thread with no messages so every
/// sponsor shares one shape.
pub async fn handle_create_sponsor(
    State(state): State<AppState>,
    Json(req): Json<CreateSponsorRequest>,
) -> Result<Json<SponsorView>, AppError> {
    let (Some(name), Some(sponsor_type), Some(contents)) = (
        required(req.name),
        required(req.sponsor_type),
        required(req.contents),
    ) else {
        return Err(AppError::Validation(
            "name, type, and contents are required".to_string(),
        ));
    };

    let now = Utc::now();
    let sponsor_type = SponsorType::from_label(&sponsor_type);
    let record = to_record(&json!({
        "gmail_thread_id": format!("manual-{}", now.timestamp_millis()),
        "subject": format!("Manual sponsor: {name}"),
        "participants": [],
        "first_message_date": now,
        "last_message_date": now,
        "message_count": 0,
        "sponsor_org_name": name,
        "value_type": sponsor_type.value_type(),
        "value_description": contents,
        "estimated_value_amount": req.approximate_value,
        "status": ThreadStatus::New,
        "llm_processed": true,
        "llm_processed_at": now,
    }))?;

    let stored = state.store.insert(Table::EmailThreads, record).await?;
    let thread: Thread = decode(stored)?;
    info!("Created manual sponsor thread {} ({})", thread.id, name);

    Ok(Json(build_sponsor_view(thread, None, now)))
}
