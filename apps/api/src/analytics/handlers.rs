use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analytics::aggregate::{aggregate, AnalyticsSummary, SponsorStats, ThreadStats};
use crate::errors::AppError;
use crate::models::thread::Thread;
use crate::state::AppState;
use crate::store::{fetch_all, RecordQuery, Table};

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    #[serde(flatten)]
    pub summary: AnalyticsSummary,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct EmailAnalyticsResponse {
    #[serde(flatten)]
    pub stats: ThreadStats,
    pub last_updated: DateTime<Utc>,
}

async fn summarize(state: &AppState) -> Result<AnalyticsSummary, AppError> {
    let threads: Vec<Thread> =
        fetch_all(state.store.as_ref(), Table::EmailThreads, RecordQuery::new()).await?;
    Ok(aggregate(&threads, Utc::now()))
}

/// GET /api/analytics
pub async fn handle_analytics(
    State(state): State<AppState>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let summary = summarize(&state).await?;
    Ok(Json(AnalyticsResponse {
        summary,
        last_updated: Utc::now(),
    }))
}

/// GET /api/email-analytics
pub async fn handle_email_analytics(
    State(state): State<AppState>,
) -> Result<Json<EmailAnalyticsResponse>, AppError> {
    let summary = summarize(&state).await?;
    Ok(Json(EmailAnalyticsResponse {
        stats: summary.threads,
        last_updated: Utc::now(),
    }))
}

/// GET /api/sponsor-analytics
pub async fn handle_sponsor_analytics(
    State(state): State<AppState>,
) -> Result<Json<SponsorStats>, AppError> {
    Ok(Json(summarize(&state).await?.sponsors))
}
