pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::analytics::handlers as analytics;
use crate::discovery::handlers as discovery;
use crate::fulfillment::handlers as fulfillment;
use crate::mail_client::handlers as mail;
use crate::sponsors::handlers as sponsors;
use crate::state::AppState;
use crate::threads::handlers as threads;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sponsors
        .route(
            "/api/sponsors",
            get(sponsors::handle_list_sponsors).post(sponsors::handle_create_sponsor),
        )
        // Analytics
        .route("/api/analytics", get(analytics::handle_analytics))
        .route("/api/email-analytics", get(analytics::handle_email_analytics))
        .route(
            "/api/sponsor-analytics",
            get(analytics::handle_sponsor_analytics),
        )
        // Threads
        .route(
            "/api/email-threads",
            get(threads::handle_list_threads).patch(threads::handle_update_thread_by_body),
        )
        .route(
            "/api/email-threads/:id",
            get(threads::handle_get_thread).patch(threads::handle_update_thread),
        )
        // Fulfillment
        .route(
            "/api/fulfillment-tasks",
            get(fulfillment::handle_list_tasks).post(fulfillment::handle_create_task),
        )
        .route(
            "/api/fulfillment-tasks/:id",
            patch(fulfillment::handle_update_task),
        )
        // Discovery
        .route(
            "/api/discovery",
            get(discovery::handle_list_discovery).post(discovery::handle_create_discovery),
        )
        .route("/api/discovery/:id", patch(discovery::handle_update_discovery))
        // Mail
        .route("/api/mail/messages", get(mail::handle_list_messages))
        .route("/api/mail/drafts", post(mail::handle_create_draft))
        .route("/api/mail/send", post(mail::handle_send_message))
        .with_state(state)
}

/// Resolves a `?limit=` parameter against the configured default. Never below 1.
pub fn page_limit(requested: Option<i64>, default: i64) -> i64 {
    requested.unwrap_or(default).max(1)
}

/// Treats missing and blank strings alike for required form fields.
pub fn required(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
