use std::sync::Arc;

use crate::config::Config;
use crate::mail_client::GmailClient;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Record store built once at startup. Postgres in production, in-memory in tests.
    pub store: Arc<dyn RecordStore>,
    pub mail: GmailClient,
    pub config: Config,
}
