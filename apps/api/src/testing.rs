//! Router-level test harness: an in-memory store behind the real router.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::config::Config;
use crate::mail_client::GmailClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::memory::MemoryStore;
use crate::store::Table;

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_mail_base("http://127.0.0.1:9")
    }

    pub fn with_mail_base(mail_base: &str) -> Self {
        let config = Config {
            database_url: "postgres://unused".to_string(),
            db_max_connections: 1,
            gmail_api_base: mail_base.to_string(),
            default_page_limit: 50,
            port: 0,
            rust_log: "debug".to_string(),
        };
        let store = Arc::new(MemoryStore::new());
        let state = AppState {
            store: store.clone(),
            mail: GmailClient::new(config.gmail_api_base.clone()).unwrap(),
            config,
        };
        Self {
            store,
            router: build_router(state),
        }
    }

    /// Seeds an `email_threads` row; `overrides` replaces any default column.
    pub fn seed_thread(&self, overrides: Value) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut row = json!({
            "id": id,
            "gmail_thread_id": format!("gm-{id}"),
            "subject": "Sponsorship inquiry",
            "participants": ["events@example.org"],
            "status": "new",
            "message_count": 1,
            "last_message_date": now,
            "created_at": now,
            "updated_at": now,
        });
        if let (Some(row), Value::Object(overrides)) = (row.as_object_mut(), overrides) {
            row.extend(overrides);
        }
        self.store.seed(Table::EmailThreads, row);
        id
    }

    /// Seeds an `email_messages` row received `age` ago.
    pub fn seed_message(&self, thread_id: Uuid, from_user: bool, age: Duration) -> Uuid {
        let id = Uuid::new_v4();
        self.store.seed(
            Table::EmailMessages,
            json!({
                "id": id,
                "thread_id": thread_id,
                "sender_name": if from_user { "Me" } else { "Sponsor Contact" },
                "sender_email": if from_user { "me@example.org" } else { "contact@sponsor.com" },
                "subject": "Re: Sponsorship inquiry",
                "snippet": "Thanks for reaching out",
                "received_date": Utc::now() - age,
                "is_from_user": from_user,
            }),
        );
        id
    }
}

pub async fn send(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_headers(app, method, uri, body, &[]).await
}

pub async fn send_with_headers(
    app: &TestApp,
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}
