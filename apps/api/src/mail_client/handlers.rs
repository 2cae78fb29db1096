//! Axum route handlers for the mail integration.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::mail_client::message::is_single_line;
use crate::mail_client::MailSummary;
use crate::routes::required;
use crate::state::AppState;

const DEFAULT_LIST_SIZE: u32 = 10;
const MAX_LIST_SIZE: u32 = 100;

/// The mail access token from the caller's `Authorization: Bearer` header.
/// Issued by the identity provider that owns the user's session.
pub struct ProviderToken(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ProviderToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| ProviderToken(t.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    pub max: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct OutgoingMail {
    pub to: Option<String>,
    pub subject: Option<String>,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct DraftCreated {
    pub draft_id: String,
}

#[derive(Debug, Serialize)]
pub struct MessageSent {
    pub message_id: String,
}

/// GET /api/mail/messages
pub async fn handle_list_messages(
    State(state): State<AppState>,
    ProviderToken(token): ProviderToken,
    Query(params): Query<ListMessagesQuery>,
) -> Result<Json<Vec<MailSummary>>, AppError> {
    let max = params
        .max
        .unwrap_or(DEFAULT_LIST_SIZE)
        .clamp(1, MAX_LIST_SIZE);
    Ok(Json(state.mail.list_recent_messages(&token, max).await?))
}

/// POST /api/mail/drafts
pub async fn handle_create_draft(
    State(state): State<AppState>,
    ProviderToken(token): ProviderToken,
    Json(req): Json<OutgoingMail>,
) -> Result<Json<DraftCreated>, AppError> {
    let (to, subject) = validate_outgoing(&req)?;
    let draft_id = state
        .mail
        .create_draft(&token, &to, &subject, &req.body)
        .await?;
    info!("Created mail draft {draft_id}");
    Ok(Json(DraftCreated { draft_id }))
}

/// POST /api/mail/send
pub async fn handle_send_message(
    State(state): State<AppState>,
    ProviderToken(token): ProviderToken,
    Json(req): Json<OutgoingMail>,
) -> Result<Json<MessageSent>, AppError> {
    let (to, subject) = validate_outgoing(&req)?;
    let message_id = state
        .mail
        .send_message(&token, &to, &subject, &req.body)
        .await?;
    info!("Sent mail message {message_id}");
    Ok(Json(MessageSent { message_id }))
}

fn validate_outgoing(req: &OutgoingMail) -> Result<(String, String), AppError> {
    let (Some(to), Some(subject)) = (required(req.to.clone()), required(req.subject.clone()))
    else {
        return Err(AppError::Validation("to and subject are required".to_string()));
    };
    if !is_single_line(&to) || !is_single_line(&subject) {
        return Err(AppError::Validation(
            "to and subject must not contain line breaks".to_string(),
        ));
    }
    Ok((to, subject))
}
