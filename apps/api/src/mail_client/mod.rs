//! Mail client: the only module that talks to the Gmail REST API.
//!
//! Every operation is a single authenticated call (or one list call plus one
//! metadata call per message). There are no retries: failures surface to the
//! caller immediately. The access token belongs to the caller's session and
//! is passed in per call.

use std::time::Duration;

use futures::future::try_join_all;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

pub mod handlers;
pub mod message;

use message::{build_raw_message, header_value, MessageHeader};

pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Mail access token expired or was rejected")]
    AuthExpired,
}

/// Inbox listing entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MailSummary {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub from: String,
    pub date: String,
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageDetail {
    id: String,
    #[serde(default)]
    thread_id: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    payload: MessagePayload,
}

#[derive(Debug, Default, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<MessageHeader>,
}

#[derive(Debug, Deserialize)]
struct CreatedResource {
    id: String,
}

#[derive(Clone)]
pub struct GmailClient {
    client: Client,
    base_url: String,
}

impl GmailClient {
    pub fn new(base_url: String) -> Result<Self, MailError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Lists the newest inbox messages with their subject, sender and date.
    ///
    /// Metadata lookups run concurrently; any failure fails the whole listing.
    pub async fn list_recent_messages(
        &self,
        token: &str,
        max_count: u32,
    ) -> Result<Vec<MailSummary>, MailError> {
        let response = self
            .client
            .get(format!("{}/users/me/messages", self.base_url))
            .bearer_auth(token)
            .query(&[
                ("maxResults", max_count.to_string()),
                ("q", "in:inbox".to_string()),
            ])
            .send()
            .await?;
        let list: MessageList = check_status(response).await?.json().await?;
        debug!("Mail listing returned {} messages", list.messages.len());

        try_join_all(list.messages.iter().map(|m| self.fetch_summary(token, &m.id))).await
    }

    async fn fetch_summary(&self, token: &str, id: &str) -> Result<MailSummary, MailError> {
        let response = self
            .client
            .get(format!("{}/users/me/messages/{id}", self.base_url))
            .bearer_auth(token)
            .query(&[
                ("format", "metadata"),
                ("metadataHeaders", "Subject"),
                ("metadataHeaders", "From"),
                ("metadataHeaders", "Date"),
            ])
            .send()
            .await?;
        let detail: MessageDetail = check_status(response).await?.json().await?;
        let headers = &detail.payload.headers;

        Ok(MailSummary {
            subject: header_value(headers, "subject")
                .unwrap_or("No Subject")
                .to_string(),
            from: header_value(headers, "from")
                .unwrap_or("Unknown Sender")
                .to_string(),
            date: header_value(headers, "date").unwrap_or_default().to_string(),
            id: detail.id,
            thread_id: detail.thread_id,
            snippet: detail.snippet,
        })
    }

    /// Saves a draft in the user's mailbox and returns its id.
    pub async fn create_draft(
        &self,
        token: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, MailError> {
        let payload = json!({ "message": { "raw": build_raw_message(to, subject, body) } });
        self.post_created(token, "drafts", &payload).await
    }

    /// Sends a message immediately and returns the sent message id.
    pub async fn send_message(
        &self,
        token: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, MailError> {
        let payload = json!({ "raw": build_raw_message(to, subject, body) });
        self.post_created(token, "messages/send", &payload).await
    }

    async fn post_created(
        &self,
        token: &str,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> Result<String, MailError> {
        let response = self
            .client
            .post(format!("{}/users/me/{endpoint}", self.base_url))
            .bearer_auth(token)
            .json(payload)
            .send()
            .await?;
        let created: CreatedResource = check_status(response).await?.json().await?;
        Ok(created.id)
    }
}

async fn check_status(response: Response) -> Result<Response, MailError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(MailError::AuthExpired);
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(MailError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}
