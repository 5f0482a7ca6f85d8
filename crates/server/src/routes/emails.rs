//! Dashboard email inbox endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use stockwatch_core::EmailLogId;

use crate::db::EmailRecord;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EmailListResponse {
    pub emails: Vec<EmailRecord>,
    pub unread: usize,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub ids: Vec<EmailLogId>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

/// Logged alert emails, newest first.
#[instrument(skip(state))]
pub async fn list_emails(
    State(state): State<AppState>,
) -> Result<Json<EmailListResponse>, AppError> {
    let emails = state.email_log.list().await?;
    let unread = emails.iter().filter(|e| !e.read).count();

    Ok(Json(EmailListResponse { emails, unread }))
}

/// Mark one email read.
#[instrument(skip(state))]
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = EmailLogId::from(id);
    if !state.email_log.mark_read(id).await? {
        return Err(AppError::NotFound(format!("email {id}")));
    }

    Ok(Json(serde_json::json!({ "message": "Email marked as read" })))
}

/// Delete a batch of emails.
#[instrument(skip(state, body))]
pub async fn delete_emails(
    State(state): State<AppState>,
    Json(body): Json<DeleteRequest>,
) -> Result<Json<DeleteResponse>, AppError> {
    if body.ids.is_empty() {
        return Err(AppError::BadRequest("no email ids given".to_string()));
    }

    let deleted = state.email_log.delete_many(&body.ids).await?;
    Ok(Json(DeleteResponse { deleted }))
}
