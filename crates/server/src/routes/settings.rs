//! Notification settings endpoints.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::instrument;

use stockwatch_core::{Email, NotificationSettings};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SavedResponse {
    pub message: String,
    pub settings: NotificationSettings,
}

/// Current settings; defaults when nothing has been saved yet.
#[instrument(skip(state))]
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<NotificationSettings>, AppError> {
    Ok(Json(state.settings.get().await?))
}

/// Upsert the settings. Fields absent from the body take their
/// defaults, so posts are effectively whole-object replacement.
#[instrument(skip(state, body))]
pub async fn save_settings(
    State(state): State<AppState>,
    Json(body): Json<NotificationSettings>,
) -> Result<Json<SavedResponse>, AppError> {
    // An empty address means "no email"; anything else must be valid.
    if !body.email.is_empty() {
        body.email
            .parse::<Email>()
            .map_err(|e| AppError::BadRequest(format!("invalid notification email: {e}")))?;
    }

    state.settings.save(&body).await?;

    Ok(Json(SavedResponse {
        message: "Settings saved".to_string(),
        settings: body,
    }))
}
