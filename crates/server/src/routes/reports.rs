//! History report endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use stockwatch_core::{HistoryEntry, ReportPeriod};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// Anchor date inside the wanted period, `YYYY-MM-DD`.
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub period: &'static str,
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct SendReportResponse {
    pub message: String,
    pub subject: String,
    pub entry_count: usize,
}

fn parse_period(period: &str) -> Result<ReportPeriod, AppError> {
    period
        .parse()
        .map_err(|_| AppError::BadRequest(format!("unknown report period: {period}")))
}

fn parse_date(query: &ReportQuery) -> Result<Option<NaiveDate>, AppError> {
    match &query.date {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("invalid date: {raw}"))),
    }
}

/// Full retained check history, newest first.
#[instrument(skip(state))]
pub async fn list_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    Ok(Json(state.history.list_all().await?))
}

/// History entries for the period containing the anchor date, or the
/// full history when no date is given.
#[instrument(skip(state))]
pub async fn get_report(
    State(state): State<AppState>,
    Path(period): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportResponse>, AppError> {
    let period = parse_period(&period)?;
    let date = parse_date(&query)?;

    let entries = state.history.for_period(period, date).await?;

    Ok(Json(ReportResponse {
        period: period.as_str(),
        entries,
    }))
}

/// Email a summary report covering the period containing the anchor date.
#[instrument(skip(state))]
pub async fn send_report(
    State(state): State<AppState>,
    Path(period): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<SendReportResponse>, AppError> {
    let period = parse_period(&period)?;
    // A report email always covers one period; no date means today's.
    let date = parse_date(&query)?.unwrap_or_else(|| Utc::now().date_naive());

    let entries = state.history.for_period(period, Some(date)).await?;
    let rendered = state.notifier.send_report(period, &entries).await?;

    Ok(Json(SendReportResponse {
        message: format!("{} report sent", period.display_name()),
        subject: rendered.subject,
        entry_count: entries.len(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period_rejects_unknown() {
        assert!(parse_period("daily").is_ok());
        assert!(parse_period("hourly").is_err());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        let query = ReportQuery {
            date: Some("03/14/2025".to_owned()),
        };
        assert!(parse_date(&query).is_err());
    }

    #[test]
    fn test_parse_date_absent_means_no_filter() {
        let query = ReportQuery { date: None };
        assert_eq!(parse_date(&query).unwrap(), None);
    }

    #[test]
    fn test_parse_date_accepts_iso() {
        let query = ReportQuery {
            date: Some("2025-03-14".to_owned()),
        };
        let parsed = parse_date(&query).unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2025, 3, 14));
    }
}
