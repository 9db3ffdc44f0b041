//! Attendance ledger routes

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{AttendanceRecord, AttendanceStats, AttendanceView};

use crate::{ApiError, AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct AttendanceResponse {
    pub date: NaiveDate,
    pub data: Vec<AttendanceView>,
    pub count: usize,
    pub present_count: usize,
}

impl AttendanceResponse {
    fn new(date: NaiveDate, data: Vec<AttendanceView>) -> Self {
        Self {
            date,
            count: data.len(),
            present_count: data.iter().filter(|v| v.exit_time.is_none()).count(),
            data,
        }
    }
}

/// Today's attendance (UTC calendar day)
pub async fn get_today(State(state): State<Arc<AppState>>) -> Result<Json<AttendanceResponse>, ApiError> {
    let now = Utc::now();
    let data = state.repository.today(now)?;
    Ok(Json(AttendanceResponse::new(now.date_naive(), data)))
}

/// Attendance for `YYYY-MM-DD`
pub async fn get_by_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<AttendanceResponse>, ApiError> {
    let data = state.repository.attendance_on(date)?;
    Ok(Json(AttendanceResponse::new(date, data)))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    30
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub subject_id: String,
    pub data: Vec<AttendanceRecord>,
    pub count: usize,
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(subject_id): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let data = state.repository.subject_history(&subject_id, params.limit.min(365))?;
    Ok(Json(HistoryResponse {
        subject_id,
        count: data.len(),
        data,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Aggregates, optionally over an inclusive date range
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<AttendanceStats>, ApiError> {
    let range = match (params.from, params.to) {
        (Some(from), Some(to)) if from <= to => Some((from, to)),
        (Some(_), Some(_)) => return Err(ApiError::BadRequest("`from` is after `to`".to_string())),
        (None, None) => None,
        _ => return Err(ApiError::BadRequest("`from` and `to` go together".to_string())),
    };
    Ok(Json(state.repository.statistics(range)?))
}
