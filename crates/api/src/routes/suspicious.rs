//! Suspicious activity routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::SuspiciousActivity;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    /// List resolved instead of open activities
    #[serde(default)]
    pub resolved: bool,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub data: Vec<SuspiciousActivity>,
    pub count: usize,
}

pub async fn get_activities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActivityQuery>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let data = state
        .repository
        .suspicious_activities(params.resolved, params.limit.min(500))?;
    Ok(Json(ActivityResponse {
        count: data.len(),
        data,
    }))
}

pub async fn resolve_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.repository.resolve_activity(id)?;
    Ok(StatusCode::NO_CONTENT)
}
