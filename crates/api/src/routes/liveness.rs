//! Image-upload routes: stateless liveness and one-shot recognition

use axum::{body::Bytes, extract::State, Json};
use camera_capture::{CameraError, VideoFrame};
use chrono::Utc;
use liveness::{LivenessVerdict, SpoofType};
use metrics::counter;
use serde::{Deserialize, Serialize};
use session::{recognize_frame, RecognitionReport};
use std::sync::Arc;
use tracing::debug;

use crate::{ApiError, AppState};

/// Liveness verdict for an uploaded face image
#[derive(Debug, Serialize, Deserialize)]
pub struct LivenessResponse {
    #[serde(flatten)]
    pub verdict: LivenessVerdict,
    pub spoof_type: Option<SpoofType>,
}

fn require_body(body: &Bytes) -> Result<(), ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("empty image body".to_string()));
    }
    Ok(())
}

/// Treat the whole image as a face crop. No movement history exists for a
/// single image, so the movement check is left out.
pub async fn check_liveness(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<LivenessResponse>, ApiError> {
    require_body(&body)?;
    let engine = Arc::clone(&state.engine);

    let verdict = tokio::task::spawn_blocking(move || {
        let frame = VideoFrame::decode(&body)?;
        debug!(width = frame.width, height = frame.height, "Liveness upload decoded");
        Ok::<_, CameraError>(engine.detect_liveness(Some(&frame), None))
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    counter!("liveness_evaluations_total").increment(1);
    let spoof_type = verdict.spoof_type();
    Ok(Json(LivenessResponse { verdict, spoof_type }))
}

/// Detect, match and liveness-check every face in an uploaded frame,
/// recording attendance for live matches
pub async fn recognize(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<RecognitionReport>, ApiError> {
    require_body(&body)?;
    if state.recognizer.is_none() {
        return Err(ApiError::Unavailable("no face localizer configured".to_string()));
    }

    let report = tokio::task::spawn_blocking(move || {
        let recognizer = state
            .recognizer
            .as_ref()
            .ok_or_else(|| ApiError::Unavailable("no face localizer configured".to_string()))?;
        let frame = VideoFrame::decode(&body)?;
        recognize_frame(
            &frame,
            recognizer.localizer.as_ref(),
            recognizer.matcher.as_ref(),
            &recognizer.context,
            state.repository.as_ref(),
            Utc::now(),
        )
        .map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(report))
}
