//! Classroom Attendance API Server
//!
//! REST surface over the liveness engine and the attendance ledger, plus
//! Prometheus metrics.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use camera_capture::FaceLocalizer;
use identity::IdentityMatcher;
use liveness::LivenessEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use session::{LogFormat, LoggingSettings, RecognitionContext, ServerSettings, Settings};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use storage::Repository;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
pub mod rate_limit;
mod routes;

pub use error::ApiError;
pub use rate_limit::{create_governor_config, RateLimitConfig};

/// External detector and matcher for the one-shot recognition route
pub struct Recognizer {
    pub localizer: Arc<dyn FaceLocalizer + Send + Sync>,
    pub matcher: Arc<dyn IdentityMatcher>,
    pub context: RecognitionContext,
}

/// Application state shared across handlers
pub struct AppState {
    pub engine: Arc<LivenessEngine>,
    pub repository: Arc<Repository>,
    /// None until a face localizer is plugged in
    pub recognizer: Option<Recognizer>,
    pub metrics: Option<PrometheusHandle>,
    pub version: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: &Settings, repository: Arc<Repository>) -> Self {
        Self {
            engine: Arc::new(LivenessEngine::new(settings.liveness.clone())),
            repository,
            recognizer: None,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn with_recognizer(mut self, recognizer: Recognizer) -> Self {
        self.recognizer = Some(recognizer);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
}

#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub liveness: String,
    pub recognition: String,
    pub storage: StorageStatus,
}

#[derive(Debug, Serialize)]
pub struct StorageStatus {
    pub students: usize,
    pub attendance_records: usize,
    pub suspicious_activities: usize,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/liveness", post(routes::liveness::check_liveness))
        .route("/api/v1/recognize", post(routes::liveness::recognize))
        .route("/api/v1/attendance/today", get(routes::attendance::get_today))
        .route("/api/v1/attendance/:date", get(routes::attendance::get_by_date))
        .route("/api/v1/students/:id/history", get(routes::attendance::get_history))
        .route("/api/v1/statistics", get(routes::attendance::get_statistics))
        .route("/api/v1/suspicious", get(routes::suspicious::get_activities))
        .route("/api/v1/suspicious/:id/resolve", post(routes::suspicious::resolve_activity))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let recognition = if state.recognizer.is_some() { "ok" } else { "disabled" };
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            liveness: "ok".to_string(),
            recognition: recognition.to_string(),
            storage: StorageStatus {
                students: state.repository.student_count(),
                attendance_records: state.repository.attendance_count(),
                suspicious_activities: state.repository.activity_count(),
            },
        },
    })
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .ok_or_else(|| ApiError::Unavailable("metrics recorder not installed".to_string()))
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&settings.level))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
}

/// Serve until `shutdown` resolves, rate limited per client IP
pub async fn run_server(
    server: &ServerSettings,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ApiError> {
    let governor = create_governor_config(&RateLimitConfig::from(server))
        .ok_or_else(|| ApiError::BadRequest("rate limit quotas must be non-zero".to_string()))?;
    let app = create_router(state).layer(GovernorLayer { config: governor });

    let listener = tokio::net::TcpListener::bind(&server.bind_addr).await?;
    info!("Starting API server on {}", server.bind_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("API server stopped");
    Ok(())
}
