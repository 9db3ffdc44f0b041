//! Monitoring Session
//!
//! Drives one camera stream through the attendance pipeline, one frame at a
//! time: detect faces, resolve identities (full re-match every N frames,
//! proximity in between), evaluate liveness, update subject trackers, then
//! emit attendance, exits and suspicious activity through the storage sink.

mod recognize;
mod report;
mod session;
mod settings;

pub use recognize::{recognize_frame, FaceRecognition, RecognitionContext, RecognitionReport};
pub use report::{DetectionReport, FrameReport, SessionEvent, SessionSummary};
pub use session::MonitoringSession;
pub use settings::{
    LogFormat, LoggingSettings, ServerSettings, SessionSettings, Settings, DEFAULT_SETTINGS_FILE,
};

use camera_capture::CameraError;
use thiserror::Error;

/// Session error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}
