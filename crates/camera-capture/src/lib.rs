//! Camera Capture Library for Classroom Attendance
//!
//! Provides the frame types the attendance pipeline passes around and the
//! boundary traits for the pieces that live outside this workspace:
//! - Frame sources (camera, uploaded frames, replays)
//! - Face localization (external detector returning bounding boxes)
//! - Face crops extracted per bounding box

pub mod frame;
pub mod geometry;
pub mod source;

pub use frame::VideoFrame;
pub use geometry::{BoundingBox, Point};
pub use source::{FaceLocalizer, FrameSource, ReplaySource};

use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open frame source: {0}")]
    Open(String),

    #[error("Failed to decode frame: {0}")]
    Decode(String),

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Face localizer failed: {0}")]
    Localizer(String),

    #[error("Frame source released")]
    Released,
}

impl From<image::ImageError> for CameraError {
    fn from(err: image::ImageError) -> Self {
        CameraError::Decode(err.to_string())
    }
}
