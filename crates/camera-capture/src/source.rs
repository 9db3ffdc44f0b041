//! Frame sources and the face localizer boundary

use crate::frame::VideoFrame;
use crate::geometry::BoundingBox;
use crate::CameraError;
use std::collections::VecDeque;
use std::path::Path;
use tracing::{debug, info};

/// Supplies successive frames (camera, uploaded frames, replay).
pub trait FrameSource {
    /// Next frame, or `None` once the stream has ended
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError>;

    /// Release the underlying device. Called once when monitoring stops.
    fn release(&mut self) {}
}

/// External face detector.
pub trait FaceLocalizer {
    /// Bounding boxes of all faces in the frame (possibly empty)
    fn locate(&self, frame: &VideoFrame) -> Result<Vec<BoundingBox>, CameraError>;
}

impl<F> FaceLocalizer for F
where
    F: Fn(&VideoFrame) -> Result<Vec<BoundingBox>, CameraError>,
{
    fn locate(&self, frame: &VideoFrame) -> Result<Vec<BoundingBox>, CameraError> {
        self(frame)
    }
}

/// In-memory frame source replaying pre-recorded or uploaded frames.
#[derive(Debug, Default)]
pub struct ReplaySource {
    frames: VecDeque<VideoFrame>,
    next_sequence: u32,
    released: bool,
}

impl ReplaySource {
    /// Create an empty replay source
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay the given frames in order
    pub fn from_frames(frames: impl IntoIterator<Item = VideoFrame>) -> Self {
        let mut source = Self::new();
        for frame in frames {
            source.push(frame);
        }
        source
    }

    /// Decode image files from disk, in the given order
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self, CameraError> {
        let mut source = Self::new();
        for path in paths {
            let path = path.as_ref();
            let img = image::open(path)
                .map_err(|e| CameraError::Open(format!("{}: {}", path.display(), e)))?;
            source.push(VideoFrame::from_rgb_image(img.to_rgb8()));
        }
        info!("Loaded {} replay frames", source.remaining());
        Ok(source)
    }

    /// Queue a frame, assigning the next sequence number
    pub fn push(&mut self, mut frame: VideoFrame) {
        frame.sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.frames.push_back(frame);
    }

    /// Frames not yet consumed
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    /// Whether `release` has been called
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        if self.released {
            return Err(CameraError::Released);
        }
        Ok(self.frames.pop_front())
    }

    fn release(&mut self) {
        debug!(remaining = self.frames.len(), "Releasing replay source");
        self.released = true;
        self.frames.clear();
    }
}
