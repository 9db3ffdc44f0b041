//! Video frame types and processing

use crate::geometry::BoundingBox;
use crate::CameraError;
use image::{GrayImage, RgbImage};

/// Decoded RGB video frame. Face crops are frames too.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Frame of a single solid color
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Self::new(data, width, height, 0, 0)
    }

    /// Wrap an `image` RGB buffer
    pub fn from_rgb_image(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, 0, 0)
    }

    /// Decode an encoded image (JPEG, PNG, ...) into an RGB frame
    pub fn decode(bytes: &[u8]) -> Result<Self, CameraError> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_rgb_image(img.to_rgb8()))
    }

    /// True when the frame has no pixels or its buffer does not match its size
    pub fn is_degenerate(&self) -> bool {
        self.width == 0
            || self.height == 0
            || self.data.len() != (self.width as usize) * (self.height as usize) * 3
    }

    /// Number of pixels
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        let px = self.data.get(idx..idx + 3)?;
        Some([px[0], px[1], px[2]])
    }

    /// Convert to grayscale
    pub fn to_grayscale(&self) -> Vec<u8> {
        let mut gray = Vec::with_capacity(self.pixel_count());
        for pixel in self.data.chunks_exact(3) {
            // Luminance formula: 0.299*R + 0.587*G + 0.114*B, rounded
            let y = pixel[0] as f32 * 0.299 + pixel[1] as f32 * 0.587 + pixel[2] as f32 * 0.114;
            gray.push(y.round().min(255.0) as u8);
        }
        gray
    }

    /// Borrow as an `image` RGB buffer (None if degenerate)
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        if self.is_degenerate() {
            return None;
        }
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    /// Grayscale `image` buffer (None if degenerate)
    pub fn to_gray_image(&self) -> Option<GrayImage> {
        if self.is_degenerate() {
            return None;
        }
        GrayImage::from_raw(self.width, self.height, self.to_grayscale())
    }

    /// Crop a region of the frame
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Option<VideoFrame> {
        if w == 0 || h == 0 || x + w > self.width || y + h > self.height || self.is_degenerate() {
            return None;
        }

        let mut cropped = Vec::with_capacity((w * h * 3) as usize);
        for row in y..(y + h) {
            let start = ((row * self.width + x) * 3) as usize;
            let end = start + (w * 3) as usize;
            cropped.extend_from_slice(&self.data[start..end]);
        }

        Some(VideoFrame {
            data: cropped,
            width: w,
            height: h,
            timestamp_ns: self.timestamp_ns,
            sequence: self.sequence,
        })
    }

    /// Crop the face region described by a detector bounding box,
    /// clamped to the frame.
    pub fn crop_box(&self, bbox: &BoundingBox) -> Option<VideoFrame> {
        let (x, y, w, h) = bbox.clamp_to(self.width, self.height)?;
        self.crop(x, y, w, h)
    }
}
