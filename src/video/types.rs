use std::fmt;

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// Represents a single 3-channel video frame
///
/// This is a thin wrapper around an RGB image buffer. Frames coming out of
/// a [`FrameSource`](crate::video::FrameSource) are always this shape; raw
/// buffers from elsewhere go through [`Frame::from_raw`].
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    pub const CHANNELS: u8 = 3;

    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb(color));
        Self { buffer }
    }

    /// Create a frame from an interleaved byte buffer, checking its shape
    pub fn from_raw(
        width: u32,
        height: u32,
        channels: u8,
        data: Vec<u8>,
    ) -> Result<Self, FrameError> {
        if channels != Self::CHANNELS {
            return Err(FrameError::ChannelCount {
                expected: Self::CHANNELS,
                actual: channels,
            });
        }
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }

        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                width,
                height,
                channels,
                expected,
                actual: data.len(),
            });
        }

        ImageBuffer::from_raw(width, height, data)
            .map(|buffer| Self { buffer })
            .ok_or(FrameError::BufferSize {
                width,
                height,
                channels,
                expected,
                actual: 0,
            })
    }

    /// Get the width of the frame
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Get the height of the frame
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Fail unless the frame holds at least one pixel
    pub fn ensure_not_empty(&self) -> Result<(), FrameError> {
        let (width, height) = self.dimensions();
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }
        Ok(())
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.buffer.put_pixel(x, y, Rgb(color));
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Interleaved RGB bytes, row major
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Save the frame as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.buffer.save(path)
    }
}

/// Binary edge mask: every pixel is exactly 0 or 255
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeMask {
    buffer: GrayImage,
}

impl EdgeMask {
    pub const EDGE: u8 = 255;
    pub const BACKGROUND: u8 = 0;

    /// An all-background mask
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            buffer: GrayImage::new(width, height),
        }
    }

    /// Wrap bytes produced by a stage that only ever writes 0 and 255.
    pub(crate) fn from_binary_vec(
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> Result<Self, FrameError> {
        debug_assert!(data.iter().all(|&v| v == Self::EDGE || v == Self::BACKGROUND));
        let actual = data.len();
        GrayImage::from_raw(width, height, data)
            .map(|buffer| Self { buffer })
            .ok_or(FrameError::BufferSize {
                width,
                height,
                channels: 1,
                expected: width as usize * height as usize,
                actual,
            })
    }

    /// Create a mask from single-channel bytes, rejecting non-binary values
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }

        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                width,
                height,
                channels: 1,
                expected,
                actual: data.len(),
            });
        }

        if let Some(index) = data
            .iter()
            .position(|&v| v != Self::EDGE && v != Self::BACKGROUND)
        {
            return Err(FrameError::NonBinaryMask {
                x: (index % width as usize) as u32,
                y: (index / width as usize) as u32,
                value: data[index],
            });
        }

        GrayImage::from_raw(width, height, data)
            .map(|buffer| Self { buffer })
            .ok_or(FrameError::Empty { width, height })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.buffer.get_pixel(x, y).0[0]
    }

    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        self.get(x, y) == Self::EDGE
    }

    /// Mark a pixel as edge (`true`) or background (`false`)
    pub fn set(&mut self, x: u32, y: u32, edge: bool) {
        let value = if edge { Self::EDGE } else { Self::BACKGROUND };
        self.buffer.put_pixel(x, y, Luma([value]));
    }

    /// Number of edge pixels
    pub fn edge_count(&self) -> usize {
        self.buffer.as_raw().iter().filter(|&&v| v == Self::EDGE).count()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.buffer
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }
}

/// Exact rational frame rate, as containers store it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// Parse `"30000/1001"` or `"25"`
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let rate = match value.split_once('/') {
            Some((num, den)) => Self::new(num.trim().parse().ok()?, den.trim().parse().ok()?),
            None => Self::new(value.parse().ok()?, 1),
        };
        rate.is_valid().then_some(rate)
    }

    pub fn is_valid(&self) -> bool {
        self.num > 0 && self.den > 0
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Duration of one frame
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.den as f64 / self.num as f64)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Stream properties read once when a source is opened
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    pub duration: Option<f64>,
    pub frame_count: Option<u64>,
    pub codec: String,
}

impl VideoMetadata {
    pub fn fps(&self) -> f64 {
        self.frame_rate.as_f64()
    }

    /// Size in bytes of one RGB frame
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * Frame::CHANNELS as usize
    }

    /// Best known frame total: container count, else duration times rate
    pub fn estimated_frames(&self) -> Option<u64> {
        self.frame_count
            .filter(|&count| count > 0)
            .or_else(|| self.duration.map(|d| (d * self.fps()).round() as u64))
    }
}
