use image::{ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, VideoError};

/// A single decoded video frame
///
/// Thin wrapper around an RGB8 image buffer. Frames are sampled on demand
/// for analysis and are never cached.
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| Rgb(color));
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let pixel = self.buffer.get_pixel(x, y);
        [pixel[0], pixel[1], pixel[2]]
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.buffer.put_pixel(x, y, Rgb(color));
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Save the frame as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> std::result::Result<(), image::ImageError> {
        self.buffer.save(path)
    }
}

/// Integer aspect ratio, e.g. 9:16
///
/// Kept as a pair of integers so ratio comparisons and crop sizes are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const VERTICAL: Self = Self { width: 9, height: 16 };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_f64(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Compare `w/h` against this ratio without floating point
    pub fn compare(&self, w: u32, h: u32) -> std::cmp::Ordering {
        let lhs = w as u64 * self.height as u64;
        let rhs = h as u64 * self.width as u64;
        lhs.cmp(&rhs)
    }

    /// `floor(h * ratio)`
    pub fn width_for_height(&self, h: u32) -> u32 {
        (h as u64 * self.width as u64 / self.height as u64) as u32
    }

    /// `floor(w / ratio)`
    pub fn height_for_width(&self, w: u32) -> u32 {
        (w as u64 * self.height as u64 / self.width as u64) as u32
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::VERTICAL
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// Rectangular crop in source pixel coordinates
///
/// Invariant: `x1 < x2 <= width` and `y1 < y2 <= height` of the clip it was
/// built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl CropWindow {
    /// Build a crop window, checking it fits inside a `width` x `height` picture
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32, width: u32, height: u32) -> Result<Self> {
        if x1 >= x2 || y1 >= y2 || x2 > width || y2 > height {
            return Err(VideoError::InvalidParameters {
                details: format!(
                    "crop ({}, {})-({}, {}) does not fit {}x{}",
                    x1, y1, x2, y2, width, height
                ),
            }
            .into());
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

/// A video transform the media engine applies while decoding or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoTransform {
    Crop(CropWindow),
    Scale { width: u32, height: u32 },
}

/// Reference to a decoded video stream
///
/// Handles are plain values: cropping, scaling or repairing metadata returns
/// a new handle and leaves the original untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipHandle {
    /// Source file the stream was opened from
    pub source: PathBuf,

    pub width: u32,
    pub height: u32,

    /// Duration in seconds
    pub duration: f64,

    /// Frame rate; `None` when the container did not report a usable one
    pub fps: Option<f64>,

    pub has_audio: bool,

    /// Transforms applied on top of the source stream, in order
    pub transforms: Vec<VideoTransform>,
}

impl ClipHandle {
    pub fn new<P: Into<PathBuf>>(source: P, width: u32, height: u32, duration: f64, fps: Option<f64>) -> Self {
        Self {
            source: source.into(),
            width,
            height,
            duration,
            fps,
            has_audio: true,
            transforms: Vec::new(),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Handle for the cropped stream
    pub fn cropped(&self, window: CropWindow) -> Self {
        let mut clip = self.clone();
        clip.width = window.width();
        clip.height = window.height();
        clip.transforms.push(VideoTransform::Crop(window));
        clip
    }

    /// Handle for the stream scaled to `width` x `height`
    pub fn resized(&self, width: u32, height: u32) -> Self {
        let mut clip = self.clone();
        clip.width = width;
        clip.height = height;
        clip.transforms.push(VideoTransform::Scale { width, height });
        clip
    }

    /// Handle describing the `[start, end)` sub-range of this clip
    ///
    /// Only metadata changes; the range itself is passed to the engine at
    /// encode time.
    pub fn subclip(&self, start: f64, end: f64) -> Self {
        let mut clip = self.clone();
        clip.duration = (end - start).max(0.0);
        clip
    }

    pub fn with_fps(&self, fps: f64) -> Self {
        let mut clip = self.clone();
        clip.fps = Some(fps);
        clip
    }
}

/// A time window `[start, end)` of a clip, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
