//! # Video Module
//!
//! Clip and frame types, encoder settings, and the media engine seam the
//! pipeline decodes and encodes through.

pub mod encoding;
pub mod engine;
pub mod ffmpeg;
pub mod types;

pub use encoding::{EncodeParams, EncodeRequest};
pub use engine::{MediaEngine, OpenClip};
pub use ffmpeg::FfmpegEngine;
pub use types::{AspectRatio, ClipHandle, CropWindow, Frame, Segment, VideoTransform};
