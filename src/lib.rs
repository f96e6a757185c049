//! # Reel-Slicer
//!
//! Batch-convert videos into vertical 9:16 clips for short-form social video.
//!
//! Each source is cropped around its most edge-dense vertical band instead
//! of a blind center crop, bounded to 1080x1920, and cut into 3-15 second
//! clips that are encoded one by one.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reel_slicer::{config::Config, pipeline::SlicingEngine, video::FfmpegEngine};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let slicer = SlicingEngine::new(config, FfmpegEngine::new()?)?;
//!
//! let report = slicer.run()?;
//! println!("{} clips written", report.clips_written());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`video`] - clip and frame types, encoder settings, the [`MediaEngine`](video::MediaEngine) seam
//! - [`reframe`] - frame-rate repair and the edge-energy smart crop
//! - [`pipeline`] - segment scheduling and batch orchestration
//! - [`config`] - configuration management
//!
//! ## Other Backends
//!
//! The pipeline only talks to media through [`MediaEngine`](video::MediaEngine):
//!
//! ```rust,no_run
//! use std::path::Path;
//! use reel_slicer::{video::{ClipHandle, EncodeParams, Frame, MediaEngine}, Result};
//!
//! struct MyEngine;
//!
//! impl MediaEngine for MyEngine {
//!     fn name(&self) -> &str {
//!         "mine"
//!     }
//!
//!     fn open(&self, path: &Path) -> Result<ClipHandle> {
//!         Ok(ClipHandle::new(path, 1920, 1080, 60.0, Some(30.0)))
//!     }
//!
//!     fn get_frame(&self, _clip: &ClipHandle, _timestamp: f64) -> Result<Frame> {
//!         Ok(Frame::new_filled(1920, 1080, [0, 0, 0]))
//!     }
//!
//!     fn encode_range(&self, _clip: &ClipHandle, _start: f64, _end: f64, _output: &Path, _params: &EncodeParams) -> Result<()> {
//!         Ok(())
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod reframe;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{Result, SlicerError},
    pipeline::SlicingEngine,
    video::MediaEngine,
};
