//! # Reframe Module
//!
//! Turns landscape (or overly tall) clips into vertical ones.
//!
//! - [`fps`] repairs missing or broken frame-rate metadata
//! - [`saliency`] scores columns of a sampled frame by edge energy
//! - [`cropper`] picks the crop window and the downscale and applies them
//!
//! ```rust,no_run
//! use reel_slicer::{config::ReframeConfig, reframe::reframe_for_vertical, video::{FfmpegEngine, MediaEngine}};
//!
//! # fn main() -> reel_slicer::Result<()> {
//! let engine = FfmpegEngine::new()?;
//! let clip = engine.open("Unedited/beach.mov".as_ref())?;
//! let vertical = reframe_for_vertical(&engine, clip, &ReframeConfig::default())?;
//! println!("{}x{}", vertical.width, vertical.height);
//! # Ok(())
//! # }
//! ```

pub mod cropper;
pub mod fps;
pub mod saliency;

pub use cropper::{plan_reframe, reframe_for_vertical, CropPlan};
pub use fps::{normalize_fps, DEFAULT_FPS};
