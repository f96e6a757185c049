//! # Pipeline Module
//!
//! Batch orchestration: input discovery, segment scheduling, per-video
//! processing with the encode fallback, and run reports.

pub mod discovery;
pub mod engine;
pub mod report;
pub mod scheduler;

pub use discovery::{clip_output_path, discover_inputs};
pub use engine::SlicingEngine;
pub use report::{BatchReport, EncodeOutcome, Stage, VideoFailure, VideoReport};
pub use scheduler::SegmentScheduler;
