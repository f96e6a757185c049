use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::{error::SlicerError, video::Segment};

/// Pipeline stage a video failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Open,
    Reframe,
    Output,
    /// Encoding of the 1-based clip number
    Encode(usize),
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Reframe => write!(f, "reframe"),
            Self::Output => write!(f, "output setup"),
            Self::Encode(index) => write!(f, "encode of clip {}", index),
        }
    }
}

/// A video that could not be processed; the rest of the batch carries on
#[derive(Debug, Error)]
#[error("{stage} failed for {}: {source}", .input.display())]
pub struct VideoFailure {
    pub input: PathBuf,
    pub stage: Stage,
    #[source]
    pub source: SlicerError,
}

impl VideoFailure {
    pub fn new<P: Into<PathBuf>>(input: P, stage: Stage, source: SlicerError) -> Self {
        Self {
            input: input.into(),
            stage,
            source,
        }
    }
}

/// One written (or, in a dry run, planned) output clip
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOutcome {
    pub path: PathBuf,
    pub segment: Segment,

    /// Encode calls made; 0 in a dry run
    pub attempts: usize,

    /// The clip was written by the audio-less fallback
    pub audio_dropped: bool,
}

/// Result of processing one source video
#[derive(Debug, Clone)]
pub struct VideoReport {
    pub input: PathBuf,
    pub source_size: (u32, u32),
    pub output_size: (u32, u32),
    pub duration: f64,
    pub fps: f64,
    pub segments: Vec<Segment>,
    pub clips: Vec<EncodeOutcome>,
    pub dry_run: bool,
}

impl VideoReport {
    pub fn total_attempts(&self) -> usize {
        self.clips.iter().map(|c| c.attempts).sum()
    }
}

/// Outcome of a whole run, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<Result<VideoReport, VideoFailure>>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &VideoReport> {
        self.results.iter().filter_map(|r| r.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &VideoFailure> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }

    pub fn clips_written(&self) -> usize {
        self.succeeded()
            .filter(|v| !v.dry_run)
            .map(|v| v.clips.len())
            .sum()
    }

    pub fn audio_dropped(&self) -> usize {
        self.succeeded()
            .flat_map(|v| v.clips.iter())
            .filter(|c| c.audio_dropped)
            .count()
    }

    pub fn log_summary(&self) {
        let failed = self.failed().count();
        info!(
            "Processed {} videos: {} succeeded, {} failed, {} clips written",
            self.results.len(),
            self.results.len() - failed,
            failed,
            self.clips_written()
        );

        let attempts: usize = self.succeeded().map(VideoReport::total_attempts).sum();
        if attempts > self.clips_written() {
            info!("{} encode attempts for {} clips", attempts, self.clips_written());
        }

        let dropped = self.audio_dropped();
        if dropped > 0 {
            warn!("{} clips were written without audio", dropped);
        }
        for failure in self.failed() {
            warn!("  {}", failure);
        }
    }
}
