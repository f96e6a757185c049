use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    reframe::DEFAULT_FPS,
    video::{AspectRatio, EncodeParams},
};

/// Main configuration for reel-slicer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input and output locations
    pub paths: PathsConfig,

    /// Crop and resize settings
    pub reframe: ReframeConfig,

    /// Segment length bounds
    pub segments: SegmentConfig,

    /// Encoder settings for every output clip
    pub encoding: EncodeParams,

    /// How the batch is run
    pub batch: BatchConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.paths.validate()?;
        self.reframe.validate()?;
        self.segments.validate()?;
        validate_encoding(&self.encoding)?;
        Ok(())
    }
}

fn invalid<K: Into<String>, V: ToString>(key: K, value: V) -> crate::error::SlicerError {
    ConfigError::InvalidValue {
        key: key.into(),
        value: value.to_string(),
    }
    .into()
}

/// Input and output folders
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Folder scanned for source videos
    pub input_dir: PathBuf,

    /// Folder the clips are written to (created if missing)
    pub output_dir: PathBuf,

    /// Accepted source extensions, matched case-insensitively
    pub extensions: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("Unedited"),
            output_dir: PathBuf::from("Edited"),
            extensions: vec!["mov".to_string(), "mp4".to_string()],
        }
    }
}

impl PathsConfig {
    fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(invalid("paths.extensions", "[]"));
        }
        Ok(())
    }
}

/// Crop and resize configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReframeConfig {
    /// Output aspect ratio
    pub target_aspect: AspectRatio,

    pub max_width: u32,
    pub max_height: u32,

    /// Frame rate assumed when a clip reports none
    pub default_fps: f64,

    /// Timestamp of the frame sampled for edge analysis (seconds)
    pub sample_time: f64,
}

impl Default for ReframeConfig {
    fn default() -> Self {
        Self {
            target_aspect: AspectRatio::VERTICAL,
            max_width: 1080,
            max_height: 1920,
            default_fps: DEFAULT_FPS,
            sample_time: 0.0,
        }
    }
}

impl ReframeConfig {
    fn validate(&self) -> Result<()> {
        if self.target_aspect.width == 0 || self.target_aspect.height == 0 {
            return Err(invalid("reframe.target_aspect", self.target_aspect));
        }

        if self.max_width == 0 || self.max_height == 0 {
            return Err(invalid("reframe.max_size", format!("{}x{}", self.max_width, self.max_height)));
        }

        if !self.default_fps.is_finite() || self.default_fps <= 0.0 {
            return Err(invalid("reframe.default_fps", self.default_fps));
        }

        if !self.sample_time.is_finite() || self.sample_time < 0.0 {
            return Err(invalid("reframe.sample_time", self.sample_time));
        }

        Ok(())
    }
}

/// Segment length bounds in seconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Shortest segment worth emitting; shorter tails merge into the previous one
    pub min_len: f64,

    /// Longest segment
    pub max_len: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_len: 3.0,
            max_len: 15.0,
        }
    }
}

impl SegmentConfig {
    fn validate(&self) -> Result<()> {
        let finite = self.min_len.is_finite() && self.max_len.is_finite();
        if !finite || self.min_len <= 0.0 || self.max_len < self.min_len {
            return Err(invalid(
                "segments.length_range",
                format!("{}-{}", self.min_len, self.max_len),
            ));
        }
        Ok(())
    }
}

fn validate_encoding(params: &EncodeParams) -> Result<()> {
    if params.video_codec.trim().is_empty() {
        return Err(invalid("encoding.video_codec", "\"\""));
    }

    if params.crf > 51 {
        return Err(invalid("encoding.crf", params.crf));
    }

    if params.threads == 0 {
        return Err(invalid("encoding.threads", params.threads));
    }

    if params.container.trim().is_empty() || params.container.starts_with('.') {
        return Err(invalid("encoding.container", &params.container));
    }

    Ok(())
}

/// Batch execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Videos processed at once; 1 runs them in order, 0 uses one per CPU
    pub parallel_jobs: usize,

    /// Plan crops and segments without encoding anything
    pub dry_run: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel_jobs: 1,
            dry_run: false,
        }
    }
}

impl BatchConfig {
    /// Worker count with `0` resolved to the CPU count
    pub fn effective_jobs(&self) -> usize {
        if self.parallel_jobs == 0 {
            num_cpus::get()
        } else {
            self.parallel_jobs
        }
    }
}
