use serde::{Deserialize, Serialize};

use crate::video::types::Segment;

/// Encoder settings for one output clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeParams {
    /// Video codec passed to the encoder (e.g. `libx264`)
    pub video_codec: String,

    /// Audio codec, or `None` to drop the audio track (`"none"` in config files)
    #[serde(with = "audio_codec")]
    pub audio_codec: Option<String>,

    /// Output frame rate. Filled in per segment from the clip's rate.
    #[serde(skip)]
    pub fps: Option<f64>,

    pub bitrate: String,
    pub audio_bitrate: String,

    /// Encoder speed/quality preset
    pub preset: String,

    /// Constant rate factor
    pub crf: u8,

    pub max_rate: String,
    pub buffer_size: String,

    /// Encoder thread count
    pub threads: usize,

    /// Output container extension, without the dot
    pub container: String,

    pub pixel_format: String,
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: Some("aac".to_string()),
            fps: None,
            bitrate: "8000k".to_string(),
            audio_bitrate: "192k".to_string(),
            preset: "slow".to_string(),
            crf: 18,
            max_rate: "10M".to_string(),
            buffer_size: "15M".to_string(),
            threads: 4,
            container: "mp4".to_string(),
            pixel_format: "yuv420p".to_string(),
        }
    }
}

impl EncodeParams {
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn without_audio(mut self) -> Self {
        self.audio_codec = None;
        self
    }

    pub fn has_audio(&self) -> bool {
        self.audio_codec.is_some()
    }
}

mod audio_codec {
    use serde::{Deserialize, Deserializer, Serializer};

    const NONE: &str = "none";

    pub fn serialize<S: Serializer>(codec: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(codec.as_deref().unwrap_or(NONE))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let codec = String::deserialize(deserializer)?;
        Ok((!codec.eq_ignore_ascii_case(NONE) && !codec.trim().is_empty()).then_some(codec))
    }
}

/// One segment to encode with a given parameter set
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeRequest {
    pub segment: Segment,
    pub params: EncodeParams,
}

impl EncodeRequest {
    pub fn new(segment: Segment, params: EncodeParams) -> Self {
        Self { segment, params }
    }

    /// Parameter sets to try in order: as requested, then without audio.
    ///
    /// A request that already has no audio yields a single attempt.
    pub fn attempt_plan(&self) -> Vec<EncodeParams> {
        let mut plan = vec![self.params.clone()];
        if self.params.has_audio() {
            plan.push(self.params.clone().without_audio());
        }
        plan
    }
}
