// src/video/ffmpeg.rs - MediaEngine backed by the ffmpeg/ffprobe executables

use std::path::Path;
use std::process::{Command, Stdio};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{EncodeErrorKind, Result, SlicerError, VideoError};
use crate::video::encoding::EncodeParams;
use crate::video::engine::MediaEngine;
use crate::video::types::{ClipHandle, Frame, VideoTransform};

/// Stderr fragments that mean ffmpeg rejected the requested parameters
/// rather than failing on the input or the filesystem.
const PARAMETER_REJECTIONS: &[&str] = &[
    "Error while opening encoder",
    "Error initializing output stream",
    "Unknown encoder",
    "incorrect parameters",
    "Could not find tag for codec",
    "not currently supported in container",
    "Unrecognized option",
    "Option not found",
    "Encoder not found",
];

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
}

/// Media engine that shells out to `ffmpeg` and `ffprobe`
pub struct FfmpegEngine {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegEngine {
    /// Create an engine using `ffmpeg`/`ffprobe` from PATH
    pub fn new() -> Result<Self> {
        Self::with_binaries("ffmpeg", "ffprobe")
    }

    pub fn with_binaries<S: Into<String>>(ffmpeg: S, ffprobe: S) -> Result<Self> {
        let engine = Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        };

        for binary in [&engine.ffmpeg, &engine.ffprobe] {
            let available = Command::new(binary)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|status| status.success())
                .unwrap_or(false);

            if !available {
                return Err(VideoError::EngineUnavailable {
                    reason: format!("`{} -version` failed", binary),
                }
                .into());
            }
        }

        info!("Initialized ffmpeg media engine ({}, {})", engine.ffmpeg, engine.ffprobe);
        Ok(engine)
    }

    fn probe(&self, path: &Path) -> Result<FfprobeOutput> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| SlicerError::decode(path.display(), format!("ffprobe did not run: {}", e)))?;

        if !output.status.success() {
            return Err(SlicerError::decode(
                path.display(),
                format!("ffprobe failed: {}", String::from_utf8_lossy(&output.stderr).trim()),
            ));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| SlicerError::decode(path.display(), format!("invalid ffprobe output: {}", e)))
    }
}

impl MediaEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn open(&self, path: &Path) -> Result<ClipHandle> {
        if !path.is_file() {
            return Err(SlicerError::decode(path.display(), "file not found"));
        }

        let probe = self.probe(path)?;
        clip_from_probe(path, &probe)
    }

    fn get_frame(&self, clip: &ClipHandle, timestamp: f64) -> Result<Frame> {
        if !timestamp.is_finite() || timestamp < 0.0 || timestamp > clip.duration {
            return Err(SlicerError::decode(
                clip.source.display(),
                format!("timestamp {:.3}s outside 0-{:.3}s", timestamp, clip.duration),
            ));
        }

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-v", "error", "-ss", &format!("{:.3}", timestamp), "-i"])
            .arg(&clip.source);
        if let Some(chain) = filter_chain(&clip.transforms) {
            cmd.args(["-vf", &chain]);
        }
        cmd.args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "pipe:1"]);

        debug!("Sampling frame at {:.3}s from {}", timestamp, clip.source.display());

        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|e| SlicerError::decode(clip.source.display(), format!("ffmpeg did not run: {}", e)))?;

        if !output.status.success() || output.stdout.is_empty() {
            return Err(SlicerError::decode(
                clip.source.display(),
                format!(
                    "no frame at {:.3}s: {}",
                    timestamp,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let image = image::load_from_memory(&output.stdout)
            .map_err(|e| SlicerError::decode(clip.source.display(), format!("frame decode failed: {}", e)))?;

        Ok(Frame::new(image.to_rgb8()))
    }

    fn encode_range(
        &self,
        clip: &ClipHandle,
        start: f64,
        end: f64,
        output: &Path,
        params: &EncodeParams,
    ) -> Result<()> {
        let args = encode_args(clip, start, end, output, params);
        debug!("{} {}", self.ffmpeg, args.join(" "));

        let result = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .output()
            .map_err(|e| SlicerError::encode(EncodeErrorKind::Other, format!("ffmpeg did not run: {}", e)))?;

        if result.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&result.stderr);
        let kind = classify_failure(&stderr);
        warn!("ffmpeg exited with {} ({})", result.status, kind);

        // A half-written file would look like a finished clip
        if output.exists() {
            let _ = std::fs::remove_file(output);
        }

        Err(SlicerError::encode(kind, last_lines(&stderr, 3)))
    }
}

fn clip_from_probe(path: &Path, probe: &FfprobeOutput) -> Result<ClipHandle> {
    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| SlicerError::decode(path.display(), "no video stream"))?;

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(SlicerError::decode(path.display(), "video stream has no dimensions")),
    };

    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    let fps = video
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video.r_frame_rate.as_deref().and_then(parse_frame_rate));

    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let mut clip = ClipHandle::new(path, width, height, duration, fps);
    clip.has_audio = has_audio;
    Ok(clip)
}

/// Parse "30000/1001" or "29.97". Zero or unparsable rates are `None`.
fn parse_frame_rate(s: &str) -> Option<f64> {
    let rate = match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => s.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

fn filter_chain(transforms: &[VideoTransform]) -> Option<String> {
    if transforms.is_empty() {
        return None;
    }
    let filters: Vec<String> = transforms
        .iter()
        .map(|t| match t {
            VideoTransform::Crop(w) => format!("crop={}:{}:{}:{}", w.width(), w.height(), w.x1, w.y1),
            VideoTransform::Scale { width, height } => format!("scale={}:{}", width, height),
        })
        .collect();
    Some(filters.join(","))
}

fn encode_args(clip: &ClipHandle, start: f64, end: f64, output: &Path, params: &EncodeParams) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-v".into(),
        "error".into(),
        "-ss".into(),
        format!("{:.3}", start),
        "-i".into(),
        clip.source.display().to_string(),
        "-t".into(),
        format!("{:.3}", (end - start).max(0.0)),
    ];

    // 4:2:0 chroma needs even dimensions
    let mut filters = filter_chain(&clip.transforms);
    if clip.width % 2 == 1 || clip.height % 2 == 1 {
        let fix = format!("crop={}:{}:0:0", clip.width - clip.width % 2, clip.height - clip.height % 2);
        filters = Some(match filters {
            Some(chain) => format!("{},{}", chain, fix),
            None => fix,
        });
    }
    if let Some(chain) = filters {
        args.extend(["-vf".into(), chain]);
    }

    args.extend([
        "-c:v".into(),
        params.video_codec.clone(),
        "-preset".into(),
        params.preset.clone(),
        "-b:v".into(),
        params.bitrate.clone(),
        "-crf".into(),
        params.crf.to_string(),
        "-maxrate".into(),
        params.max_rate.clone(),
        "-bufsize".into(),
        params.buffer_size.clone(),
        "-pix_fmt".into(),
        params.pixel_format.clone(),
        "-threads".into(),
        params.threads.to_string(),
    ]);

    if let Some(fps) = params.fps {
        args.extend(["-r".into(), format!("{}", fps)]);
    }

    match &params.audio_codec {
        Some(codec) => args.extend([
            "-c:a".into(),
            codec.clone(),
            "-b:a".into(),
            params.audio_bitrate.clone(),
        ]),
        None => args.push("-an".into()),
    }

    args.push(output.display().to_string());
    args
}

fn classify_failure(stderr: &str) -> EncodeErrorKind {
    if PARAMETER_REJECTIONS.iter().any(|needle| stderr.contains(needle)) {
        EncodeErrorKind::ParameterIncompatibility
    } else {
        EncodeErrorKind::Other
    }
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(n)..].join(" | ")
}
