use tracing::warn;

use crate::video::ClipHandle;

/// Rate used when neither the clip nor the caller provides a usable one
pub const DEFAULT_FPS: f64 = 30.0;

fn is_valid_fps(fps: f64) -> bool {
    fps.is_finite() && fps > 0.0
}

/// Return `fps` if usable, otherwise `default` (or [`DEFAULT_FPS`] if that is unusable too)
pub fn repair_fps(fps: Option<f64>, default: Option<f64>) -> f64 {
    match fps {
        Some(fps) if is_valid_fps(fps) => fps,
        _ => default.filter(|d| is_valid_fps(*d)).unwrap_or(DEFAULT_FPS),
    }
}

/// Guarantee the clip carries a finite, positive frame rate
///
/// A clip with a usable rate is returned unchanged. Pass the parent clip's
/// rate as `default` when normalizing a derived sub-clip.
pub fn normalize_fps(clip: ClipHandle, default: Option<f64>) -> ClipHandle {
    match clip.fps {
        Some(fps) if is_valid_fps(fps) => clip,
        invalid => {
            let fps = repair_fps(invalid, default);
            warn!(
                "Invalid FPS detected for {}: {:?}. Setting to default: {}",
                clip.source.display(),
                invalid,
                fps
            );
            clip.with_fps(fps)
        }
    }
}
