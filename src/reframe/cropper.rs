use std::cmp::Ordering;

use tracing::{debug, info};

use crate::{
    config::ReframeConfig,
    error::Result,
    reframe::{
        fps::{normalize_fps, repair_fps},
        saliency,
    },
    video::{AspectRatio, ClipHandle, CropWindow, Frame, MediaEngine},
};

/// How a clip will be reframed
#[derive(Debug, Clone, PartialEq)]
pub struct CropPlan {
    /// Crop applied first; `None` when the clip already has the target ratio
    pub crop: Option<CropWindow>,

    /// Strongest edge column of the sampled frame, for wide sources
    pub peak_column: Option<usize>,

    /// Downscale applied after the crop, if the crop exceeds the size limits
    pub scale: Option<(u32, u32)>,

    /// Final output size
    pub output: (u32, u32),
}

impl CropPlan {
    /// Apply this plan to a clip handle
    pub fn apply(&self, clip: &ClipHandle) -> ClipHandle {
        let mut out = match self.crop {
            Some(window) => clip.cropped(window),
            None => clip.clone(),
        };
        if let Some((w, h)) = self.scale {
            out = out.resized(w, h);
        }
        out
    }
}

/// Crop for a source wider than the target: keep full height and slide a
/// target-width band toward the strongest edges, never past the center-crop
/// margins.
///
/// Returns the window and the peak column in source coordinates.
pub fn wide_crop(width: u32, height: u32, target: AspectRatio, frame: &Frame) -> Result<(CropWindow, usize)> {
    let new_width = target.width_for_height(height).max(1);
    let margin = (width - new_width) / 2;

    let profile = saliency::edge_energy_profile(frame);
    let mut peak = saliency::peak_column(&profile);
    if frame.width() != width && frame.width() > 0 {
        debug!("Sample frame is {} wide, clip is {}; rescaling peak column", frame.width(), width);
        peak = (peak as u64 * width as u64 / frame.width() as u64) as usize;
    }

    let left = saliency::left_offset(peak, new_width, margin);
    let window = CropWindow::new(left, 0, left + new_width, height, width, height)?;
    Ok((window, peak))
}

/// Crop for a source taller than the target: full width, vertically centred
pub fn tall_crop(width: u32, height: u32, target: AspectRatio) -> Result<CropWindow> {
    let new_height = target.height_for_width(width).max(1);
    let top = (height - new_height) / 2;
    CropWindow::new(0, top, width, top + new_height, width, height)
}

/// Downscaled size for `width` x `height`, or `None` if it already fits
///
/// Portrait pictures are fitted to `max_height`, others to `max_width`.
/// Never upscales.
pub fn bounded_size(width: u32, height: u32, max_width: u32, max_height: u32) -> Option<(u32, u32)> {
    if width <= max_width && height <= max_height {
        return None;
    }

    let fit_height = |w: u32, h: u32| ((w as u64 * max_height as u64 / h as u64).max(1) as u32, max_height);
    let fit_width = |w: u32, h: u32| (max_width, (h as u64 * max_width as u64 / w as u64).max(1) as u32);

    let (w, h) = if height > width {
        fit_height(width, height)
    } else {
        fit_width(width, height)
    };

    // Target ratios far from the limits' own ratio can still overflow the other side
    if w > max_width {
        Some(fit_width(w, h))
    } else if h > max_height {
        Some(fit_height(w, h))
    } else {
        Some((w, h))
    }
}

/// Work out the crop and downscale for a clip
///
/// Only wide sources need a sampled frame; it is decoded at
/// `config.sample_time`. A frame that cannot be decoded fails the plan.
pub fn plan_reframe<E: MediaEngine + ?Sized>(engine: &E, clip: &ClipHandle, config: &ReframeConfig) -> Result<CropPlan> {
    let target = config.target_aspect;
    let (width, height) = clip.size();

    let (crop, peak_column) = match target.compare(width, height) {
        Ordering::Greater => {
            let frame = engine.get_frame(clip, config.sample_time)?;
            let (window, peak) = wide_crop(width, height, target, &frame)?;
            (Some(window), Some(peak))
        }
        Ordering::Less => (Some(tall_crop(width, height, target)?), None),
        Ordering::Equal => (None, None),
    };

    let (cropped_w, cropped_h) = crop.map(|c| (c.width(), c.height())).unwrap_or((width, height));
    let scale = bounded_size(cropped_w, cropped_h, config.max_width, config.max_height);
    let output = scale.unwrap_or((cropped_w, cropped_h));

    Ok(CropPlan {
        crop,
        peak_column,
        scale,
        output,
    })
}

/// Reframe a clip to the configured vertical aspect ratio and size limits
///
/// The result's rate is normalized again since crop and scale stages may
/// not carry it.
pub fn reframe_for_vertical<E: MediaEngine + ?Sized>(
    engine: &E,
    clip: ClipHandle,
    config: &ReframeConfig,
) -> Result<ClipHandle> {
    let plan = plan_reframe(engine, &clip, config)?;

    match (&plan.crop, plan.peak_column) {
        (Some(c), Some(peak)) => info!(
            "Smart crop {}x{} -> x {}..{} (edge peak at column {})",
            clip.width, clip.height, c.x1, c.x2, peak
        ),
        (Some(c), None) => info!(
            "Center crop {}x{} -> y {}..{}",
            clip.width, clip.height, c.y1, c.y2
        ),
        _ => debug!("{}x{} already {}", clip.width, clip.height, config.target_aspect),
    }
    if let Some((w, h)) = plan.scale {
        debug!("Downscaling to {}x{}", w, h);
    }

    let default_fps = repair_fps(clip.fps, Some(config.default_fps));
    Ok(normalize_fps(plan.apply(&clip), Some(default_fps)))
}
