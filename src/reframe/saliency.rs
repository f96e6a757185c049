//! Column edge-energy heuristic for picking where to crop.
//!
//! One frame, one axis: each column boundary is scored by the summed
//! horizontal luma gradient down the frame, and the crop is centred on the
//! strongest boundary as far as the center-crop margins allow.

use crate::video::Frame;

/// Rec. 601 luma of an RGB pixel
pub fn luma([r, g, b]: [u8; 3]) -> f64 {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}

/// Grayscale copy of a frame, row-major
pub fn grayscale(frame: &Frame) -> Vec<f64> {
    frame.as_image().pixels().map(|p| luma([p[0], p[1], p[2]])).collect()
}

/// Horizontal gradient energy per column boundary
///
/// `profile[i]` is the sum over all rows of `|gray(i + 1) - gray(i)|`, so the
/// profile has `width - 1` entries (none for a frame one pixel wide).
pub fn edge_energy_profile(frame: &Frame) -> Vec<f64> {
    let width = frame.width() as usize;
    if width < 2 {
        return Vec::new();
    }

    let gray = grayscale(frame);
    let mut profile = vec![0.0; width - 1];
    for row in gray.chunks_exact(width) {
        for (score, pair) in profile.iter_mut().zip(row.windows(2)) {
            *score += (pair[1] - pair[0]).abs();
        }
    }
    profile
}

/// Index of the highest score, first one on ties. Empty profiles give 0.
pub fn peak_column(profile: &[f64]) -> usize {
    let mut best = 0;
    for (i, &score) in profile.iter().enumerate() {
        if score > profile[best] {
            best = i;
        }
    }
    best
}

/// Left edge of a `new_width` crop centred on `peak`, kept within `[0, margin]`
pub fn left_offset(peak: usize, new_width: u32, margin: u32) -> u32 {
    let candidate = peak as i64 - (new_width / 2) as i64;
    candidate.clamp(0, margin as i64) as u32
}
