//! Geometry of the eye occlusion bar.
//!
//! Landmarks are mapped to pixels, stretched sideways so the bar covers the
//! whole eye rather than the landmark point, and given a thickness that
//! grows with the apparent face size.

use crate::detection::domain::eye_landmarks::EyeLandmarkPair;

/// Pixel coordinates are bounded to ±2^40 so the line stays exact in `f64`.
const MAX_PIXEL: f64 = (1u64 << 40) as f64;

fn to_pixel(normalized: f64, extent: f64) -> i64 {
    (normalized * extent).round().clamp(-MAX_PIXEL, MAX_PIXEL) as i64
}

/// Drawing parameters for the occlusion bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EyeLineParams {
    /// Pixels added past each landmark along x.
    pub horizontal_extension: i64,
    pub thin: u32,
    pub thick: u32,
    /// Bars whose horizontal span reaches this many pixels are drawn thick.
    pub thick_threshold: i64,
    pub color: [u8; 3],
}

impl Default for EyeLineParams {
    fn default() -> Self {
        Self {
            horizontal_extension: 10,
            thin: 10,
            thick: 25,
            thick_threshold: 100,
            color: [255, 0, 0],
        }
    }
}

/// A bar segment in pixel coordinates. Endpoints may lie outside the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EyeLine {
    pub start: (i64, i64),
    pub end: (i64, i64),
    pub thickness: u32,
}

impl EyeLine {
    /// Maps one face's eye landmarks into a `width × height` frame.
    ///
    /// Returns `None` for non-finite landmark coordinates.
    pub fn from_landmarks(
        pair: &EyeLandmarkPair,
        width: u32,
        height: u32,
        params: &EyeLineParams,
    ) -> Option<Self> {
        if !pair.left.is_finite() || !pair.right.is_finite() {
            return None;
        }
        let w = width as f64;
        let h = height as f64;

        let x1 = to_pixel(pair.left.x, w).saturating_sub(params.horizontal_extension);
        let y1 = to_pixel(pair.left.y, h);
        let x2 = to_pixel(pair.right.x, w).saturating_add(params.horizontal_extension);
        let y2 = to_pixel(pair.right.y, h);

        let thickness = if x2.saturating_sub(x1) < params.thick_threshold {
            params.thin
        } else {
            params.thick
        };

        Some(Self {
            start: (x1, y1),
            end: (x2, y2),
            thickness,
        })
    }
}
