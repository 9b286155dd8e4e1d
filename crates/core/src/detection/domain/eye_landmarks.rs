use serde::{Deserialize, Serialize};

use crate::shared::constants::{LEFT_EYE_OUTER_CORNER, RIGHT_EYE_OUTER_CORNER};

/// A landmark position as a fraction of frame width (`x`) and height (`y`).
///
/// Values are usually in [0, 1] but are not clamped; a face partly outside
/// the frame produces coordinates beyond that range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// The two eye landmarks of one face.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EyeLandmarkPair {
    pub left: NormalizedPoint,
    pub right: NormalizedPoint,
}

impl EyeLandmarkPair {
    pub fn new(left: NormalizedPoint, right: NormalizedPoint) -> Self {
        Self { left, right }
    }
}

/// Which mesh landmarks count as the left and right eye.
///
/// Indices are topology specific. The defaults address the outer eye
/// corners of the 468/478-point MediaPipe face mesh; another landmark
/// model needs its own indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EyeCornerIndices {
    pub left: usize,
    pub right: usize,
}

impl Default for EyeCornerIndices {
    fn default() -> Self {
        Self {
            left: LEFT_EYE_OUTER_CORNER,
            right: RIGHT_EYE_OUTER_CORNER,
        }
    }
}
