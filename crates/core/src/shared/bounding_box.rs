use serde::{Deserialize, Serialize};

/// Axis-aligned face box in pixel coordinates, origin at top-left.
///
/// Detectors may report boxes that hang over the frame edge or lie entirely
/// outside it. Nothing here rejects such boxes; consumers clamp or skip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub origin_x: i32,
    pub origin_y: i32,
    pub width: i32,
    pub height: i32,
}

/// A non-empty rectangle fully inside a frame, in `usize` pixel units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoiRect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl BoundingBox {
    pub fn new(origin_x: i32, origin_y: i32, width: i32, height: i32) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    /// Rectangle to blur for this box inside a `frame_w × frame_h` frame.
    ///
    /// The top edge is raised by `vertical_shift` pixels, then the start
    /// corner is clamped to the frame and the far corner is measured from the
    /// clamped start. Returns `None` when nothing of the rectangle is left.
    pub fn blur_rect(&self, frame_w: u32, frame_h: u32, vertical_shift: i32) -> Option<RoiRect> {
        let fw = i64::from(frame_w);
        let fh = i64::from(frame_h);

        let x1 = i64::from(self.origin_x).max(0);
        let y1 = (i64::from(self.origin_y) - i64::from(vertical_shift)).max(0);
        let x2 = (x1 + i64::from(self.width)).min(fw);
        let y2 = (y1 + i64::from(self.height)).min(fh);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(RoiRect {
            x: x1 as usize,
            y: y1 as usize,
            w: (x2 - x1) as usize,
            h: (y2 - y1) as usize,
        })
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.origin_x as f64 + self.width as f64 / 2.0,
            self.origin_y as f64 + self.height as f64 / 2.0,
        )
    }
}
