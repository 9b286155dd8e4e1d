use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

use crate::detection::domain::eye_landmarks::EyeLandmarkPair;
use crate::occlusion::domain::eye_line::{EyeLine, EyeLineParams};
use crate::occlusion::domain::eye_occluder::EyeOccluder;
use crate::shared::frame::Frame;

/// Draws a solid bar with round caps across each face's eyes.
pub struct RedLineOccluder {
    params: EyeLineParams,
}

impl RedLineOccluder {
    pub fn new(params: EyeLineParams) -> Self {
        Self { params }
    }
}

impl Default for RedLineOccluder {
    fn default() -> Self {
        Self::new(EyeLineParams::default())
    }
}

impl EyeOccluder for RedLineOccluder {
    fn occlude(&self, frame: &Frame, pairs: &[EyeLandmarkPair]) -> Frame {
        let (width, height) = (frame.width(), frame.height());
        let mut canvas = frame.clone().into_rgb_image();
        let color = Rgb(self.params.color);

        for pair in pairs {
            let Some(line) = EyeLine::from_landmarks(pair, width, height, &self.params) else {
                log::warn!("Skipping eye landmarks with non-finite coordinates: {pair:?}");
                continue;
            };
            log::trace!("Eye bar {:?} → {:?}, thickness {}", line.start, line.end, line.thickness);
            draw_thick_segment(&mut canvas, &line, color);
        }

        Frame::from(canvas)
    }
}

/// Rasterizes `line` as a filled quad plus a disc at each end.
///
/// The segment is first clipped to the frame grown by one thickness on every
/// side, which keeps coordinates small without changing visible pixels.
fn draw_thick_segment(canvas: &mut RgbImage, line: &EyeLine, color: Rgb<u8>) {
    let margin = line.thickness.max(1) as f64;
    let min = (-margin, -margin);
    let max = (canvas.width() as f64 + margin, canvas.height() as f64 + margin);
    let start = (line.start.0 as f64, line.start.1 as f64);
    let end = (line.end.0 as f64, line.end.1 as f64);

    let Some((a, b)) = clip_segment(start, end, min, max) else {
        return;
    };

    // Both polygon edges are filled, so the half-width spans `thickness - 1`.
    let span = line.thickness.saturating_sub(1);
    let half = span as f64 / 2.0;
    let radius = (span / 2) as i32;
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = dx.hypot(dy);

    if len > f64::EPSILON {
        let (nx, ny) = (-dy / len * half, dx / len * half);
        let quad = [
            point(a.0 + nx, a.1 + ny),
            point(b.0 + nx, b.1 + ny),
            point(b.0 - nx, b.1 - ny),
            point(a.0 - nx, a.1 - ny),
        ];
        if quad[0] != quad[3] {
            draw_polygon_mut(canvas, &quad, color);
        } else {
            draw_line_segment_mut(canvas, (a.0 as f32, a.1 as f32), (b.0 as f32, b.1 as f32), color);
        }
    }

    if radius > 0 {
        draw_filled_circle_mut(canvas, (a.0.round() as i32, a.1.round() as i32), radius, color);
        draw_filled_circle_mut(canvas, (b.0.round() as i32, b.1.round() as i32), radius, color);
    } else {
        draw_line_segment_mut(canvas, (a.0 as f32, a.1 as f32), (b.0 as f32, b.1 as f32), color);
    }
}

fn point(x: f64, y: f64) -> Point<i32> {
    Point::new(x.round() as i32, y.round() as i32)
}

/// Liang–Barsky clip of segment `p0 → p1` against the box `min..max`.
fn clip_segment(
    p0: (f64, f64),
    p1: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (p1.0 - p0.0, p1.1 - p0.1);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    for (p, q) in [
        (-dx, p0.0 - min.0),
        (dx, max.0 - p0.0),
        (-dy, p0.1 - min.1),
        (dy, max.1 - p0.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((
        (p0.0 + t0 * dx, p0.1 + t0 * dy),
        (p0.0 + t1 * dx, p0.1 + t1 * dy),
    ))
}
