use std::cell::RefCell;

use crate::blurring::domain::frame_blurrer::FrameBlurrer;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{BLUR_KERNEL_SIZE, BLUR_SIGMA, BLUR_VERTICAL_SHIFT};
use crate::shared::frame::{Frame, CHANNELS};

use super::gaussian;

/// Gaussian parameters for face-box blurring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlurParams {
    /// Kernel side length. Even values are rounded up to the next odd one.
    pub kernel_size: usize,
    pub sigma: f64,
    /// Pixels by which each box's top edge is raised before clamping.
    pub vertical_shift: i32,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            kernel_size: BLUR_KERNEL_SIZE,
            sigma: BLUR_SIGMA,
            vertical_shift: BLUR_VERTICAL_SHIFT,
        }
    }
}

/// CPU face blurrer: separable Gaussian over each clamped box.
///
/// Works on a copy of the input. Boxes are applied in order, so where two
/// boxes overlap the second one blurs already-blurred pixels.
pub struct FaceBoxBlurrer {
    kernel: Vec<f32>,
    vertical_shift: i32,
    roi_buf: RefCell<Vec<u8>>,
    blur_temp: RefCell<Vec<f32>>,
}

impl FaceBoxBlurrer {
    pub fn new(params: BlurParams) -> Self {
        let kernel_size = params.kernel_size | 1; // ensure odd
        Self {
            kernel: gaussian::gaussian_kernel_1d(kernel_size, params.sigma),
            vertical_shift: params.vertical_shift,
            roi_buf: RefCell::new(Vec::new()),
            blur_temp: RefCell::new(Vec::new()),
        }
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel.len()
    }
}

impl Default for FaceBoxBlurrer {
    fn default() -> Self {
        Self::new(BlurParams::default())
    }
}

impl FrameBlurrer for FaceBoxBlurrer {
    fn blur(&self, frame: &Frame, boxes: &[BoundingBox]) -> Frame {
        let mut out = frame.clone();
        let fw = frame.width() as usize;

        let mut roi = self.roi_buf.borrow_mut();
        let mut temp = self.blur_temp.borrow_mut();
        let mut blurred = 0usize;

        for b in boxes {
            let Some(rect) = b.blur_rect(frame.width(), frame.height(), self.vertical_shift) else {
                log::trace!("Skipping box outside frame: {b:?}");
                continue;
            };

            let data = out.data_mut();
            gaussian::extract_roi(data, fw, CHANNELS, rect, &mut roi);
            gaussian::separable_gaussian_blur_with_kernel(
                &mut roi,
                rect.w,
                rect.h,
                CHANNELS,
                &self.kernel,
                &mut temp,
            );
            gaussian::write_roi_back(data, &roi, fw, CHANNELS, rect);
            blurred += 1;
        }

        log::debug!("Blurred {blurred} of {} face boxes", boxes.len());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1-pixel checkerboard: any real blur moves every pixel toward gray.
    fn checkerboard(width: u32, height: u32) -> Frame {
        let mut frame = Frame::filled(width, height, [0, 0, 0]);
        for row in 0..height {
            for col in 0..width {
                if (row + col) % 2 == 0 {
                    frame.set_pixel(row, col, [255, 255, 255]);
                }
            }
        }
        frame
    }

    fn small_blurrer() -> FaceBoxBlurrer {
        FaceBoxBlurrer::new(BlurParams {
            kernel_size: 5,
            sigma: 0.0,
            vertical_shift: BLUR_VERTICAL_SHIFT,
        })
    }

    fn changed(a: &Frame, b: &Frame, row: u32, col: u32) -> bool {
        a.pixel(row, col) != b.pixel(row, col)
    }

    #[test]
    fn test_default_params() {
        let params = BlurParams::default();
        assert_eq!(params.kernel_size, 99);
        assert_eq!(params.sigma, 30.0);
        assert_eq!(params.vertical_shift, 8);
        assert_eq!(FaceBoxBlurrer::default().kernel_size(), 99);
    }

    #[test]
    fn test_even_kernel_rounded_up() {
        let blurrer = FaceBoxBlurrer::new(BlurParams {
            kernel_size: 10,
            ..BlurParams::default()
        });
        assert_eq!(blurrer.kernel_size(), 11);
    }

    #[test]
    fn test_no_boxes_returns_identical_copy() {
        let frame = checkerboard(40, 30);
        let out = small_blurrer().blur(&frame, &[]);
        assert_eq!(out, frame);
    }

    #[test]
    fn test_output_does_not_alias_input() {
        let frame = checkerboard(40, 30);
        let original = frame.clone();
        let mut out = small_blurrer().blur(&frame, &[BoundingBox::new(5, 13, 10, 10)]);
        out.data_mut().fill(7);
        assert_eq!(frame, original);
    }

    #[test]
    fn test_dimensions_preserved() {
        let frame = checkerboard(37, 23);
        let out = small_blurrer().blur(&frame, &[BoundingBox::new(-10, -10, 100, 100)]);
        assert_eq!((out.width(), out.height()), (37, 23));
        assert_eq!(out.data().len(), frame.data().len());
    }

    #[test]
    fn test_blur_lands_on_shifted_rect_only() {
        let frame = checkerboard(60, 60);
        // Box (20, 28, 10, 10) → rows 20..30, cols 20..30
        let out = small_blurrer().blur(&frame, &[BoundingBox::new(20, 28, 10, 10)]);

        assert!(changed(&frame, &out, 20, 20));
        assert!(changed(&frame, &out, 29, 29));
        assert!(!changed(&frame, &out, 19, 25));
        assert!(!changed(&frame, &out, 30, 25));
        assert!(!changed(&frame, &out, 25, 19));
        assert!(!changed(&frame, &out, 25, 30));
    }

    #[test]
    fn test_box_left_of_frame_is_clamped_not_rejected() {
        let frame = checkerboard(200, 200);
        let out = FaceBoxBlurrer::default().blur(&frame, &[BoundingBox::new(-50, 0, 100, 100)]);

        // x1 = 0, y1 = 0, x2 = min(0 + 100, 200), y2 = min(0 + 100, 200)
        assert!(changed(&frame, &out, 0, 0));
        assert!(changed(&frame, &out, 99, 99));
        assert!(changed(&frame, &out, 50, 60));
        assert!(!changed(&frame, &out, 100, 50));
        assert!(!changed(&frame, &out, 50, 100));
        assert!(!changed(&frame, &out, 150, 150));
    }

    #[test]
    fn test_box_outside_frame_leaves_output_identical() {
        let frame = checkerboard(200, 200);
        let out = small_blurrer().blur(&frame, &[BoundingBox::new(1000, 20, 50, 50)]);
        assert_eq!(out, frame);
    }

    #[test]
    fn test_degenerate_boxes_skipped_others_applied() {
        let frame = checkerboard(60, 60);
        let out = small_blurrer().blur(
            &frame,
            &[
                BoundingBox::new(10, 10, 0, 10),
                BoundingBox::new(10, 500, 10, 10),
                BoundingBox::new(30, 38, 10, 10),
            ],
        );
        assert!(changed(&frame, &out, 35, 35));
        assert!(!changed(&frame, &out, 5, 10));
    }

    #[test]
    fn test_uniform_region_stays_uniform() {
        let frame = Frame::filled(50, 50, [90, 120, 150]);
        let out = FaceBoxBlurrer::default().blur(&frame, &[BoundingBox::new(5, 13, 30, 30)]);
        for row in 0..50 {
            for col in 0..50 {
                let p = out.pixel(row, col);
                assert!((p[0] as i32 - 90).abs() <= 1);
                assert!((p[2] as i32 - 150).abs() <= 1);
            }
        }
    }

    #[test]
    fn test_blur_mixes_region_toward_mean() {
        let frame = checkerboard(40, 40);
        let out = FaceBoxBlurrer::default().blur(&frame, &[BoundingBox::new(0, 8, 40, 40)]);
        let p = out.pixel(20, 20);
        assert!((100..=155).contains(&p[0]), "expected mid gray, got {p:?}");
    }
}
