use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for blurring face boxes within a frame.
///
/// Implementations return a new frame and leave `frame` untouched. Boxes that
/// fall outside the frame are clamped or skipped, never reported as errors.
pub trait FrameBlurrer: Send {
    fn blur(&self, frame: &Frame, boxes: &[BoundingBox]) -> Frame;
}
