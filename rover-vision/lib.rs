//! Camera-side perception for the rover: perspective rectification into a
//! top-down view and color classification into terrain, obstacle and sample
//! masks.

pub mod builder;
pub mod classify;
pub mod config;
pub mod error;
pub mod rectify;

pub use builder::CalibrationBuilder;
pub use classify::{active_pixel_count, color_threshold, ClassMasks, PixelClassifier};
pub use config::{Calibration, ClassThresholds, SIM_FRAME_HEIGHT, SIM_FRAME_WIDTH};
pub use error::{VisionError, VisionResult};
pub use rectify::PerspectiveRectifier;

use rover_core::Frame;

/// Wrap a raw interleaved RGB buffer as a frame
pub fn frame_from_raw(width: u32, height: u32, data: Vec<u8>) -> VisionResult<Frame> {
    let expected_len = width as usize * height as usize * 3;
    if data.len() != expected_len {
        return Err(VisionError::InvalidFrameData {
            expected_len,
            actual_len: data.len(),
        });
    }
    Frame::from_raw(width, height, data).ok_or(VisionError::InvalidFrameData {
        expected_len,
        actual_len: 0,
    })
}
