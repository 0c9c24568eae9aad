use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),
    #[error("invalid frame: expected {expected_width}x{expected_height}, got {width}x{height}")]
    InvalidFrame {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
    #[error("invalid frame: {width}x{height} has no pixels")]
    EmptyFrame { width: u32, height: u32 },
    #[error("frame data length mismatch: expected {expected_len}, got {actual_len}")]
    InvalidFrameData { expected_len: usize, actual_len: usize },
    #[error("calibration io error: {0}")]
    CalibrationIo(#[from] std::io::Error),
    #[error("calibration format error: {0}")]
    CalibrationFormat(String),
}

impl VisionError {
    /// Invalid-frame failures; the pipeline keeps running on the next frame
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            VisionError::InvalidFrame { .. } | VisionError::EmptyFrame { .. } | VisionError::InvalidFrameData { .. }
        )
    }
}

pub type VisionResult<T> = Result<T, VisionError>;
