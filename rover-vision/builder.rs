use rover_core::RgbThreshold;
use crate::config::{Calibration, ClassThresholds};
use crate::error::VisionResult;

/// Fluent builder for a validated `Calibration`
#[derive(Debug, Clone)]
pub struct CalibrationBuilder {
    calibration: Calibration,
}

impl CalibrationBuilder {
    /// Start from the simulator calibration for a camera of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            calibration: Calibration::new(width, height),
        }
    }

    /// Set rectification correspondences
    pub fn rectify_points(mut self, src: &[(f32, f32)], dst: &[(f32, f32)]) -> Self {
        self.calibration.rectify_src = src.to_vec();
        self.calibration.rectify_dst = dst.to_vec();
        self
    }

    /// Replace all three class thresholds
    pub fn thresholds(mut self, thresholds: ClassThresholds) -> Self {
        self.calibration.thresholds = thresholds;
        self
    }

    /// Set the navigable terrain threshold
    pub fn terrain(mut self, threshold: RgbThreshold) -> Self {
        self.calibration.thresholds.terrain = threshold;
        self
    }

    /// Set the obstacle threshold
    pub fn obstacle(mut self, threshold: RgbThreshold) -> Self {
        self.calibration.thresholds.obstacle = threshold;
        self
    }

    /// Set the sample threshold
    pub fn sample(mut self, threshold: RgbThreshold) -> Self {
        self.calibration.thresholds.sample = threshold;
        self
    }

    /// Set the world grid side length
    pub fn grid_size(mut self, grid_size: usize) -> Self {
        self.calibration.grid_size = grid_size;
        self
    }

    /// Set rectified pixels per world unit
    pub fn scale(mut self, scale: f32) -> Self {
        self.calibration.scale = scale;
        self
    }

    /// Set the roll/pitch band (degrees) for committing observations
    pub fn attitude_gate(mut self, degrees: f32) -> Self {
        self.calibration.attitude_gate_deg = degrees;
        self
    }

    /// Attach a name and description
    pub fn metadata(mut self, name: &str, description: &str) -> Self {
        self.calibration = self.calibration.with_metadata(name, description);
        self
    }

    /// Validate and return the calibration
    pub fn build(self) -> VisionResult<Calibration> {
        self.calibration.validate()?;
        Ok(self.calibration)
    }

    /// Create a builder from an existing `Calibration`
    pub fn from_calibration(calibration: Calibration) -> Self {
        Self { calibration }
    }
}
