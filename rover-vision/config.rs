use rover_core::{RgbThreshold, TerrainClass};
use crate::error::{VisionError, VisionResult};
use crate::builder::CalibrationBuilder;

#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

/// Stock simulator camera size
pub const SIM_FRAME_WIDTH: u32 = 320;
pub const SIM_FRAME_HEIGHT: u32 = 160;

/// Half the side of the destination square the ground grid cell is warped onto
const DST_HALF_SIDE: f32 = 5.0;
/// Gap between the destination square and the bottom edge of the image
const DST_BOTTOM_OFFSET: f32 = 9.0;

/// Ground-grid corners as seen by the simulator camera
const SIM_SOURCE_POINTS: [(f32, f32); 4] = [(14.0, 140.0), (301.0, 140.0), (200.0, 96.0), (118.0, 96.0)];

/// Per-class color thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassThresholds {
    pub terrain: RgbThreshold,
    pub obstacle: RgbThreshold,
    pub sample: RgbThreshold,
}

impl ClassThresholds {
    pub fn get(&self, class: TerrainClass) -> RgbThreshold {
        match class {
            TerrainClass::Navigable => self.terrain,
            TerrainClass::Obstacle => self.obstacle,
            TerrainClass::Sample => self.sample,
        }
    }
}

impl Default for ClassThresholds {
    fn default() -> Self {
        Self {
            terrain: RgbThreshold::new(160, 160, 160),
            obstacle: RgbThreshold::new(90, 90, 90),
            sample: RgbThreshold::new(150, 100, 0),
        }
    }
}

/// Fixed calibration for one mission
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Calibration {
    /// Camera frame dimensions
    pub frame_width: u32,
    pub frame_height: u32,
    /// Rectification correspondences, exactly four points each
    pub rectify_src: Vec<(f32, f32)>,
    pub rectify_dst: Vec<(f32, f32)>,
    pub thresholds: ClassThresholds,
    /// World grid side length in cells
    pub grid_size: usize,
    /// Rectified pixels per world unit
    pub scale: f32,
    /// Roll/pitch band around level inside which observations are committed
    pub attitude_gate_deg: f32,
    /// Metadata
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
}

impl Calibration {
    /// Simulator calibration for a camera of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame_width: width,
            frame_height: height,
            rectify_src: SIM_SOURCE_POINTS.to_vec(),
            rectify_dst: Self::ground_square(width, height).to_vec(),
            thresholds: ClassThresholds::default(),
            grid_size: 200,
            scale: 30.0,
            attitude_gate_deg: 2.0,
            name: None,
            description: None,
        }
    }

    /// Stock 320x160 simulator calibration
    pub fn simulator() -> Self {
        Self::new(SIM_FRAME_WIDTH, SIM_FRAME_HEIGHT)
            .with_metadata("Simulator", "Stock rover simulator camera and 200x200 world")
    }

    /// Destination square in the same corner order as the source points
    pub fn ground_square(width: u32, height: u32) -> [(f32, f32); 4] {
        let cx = width as f32 / 2.0;
        let h = height as f32;
        [
            (cx - DST_HALF_SIDE, h - 2.0 * DST_HALF_SIDE - DST_BOTTOM_OFFSET),
            (cx + DST_HALF_SIDE, h - 2.0 * DST_HALF_SIDE - DST_BOTTOM_OFFSET),
            (cx - DST_HALF_SIDE, h - DST_BOTTOM_OFFSET),
            (cx + DST_HALF_SIDE, h - DST_BOTTOM_OFFSET),
        ]
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self
    }

    /// Convert to CalibrationBuilder for further customization
    pub fn to_builder(self) -> CalibrationBuilder {
        CalibrationBuilder::from_calibration(self)
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Calibration{}: {}x{}, grid={} scale={:.1} gate=±{:.1}°, thresholds=[terrain:{:?}, obstacle:{:?}, sample:{:?}]",
            self.name.as_deref().map(|n| format!(" '{}'", n)).unwrap_or_default(),
            self.frame_width, self.frame_height, self.grid_size, self.scale, self.attitude_gate_deg,
            self.thresholds.terrain, self.thresholds.obstacle, self.thresholds.sample
        )
    }

    /// Rectification points as fixed arrays, after checking there are exactly four of each
    pub fn quadrilaterals(&self) -> VisionResult<([(f32, f32); 4], [(f32, f32); 4])> {
        Ok((quad("source", &self.rectify_src)?, quad("destination", &self.rectify_dst)?))
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> VisionResult<()> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(VisionError::InvalidCalibration(format!(
                "frame dimensions must be positive, got {}x{}",
                self.frame_width, self.frame_height
            )));
        }

        let (src, dst) = self.quadrilaterals()?;
        check_quadrilateral("source", &src)?;
        check_quadrilateral("destination", &dst)?;

        if self.grid_size == 0 {
            return Err(VisionError::InvalidCalibration("grid size must be at least 1".to_string()));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(VisionError::InvalidCalibration(format!(
                "scale must be positive and finite, got {}",
                self.scale
            )));
        }
        if !self.attitude_gate_deg.is_finite() || !(0.0..180.0).contains(&self.attitude_gate_deg) {
            return Err(VisionError::InvalidCalibration(format!(
                "attitude gate must be within [0, 180) degrees, got {}",
                self.attitude_gate_deg
            )));
        }
        Ok(())
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> VisionResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> VisionResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> VisionResult<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> VisionResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from a file, picking the format from the extension (`.json` or `.toml`)
    #[cfg(feature = "serde")]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> VisionResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::load_json(path),
            Some("toml") => Self::load_toml(path),
            other => Err(VisionError::CalibrationFormat(format!(
                "unsupported calibration file extension: {:?}",
                other
            ))),
        }
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> VisionResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| VisionError::CalibrationFormat(e.to_string()))
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> VisionResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| VisionError::CalibrationFormat(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> VisionResult<String> {
        toml::to_string_pretty(self).map_err(|e| VisionError::CalibrationFormat(e.to_string()))
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> VisionResult<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| VisionError::CalibrationFormat(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::simulator()
    }
}

pub(crate) fn quad(label: &str, points: &[(f32, f32)]) -> VisionResult<[(f32, f32); 4]> {
    <[(f32, f32); 4]>::try_from(points).map_err(|_| {
        VisionError::InvalidCalibration(format!(
            "{} quadrilateral needs exactly 4 points, got {}",
            label,
            points.len()
        ))
    })
}

/// Rejects non-finite corners and any three collinear corners
pub(crate) fn check_quadrilateral(label: &str, points: &[(f32, f32); 4]) -> VisionResult<()> {
    if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(VisionError::InvalidCalibration(format!("{} quadrilateral has a non-finite point", label)));
    }

    const TRIPLES: [(usize, usize, usize); 4] = [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)];
    for &(i, j, k) in &TRIPLES {
        let (ax, ay) = points[i];
        let (bx, by) = points[j];
        let (cx, cy) = points[k];
        let twice_area = ((bx - ax) as f64) * ((cy - ay) as f64) - ((by - ay) as f64) * ((cx - ax) as f64);
        if twice_area.abs() < 1e-6 {
            return Err(VisionError::InvalidCalibration(format!(
                "{} quadrilateral is degenerate: points {}, {} and {} are collinear",
                label, i, j, k
            )));
        }
    }
    Ok(())
}
