use rover_core::{MapLayer, WorldPoints};
use crate::error::{MapError, MapResult};
use crate::grid::WorldGrid;

/// World-frame detections of one frame, one point set per class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldObservations {
    pub navigable: WorldPoints,
    pub obstacle: WorldPoints,
    pub sample: WorldPoints,
}

impl WorldObservations {
    pub fn get(&self, layer: MapLayer) -> &WorldPoints {
        match layer {
            MapLayer::Obstacle => &self.obstacle,
            MapLayer::Sample => &self.sample,
            MapLayer::Navigable => &self.navigable,
        }
    }
}

/// Outcome of offering a frame to the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Observations were added to the grid
    Committed,
    /// Vehicle was tilted; the frame's observations were dropped
    Rejected,
}

impl GateDecision {
    pub fn is_committed(self) -> bool {
        self == GateDecision::Committed
    }
}

/// Accepts frames only while the vehicle is close to level.
///
/// Angles are in degrees on a [0, 360) circle, so level is both near 0 and near 360.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttitudeGate {
    band_deg: f32,
}

impl AttitudeGate {
    pub fn new(band_deg: f32) -> Self {
        Self { band_deg }
    }

    pub fn band(&self) -> f32 {
        self.band_deg
    }

    /// True if an angle is within the band of level, in either direction
    #[inline(always)]
    pub fn is_level(&self, angle_deg: f32) -> bool {
        let a = angle_deg.rem_euclid(360.0);
        a <= self.band_deg || a >= 360.0 - self.band_deg
    }

    /// True if both roll and pitch are level
    pub fn passes(&self, roll_deg: f32, pitch_deg: f32) -> bool {
        self.is_level(roll_deg) && self.is_level(pitch_deg)
    }
}

impl Default for AttitudeGate {
    fn default() -> Self {
        Self::new(2.0)
    }
}

/// Attitude-gated accumulation of observations into a world grid
#[derive(Debug, Clone)]
pub struct MapAccumulator {
    gate: AttitudeGate,
    grid_size: usize,
}

impl MapAccumulator {
    pub fn new(gate: AttitudeGate, grid_size: usize) -> MapResult<Self> {
        if grid_size == 0 {
            return Err(MapError::EmptyGrid);
        }
        Ok(Self { gate, grid_size })
    }

    /// Fresh grid sized for this accumulator
    pub fn new_grid(&self) -> MapResult<WorldGrid> {
        WorldGrid::new(self.grid_size)
    }

    /// Checks that a grid can receive this accumulator's observations
    pub fn check_grid(&self, grid: &WorldGrid) -> MapResult<()> {
        if grid.size() != self.grid_size {
            return Err(MapError::GridSizeMismatch {
                expected: self.grid_size,
                actual: grid.size(),
            });
        }
        Ok(())
    }

    /// Add every observation to the grid if the attitude is level, otherwise leave it untouched
    pub fn accumulate(
        &self,
        grid: &mut WorldGrid,
        observations: &WorldObservations,
        roll_deg: f32,
        pitch_deg: f32,
    ) -> MapResult<GateDecision> {
        self.check_grid(grid)?;

        if !self.gate.passes(roll_deg, pitch_deg) {
            tracing::debug!(roll_deg, pitch_deg, band = self.gate.band(), "attitude outside gate, map not updated");
            return Ok(GateDecision::Rejected);
        }

        for layer in MapLayer::ALL {
            let points = observations.get(layer);
            if points.x.len() != points.y.len() {
                return Err(MapError::UnpairedPoints {
                    layer,
                    x_len: points.x.len(),
                    y_len: points.y.len(),
                });
            }
            let outside = points
                .iter()
                .find(|&(x, y)| x >= self.grid_size || y >= self.grid_size);
            if let Some((x, y)) = outside {
                return Err(MapError::CellOutOfBounds { x, y, size: self.grid_size });
            }
        }

        for layer in MapLayer::ALL {
            grid.add_points(layer, observations.get(layer));
        }
        Ok(GateDecision::Committed)
    }
}
