use image::RgbImage;
use rover_core::{Frame, PolarSummary, Pose};
use rover_map::WorldGrid;

/// Read-only inputs supplied by the vehicle for one control tick
#[derive(Debug, Clone)]
pub struct SensorInput {
    pub frame: Frame,
    pub pose: Pose,
}

/// Outputs written by the perception pipeline
#[derive(Debug, Clone)]
pub struct PerceptionOutput {
    /// Latest class masks packed for display, see [`crate::display::pack_vision_image`]
    pub vision_image: RgbImage,
    /// Persistent map, grows over the whole mission
    pub world_map: WorldGrid,
    /// Latest navigable-terrain polar summary, replaced every frame
    pub nav: PolarSummary,
    /// Frames offered to the map and how many of them were committed
    pub frames_seen: u64,
    pub frames_committed: u64,
}

impl PerceptionOutput {
    pub fn new(width: u32, height: u32, world_map: WorldGrid) -> Self {
        Self {
            vision_image: RgbImage::new(width, height),
            world_map,
            nav: PolarSummary::default(),
            frames_seen: 0,
            frames_committed: 0,
        }
    }

    pub fn nav_distances(&self) -> &[f32] {
        &self.nav.distances
    }

    pub fn nav_bearings(&self) -> &[f32] {
        &self.nav.bearings
    }
}

/// Vehicle state shared between the vehicle loop and the perception pipeline
#[derive(Debug, Clone)]
pub struct RoverState {
    pub input: SensorInput,
    pub output: PerceptionOutput,
    /// Rectification scratch, sized once from the calibration
    pub(crate) warped: Frame,
}

impl RoverState {
    /// Replace the inputs for the next tick, keeping the accumulated outputs
    pub fn set_input(&mut self, frame: Frame, pose: Pose) {
        self.input = SensorInput { frame, pose };
    }
}
