pub mod display;
pub mod replay;
pub mod state;

use rover_core::{Frame, Mask, PolarSummary, Pose, VehiclePoints};
use rover_map::{
    to_polar, to_world, vehicle_coords, AttitudeGate, GateDecision, MapAccumulator, MapError,
    WorldObservations,
};
use rover_vision::{ClassMasks, PerspectiveRectifier, PixelClassifier, VisionError};

pub use rover_map::WorldGrid;
pub use rover_vision::{Calibration, CalibrationBuilder};
pub use display::pack_vision_image;
pub use state::{PerceptionOutput, RoverState, SensorInput};

#[derive(Debug, thiserror::Error)]
pub enum PerceptionError {
    #[error("vision error: {0}")]
    Vision(#[from] VisionError),
    #[error("map error: {0}")]
    Map(#[from] MapError),
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid manifest: {0}")]
    Manifest(String),
}

pub type PerceptionResult<T> = Result<T, PerceptionError>;

/// Vehicle-centric point sets for the three classes of one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassPoints {
    pub terrain: VehiclePoints,
    pub obstacle: VehiclePoints,
    pub sample: VehiclePoints,
}

/// Everything computed from one frame before it touches the shared state
#[derive(Debug, Clone)]
pub struct FramePerception {
    pub masks: ClassMasks,
    pub points: ClassPoints,
    pub nav: PolarSummary,
    pub world: WorldObservations,
}

/// Summary of one completed perception step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub terrain_pixels: usize,
    pub obstacle_pixels: usize,
    pub sample_pixels: usize,
    pub decision: GateDecision,
    /// Mean navigable bearing in radians, `None` if no terrain was seen
    pub mean_bearing: Option<f32>,
}

/// Camera frame to world map pipeline: rectify, classify, convert, accumulate
pub struct RoverPerception {
    calibration: Calibration,
    rectifier: PerspectiveRectifier,
    classifier: PixelClassifier,
    accumulator: MapAccumulator,
}

impl RoverPerception {
    /// Create a pipeline; calibration problems surface here, before any frame is processed
    pub fn new(calibration: Calibration) -> PerceptionResult<Self> {
        calibration.validate()?;

        let rectifier = PerspectiveRectifier::from_calibration(&calibration)?;
        let classifier = PixelClassifier::new(calibration.thresholds);
        let accumulator = MapAccumulator::new(AttitudeGate::new(calibration.attitude_gate_deg), calibration.grid_size)?;

        tracing::info!("{}", calibration.summary());

        Ok(Self {
            calibration,
            rectifier,
            classifier,
            accumulator,
        })
    }

    /// Fresh outputs with an empty world map
    pub fn new_output(&self) -> PerceptionResult<PerceptionOutput> {
        Ok(PerceptionOutput::new(
            self.calibration.frame_width,
            self.calibration.frame_height,
            self.accumulator.new_grid()?,
        ))
    }

    /// Fresh vehicle state for the start of a mission
    pub fn new_state(&self, frame: Frame, pose: Pose) -> PerceptionResult<RoverState> {
        let (width, height) = self.dimensions();
        Ok(RoverState {
            input: SensorInput { frame, pose },
            output: self.new_output()?,
            warped: Frame::new(width, height),
        })
    }

    /// Run everything up to, but not including, the map update
    pub fn perceive(&self, frame: &Frame, pose: &Pose) -> PerceptionResult<FramePerception> {
        let warped = self.rectifier.rectify(frame)?;
        self.perceive_rectified(&warped, pose)
    }

    /// Classify and convert an already top-down frame
    pub fn perceive_rectified(&self, warped: &Frame, pose: &Pose) -> PerceptionResult<FramePerception> {
        let (width, height) = warped.dimensions();
        let (expected_width, expected_height) = self.dimensions();
        if (width, height) != (expected_width, expected_height) {
            return Err(VisionError::InvalidFrame { width, height, expected_width, expected_height }.into());
        }
        let masks = self.classifier.classify(warped)?;

        let scale = self.calibration.scale;
        let grid_size = self.calibration.grid_size;
        let chain = |mask: &Mask| {
            let points = vehicle_coords(mask);
            let world = to_world(&points, pose, scale, grid_size);
            (points, world)
        };

        let ((terrain, terrain_world), ((obstacle, obstacle_world), (sample, sample_world))) = rayon::join(
            || chain(&masks.terrain),
            || rayon::join(|| chain(&masks.obstacle), || chain(&masks.sample)),
        );
        let nav = to_polar(&terrain);

        Ok(FramePerception {
            masks,
            points: ClassPoints { terrain, obstacle, sample },
            nav,
            world: WorldObservations {
                navigable: terrain_world,
                obstacle: obstacle_world,
                sample: sample_world,
            },
        })
    }

    /// Process the current input and update the outputs.
    ///
    /// On error the outputs keep their previous values. When the attitude gate
    /// rejects the frame the map is unchanged but the masks and polar summary
    /// are still published.
    pub fn perception_step(&self, state: &mut RoverState) -> PerceptionResult<FrameReport> {
        let perceived = self
            .rectifier
            .rectify_into(&state.input.frame, &mut state.warped)
            .map_err(PerceptionError::from)
            .and_then(|()| self.perceive_rectified(&state.warped, &state.input.pose));
        let perception = match perceived {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("frame rejected: {}", e);
                return Err(e);
            }
        };
        self.commit(perception, state)
    }

    /// Apply a frame's results to the state: gated map update, then masks and polar summary.
    ///
    /// The map is either fully updated or left untouched.
    pub fn commit(&self, perception: FramePerception, state: &mut RoverState) -> PerceptionResult<FrameReport> {
        let pose = state.input.pose;
        let decision = self
            .accumulator
            .accumulate(&mut state.output.world_map, &perception.world, pose.roll, pose.pitch)?;

        let (terrain_pixels, obstacle_pixels, sample_pixels) = perception.masks.counts();
        let report = FrameReport {
            terrain_pixels,
            obstacle_pixels,
            sample_pixels,
            decision,
            mean_bearing: perception.nav.mean_bearing(),
        };

        let output = &mut state.output;
        if output.vision_image.dimensions() == perception.masks.terrain.dimensions() {
            display::pack_vision_image_into(&perception.masks, &mut output.vision_image);
        } else {
            output.vision_image = display::pack_vision_image(&perception.masks);
        }
        output.nav = perception.nav;
        output.frames_seen += 1;
        if decision.is_committed() {
            output.frames_committed += 1;
        }

        tracing::debug!(
            terrain = report.terrain_pixels,
            obstacle = report.obstacle_pixels,
            sample = report.sample_pixels,
            committed = decision.is_committed(),
            "perception step"
        );

        Ok(report)
    }

    /// Get pipeline calibration
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Get frame dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        self.rectifier.dimensions()
    }
}
