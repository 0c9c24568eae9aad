use image::{GrayImage, RgbImage};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major 8-bit RGB camera frame (width × height × 3)
pub type Frame = RgbImage;

/// Single-channel binary mask, every pixel is 0 or 1
pub type Mask = GrayImage;

/// Per-channel lower bounds; a pixel passes when every channel is strictly above its bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RgbThreshold {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbThreshold {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// True if all three channels strictly exceed the threshold
    #[inline(always)]
    pub fn is_exceeded_by(&self, px: [u8; 3]) -> bool {
        px[0] > self.r && px[1] > self.g && px[2] > self.b
    }
}

/// Semantic classes produced from one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TerrainClass {
    Navigable,
    Obstacle,
    Sample,
}

/// Accumulator layers of the world grid, in storage order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapLayer {
    Obstacle = 0,
    Sample = 1,
    Navigable = 2,
}

impl MapLayer {
    pub const ALL: [MapLayer; 3] = [MapLayer::Obstacle, MapLayer::Sample, MapLayer::Navigable];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl From<TerrainClass> for MapLayer {
    fn from(class: TerrainClass) -> Self {
        match class {
            TerrainClass::Navigable => MapLayer::Navigable,
            TerrainClass::Obstacle => MapLayer::Obstacle,
            TerrainClass::Sample => MapLayer::Sample,
        }
    }
}

/// Vehicle pose as reported by the vehicle state; angles in degrees within [0, 360)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub yaw: f32,
    pub roll: f32,
    pub pitch: f32,
}

impl Pose {
    pub fn new(x: f32, y: f32, yaw: f32, roll: f32, pitch: f32) -> Self {
        Self { x, y, yaw, roll, pitch }
    }

    /// Level pose at a world position with the given heading
    pub fn level(x: f32, y: f32, yaw: f32) -> Self {
        Self { x, y, yaw, roll: 0.0, pitch: 0.0 }
    }
}

/// Classified pixels in vehicle-centric coordinates.
///
/// Origin is the vehicle's ground-contact point, `x` grows forward and `y`
/// grows to the left. Units are rectified-image pixels. Both sequences always
/// have one entry per classified pixel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehiclePoints {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
}

impl VehiclePoints {
    #[inline(always)]
    pub fn push(&mut self, x: f32, y: f32) {
        self.x.push(x);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Distance/bearing pairs for navigable terrain; bearing in radians, positive to the left
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolarSummary {
    pub distances: Vec<f32>,
    pub bearings: Vec<f32>,
}

impl PolarSummary {
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Mean bearing in radians, `None` when nothing navigable is visible
    pub fn mean_bearing(&self) -> Option<f32> {
        if self.bearings.is_empty() {
            return None;
        }
        let sum: f64 = self.bearings.iter().map(|&b| b as f64).sum();
        Some((sum / self.bearings.len() as f64) as f32)
    }

    /// Mean bearing in degrees
    pub fn mean_bearing_deg(&self) -> Option<f32> {
        self.mean_bearing().map(f32::to_degrees)
    }

    /// Mean distance in rectified-image pixels
    pub fn mean_distance(&self) -> Option<f32> {
        if self.distances.is_empty() {
            return None;
        }
        let sum: f64 = self.distances.iter().map(|&d| d as f64).sum();
        Some((sum / self.distances.len() as f64) as f32)
    }
}

/// Integer world-grid cells, already clamped into the grid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldPoints {
    pub x: Vec<usize>,
    pub y: Vec<usize>,
}

impl WorldPoints {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads.max(1))
        .build_global()
}

/// Default worker count for the global pool
pub fn default_thread_count() -> usize {
    num_cpus::get().max(1)
}
