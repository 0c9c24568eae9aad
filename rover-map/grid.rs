use image::{Rgb, RgbImage};
use rover_core::{MapLayer, WorldPoints};
use crate::error::{MapError, MapResult};

const LAYERS: usize = 3;

/// Square world map with one hit counter per layer per cell.
///
/// Counters only ever grow. Storage is a single contiguous buffer sized once
/// at construction, indexed `(y * size + x) * 3 + layer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldGrid {
    size: usize,
    cells: Vec<u32>,
}

impl WorldGrid {
    /// Creates an empty `size` × `size` grid
    pub fn new(size: usize) -> MapResult<Self> {
        if size == 0 {
            return Err(MapError::EmptyGrid);
        }
        Ok(Self {
            size,
            cells: vec![0; size * size * LAYERS],
        })
    }

    /// Side length in cells
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    fn offset(&self, layer: MapLayer, x: usize, y: usize) -> usize {
        (y * self.size + x) * LAYERS + layer.index()
    }

    /// Counter value, `None` outside the grid
    pub fn get(&self, layer: MapLayer, x: usize, y: usize) -> Option<u32> {
        if x >= self.size || y >= self.size {
            return None;
        }
        Some(self.cells[self.offset(layer, x, y)])
    }

    /// Add one hit to a cell. Coordinates must already be inside the grid.
    #[inline(always)]
    pub fn increment(&mut self, layer: MapLayer, x: usize, y: usize) {
        debug_assert!(x < self.size && y < self.size);
        let i = self.offset(layer, x, y);
        self.cells[i] = self.cells[i].saturating_add(1);
    }

    /// Add one hit per point; repeated cells accumulate
    pub fn add_points(&mut self, layer: MapLayer, points: &WorldPoints) {
        for (x, y) in points.iter() {
            self.increment(layer, x, y);
        }
    }

    /// Sum of all counters in a layer
    pub fn layer_total(&self, layer: MapLayer) -> u64 {
        self.cells
            .iter()
            .skip(layer.index())
            .step_by(LAYERS)
            .map(|&c| c as u64)
            .sum()
    }

    /// Cells with at least one hit in the layer
    pub fn occupied_cells(&self, layer: MapLayer) -> usize {
        self.cells
            .iter()
            .skip(layer.index())
            .step_by(LAYERS)
            .filter(|&&c| c > 0)
            .count()
    }

    /// True if no cell of `self` is lower than the same cell of `earlier`
    pub fn dominates(&self, earlier: &WorldGrid) -> bool {
        self.size == earlier.size && self.cells.iter().zip(&earlier.cells).all(|(now, then)| now >= then)
    }

    /// Render as RGB: red = obstacle, green = sample, blue = navigable, counts saturate at 255.
    ///
    /// Image row 0 is world `y = size - 1` so the map reads with +y up.
    pub fn to_image(&self) -> RgbImage {
        let size = self.size as u32;
        RgbImage::from_fn(size, size, |col, row| {
            let x = col as usize;
            let y = self.size - 1 - row as usize;
            let base = self.offset(MapLayer::Obstacle, x, y);
            let px = &self.cells[base..base + LAYERS];
            Rgb([
                px[0].min(255) as u8,
                px[1].min(255) as u8,
                px[2].min(255) as u8,
            ])
        })
    }
}
