use rover_core::MapLayer;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("world grid size must be at least 1")]
    EmptyGrid,
    #[error("world grid is {actual}x{actual}, calibration expects {expected}x{expected}")]
    GridSizeMismatch { expected: usize, actual: usize },
    #[error("cell ({x}, {y}) outside {size}x{size} grid")]
    CellOutOfBounds { x: usize, y: usize, size: usize },
    #[error("{layer:?} observations have {x_len} x values but {y_len} y values")]
    UnpairedPoints { layer: MapLayer, x_len: usize, y_len: usize },
}

pub type MapResult<T> = Result<T, MapError>;
