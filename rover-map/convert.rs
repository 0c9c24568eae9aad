//! Coordinate conversions between image, vehicle-centric, polar and world frames.
//!
//! Image frame: row/column from the top-left of the rectified image.
//! Vehicle frame: origin at the bottom-center of the image, `x` forward, `y` left.
//! World frame: integer grid cells, clamped into the map.

use rayon::prelude::*;
use rover_core::{Mask, PolarSummary, Pose, VehiclePoints, WorldPoints};
use std::f32::consts::PI;

/// Map every set mask pixel to vehicle-centric coordinates
pub fn vehicle_coords(mask: &Mask) -> VehiclePoints {
    let (width, height) = mask.dimensions();
    let half_width = width as f32 / 2.0;
    let height = height as f32;

    let mut points = VehiclePoints::default();
    // Row-major scan keeps the output in the same order as the mask
    for (col, row, px) in mask.enumerate_pixels() {
        if px[0] != 0 {
            points.push(height - row as f32, half_width - col as f32);
        }
    }
    points
}

/// Inverse of the re-origin: vehicle-centric point back to (row, column)
pub fn image_coords(x: f32, y: f32, width: u32, height: u32) -> (f32, f32) {
    (height as f32 - x, width as f32 / 2.0 - y)
}

/// Distance and bearing of one vehicle-centric point; bearing in (-π, π]
#[inline(always)]
pub fn polar(x: f32, y: f32) -> (f32, f32) {
    let distance = x.hypot(y);
    let bearing = y.atan2(x);
    // atan2(-0.0, negative) lands on -π
    let bearing = if bearing <= -PI { PI } else { bearing };
    (distance, bearing)
}

/// Convert a vehicle-centric point set to distances and bearings
pub fn to_polar(points: &VehiclePoints) -> PolarSummary {
    let (distances, bearings) = points.iter().map(|(x, y)| polar(x, y)).unzip();
    PolarSummary { distances, bearings }
}

/// Counter-clockwise rotation by `yaw_deg` degrees
#[inline(always)]
pub fn rotate(x: f32, y: f32, yaw_deg: f32) -> (f32, f32) {
    let (s, c) = yaw_deg.to_radians().sin_cos();
    (x * c - y * s, x * s + y * c)
}

/// Scale rotated pixel offsets down to world units and place them at the vehicle position
#[inline(always)]
pub fn translate(x_rot: f32, y_rot: f32, x_pos: f32, y_pos: f32, scale: f32) -> (f32, f32) {
    (x_rot / scale + x_pos, y_rot / scale + y_pos)
}

/// Truncate toward zero and clamp into [0, grid_size - 1]
#[inline(always)]
pub fn to_cell(value: f32, grid_size: usize) -> usize {
    let max = grid_size.saturating_sub(1) as i64;
    // `as` saturates on overflow and maps NaN to 0
    (value as i64).clamp(0, max) as usize
}

/// Vehicle-centric point to a clamped world cell: rotate, then translate and scale, then discretize
#[inline(always)]
pub fn world_cell(x: f32, y: f32, pose: &Pose, scale: f32, grid_size: usize) -> (usize, usize) {
    let (xr, yr) = rotate(x, y, pose.yaw);
    let (xw, yw) = translate(xr, yr, pose.x, pose.y, scale);
    (to_cell(xw, grid_size), to_cell(yw, grid_size))
}

/// Convert a vehicle-centric point set to world cells for the given pose
pub fn to_world(points: &VehiclePoints, pose: &Pose, scale: f32, grid_size: usize) -> WorldPoints {
    let (x, y) = points
        .x
        .par_iter()
        .zip(points.y.par_iter())
        .map(|(&x, &y)| world_cell(x, y, pose, scale, grid_size))
        .unzip();
    WorldPoints { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn create_mask(width: u32, height: u32, set: &[(u32, u32)]) -> Mask {
        let mut mask = Mask::new(width, height);
        for &(col, row) in set {
            mask.put_pixel(col, row, image::Luma([1]));
        }
        mask
    }

    #[test]
    fn test_empty_mask() {
        let points = vehicle_coords(&Mask::new(320, 160));
        assert!(points.is_empty());
        assert!(to_polar(&points).is_empty());
        assert!(to_world(&points, &Pose::default(), 30.0, 200).is_empty());
    }

    #[test]
    fn test_bottom_center_pixel() {
        let mask = create_mask(320, 160, &[(160, 159)]);
        let points = vehicle_coords(&mask);
        assert_eq!(points.x, vec![1.0]);
        assert_eq!(points.y, vec![0.0]);
    }

    #[test]
    fn test_axes_orientation() {
        // Top-left pixel is far ahead and to the left
        let mask = create_mask(320, 160, &[(0, 0), (319, 159)]);
        let points = vehicle_coords(&mask);
        assert_eq!(points.iter().collect::<Vec<_>>(), vec![(160.0, 160.0), (1.0, -159.0)]);
    }

    #[test]
    fn test_odd_width_uses_fractional_center() {
        let mask = create_mask(5, 4, &[(2, 3)]);
        let points = vehicle_coords(&mask);
        assert_eq!(points.y, vec![0.5]);
    }

    #[test]
    fn test_inverse_recovers_pixel() {
        let set = [(0, 0), (17, 3), (319, 159), (160, 80)];
        let mask = create_mask(320, 160, &set);
        let points = vehicle_coords(&mask);
        let mut recovered: Vec<(u32, u32)> = points
            .iter()
            .map(|(x, y)| {
                let (row, col) = image_coords(x, y, 320, 160);
                (col as u32, row as u32)
            })
            .collect();
        recovered.sort();
        let mut expected = set.to_vec();
        expected.sort();
        assert_eq!(recovered, expected);
    }

    #[test]
    fn test_polar_known_values() {
        assert_eq!(polar(0.0, 0.0), (0.0, 0.0));
        let (d, b) = polar(3.0, 4.0);
        assert!((d - 5.0).abs() < 1e-6);
        assert!((b - 4.0f32.atan2(3.0)).abs() < 1e-6);
        let (_, left) = polar(0.0, 2.0);
        assert!((left - PI / 2.0).abs() < 1e-6);
        let (_, right) = polar(0.0, -2.0);
        assert!((right + PI / 2.0).abs() < 1e-6);
        assert_eq!(polar(-1.0, -0.0).1, PI);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let (x, y) = rotate(1.0, 0.0, 90.0);
        assert!(x.abs() < 1e-6);
        assert!((y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_precedes_translation() {
        let pose = Pose::level(100.0, 100.0, 90.0);
        // 300 pixels forward at scale 30 with heading +y is 10 cells along +y
        assert_eq!(world_cell(300.0, 0.0, &pose, 30.0, 200), (100, 110));
    }

    #[test]
    fn test_truncation_and_clamping() {
        assert_eq!(to_cell(5.9, 200), 5);
        assert_eq!(to_cell(-0.5, 200), 0);
        assert_eq!(to_cell(-1e9, 200), 0);
        assert_eq!(to_cell(1e9, 200), 199);
        assert_eq!(to_cell(f32::INFINITY, 200), 199);
        assert_eq!(to_cell(f32::NAN, 200), 0);
        assert_eq!(to_cell(0.7, 1), 0);
    }

    #[test]
    fn test_to_world_keeps_pairing() {
        let points = VehiclePoints {
            x: vec![0.0, 30.0, 1e7],
            y: vec![0.0, -30.0, 0.0],
        };
        let world = to_world(&points, &Pose::level(50.0, 60.0, 0.0), 30.0, 200);
        assert_eq!(world.len(), 3);
        assert_eq!(world.iter().collect::<Vec<_>>(), vec![(50, 60), (51, 59), (199, 60)]);
    }

    proptest! {
        #[test]
        fn prop_polar_identity(x in -1e4f32..1e4, y in -1e4f32..1e4) {
            let (d, b) = polar(x, y);
            let expected = ((x as f64).powi(2) + (y as f64).powi(2)).sqrt() as f32;
            prop_assert!((d - expected).abs() <= 1e-3 * expected.max(1.0));
            prop_assert!(b > -PI && b <= PI);
        }

        #[test]
        fn prop_world_cells_are_clamped_and_deterministic(
            x in proptest::num::f32::ANY,
            y in proptest::num::f32::ANY,
            px in -1e6f32..1e6,
            py in -1e6f32..1e6,
            yaw in 0f32..360.0,
            scale in 0.01f32..1000.0,
            grid_size in 1usize..500,
        ) {
            let pose = Pose::level(px, py, yaw);
            let a = world_cell(x, y, &pose, scale, grid_size);
            let b = world_cell(x, y, &pose, scale, grid_size);
            prop_assert_eq!(a, b);
            prop_assert!(a.0 < grid_size && a.1 < grid_size);
        }
    }
}
