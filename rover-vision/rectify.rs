use image::Rgb;
use imageproc::geometric_transformations::Projection;
use rayon::prelude::*;
use rover_core::Frame;
use crate::config::{check_quadrilateral, quad, Calibration};
use crate::error::{VisionError, VisionResult};

/// Fill value for rectified pixels whose pre-image lies outside the camera frame
const OUT_OF_FRAME: Rgb<u8> = Rgb([0, 0, 0]);

/// Warps camera frames into a top-down view with a fixed homography.
///
/// The projection is solved once from the four-point correspondence and reused
/// for every frame. Output frames keep the input dimensions.
///
/// Each output pixel is sampled bilinearly at its pre-image. A pre-image counts
/// as inside the camera frame when it falls within the footprint of a source
/// pixel, `[-0.5, w - 0.5) x [-0.5, h - 0.5)`; the interpolation neighbours are
/// clamped to the frame edge so the outermost rows and columns survive.
#[derive(Clone)]
pub struct PerspectiveRectifier {
    to_source: Projection,
    w: u32,
    h: u32,
}

impl PerspectiveRectifier {
    /// Solve the homography mapping `src` onto `dst` for frames of the given size
    pub fn new(src: &[(f32, f32)], dst: &[(f32, f32)], width: u32, height: u32) -> VisionResult<Self> {
        if width == 0 || height == 0 {
            return Err(VisionError::InvalidCalibration(format!(
                "frame dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        let src = quad("source", src)?;
        let dst = quad("destination", dst)?;
        check_quadrilateral("source", &src)?;
        check_quadrilateral("destination", &dst)?;

        let projection = Projection::from_control_points(src, dst).ok_or_else(|| {
            VisionError::InvalidCalibration("no homography maps the source quadrilateral onto the destination".to_string())
        })?;

        Ok(Self {
            to_source: projection.invert(),
            w: width,
            h: height,
        })
    }

    /// Build from a calibration's rectification points and frame size
    pub fn from_calibration(cal: &Calibration) -> VisionResult<Self> {
        Self::new(&cal.rectify_src, &cal.rectify_dst, cal.frame_width, cal.frame_height)
    }

    /// Validates frame dimensions before warping
    fn validate_frame(&self, frame: &Frame) -> VisionResult<()> {
        let (width, height) = frame.dimensions();
        if width != self.w || height != self.h {
            return Err(VisionError::InvalidFrame {
                width,
                height,
                expected_width: self.w,
                expected_height: self.h,
            });
        }
        Ok(())
    }

    /// Rectify a frame into a newly allocated top-down frame
    pub fn rectify(&self, frame: &Frame) -> VisionResult<Frame> {
        let mut out = Frame::new(self.w, self.h);
        self.rectify_into(frame, &mut out)?;
        Ok(out)
    }

    /// Rectify into a caller-owned buffer of the same dimensions
    pub fn rectify_into(&self, frame: &Frame, out: &mut Frame) -> VisionResult<()> {
        self.validate_frame(frame)?;
        self.validate_frame(out)?;

        let (w, h) = (self.w as usize, self.h as usize);
        let src = frame.as_raw();
        let to_source = self.to_source;
        let dst: &mut [u8] = out;
        dst.par_chunks_mut(w * 3).enumerate().for_each(|(row, out_row)| {
            for (col, px) in out_row.chunks_exact_mut(3).enumerate() {
                let (sx, sy) = to_source * (col as f32, row as f32);
                let value = sample_clamped(src, w, h, sx, sy).unwrap_or(OUT_OF_FRAME.0);
                px.copy_from_slice(&value);
            }
        });
        Ok(())
    }

    /// Get frame dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.w, self.h)
    }
}

/// Bilinear sample of an RGB buffer with neighbours clamped to the edge.
/// `None` when the point lies outside every source pixel's footprint (NaN included).
#[inline(always)]
fn sample_clamped(src: &[u8], w: usize, h: usize, sx: f32, sy: f32) -> Option<[u8; 3]> {
    let inside = sx >= -0.5 && sx < w as f32 - 0.5 && sy >= -0.5 && sy < h as f32 - 0.5;
    if !inside {
        return None;
    }

    let x = sx.clamp(0.0, (w - 1) as f32);
    let y = sy.clamp(0.0, (h - 1) as f32);
    let (x0, y0) = (x.floor() as usize, y.floor() as usize);
    let (x1, y1) = ((x0 + 1).min(w - 1), (y0 + 1).min(h - 1));
    let (fx, fy) = (x - x0 as f32, y - y0 as f32);

    let at = |xx: usize, yy: usize, c: usize| src[(yy * w + xx) * 3 + c] as f32;
    let mut out = [0u8; 3];
    for (c, v) in out.iter_mut().enumerate() {
        let top = at(x0, y0, c) * (1.0 - fx) + at(x1, y0, c) * fx;
        let bottom = at(x0, y1, c) * (1.0 - fx) + at(x1, y1, c) * fx;
        *v = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: [(f32, f32); 4] = [(10.0, 10.0), (30.0, 10.0), (30.0, 30.0), (10.0, 30.0)];

    fn shifted(dx: f32, dy: f32) -> Vec<(f32, f32)> {
        SQUARE.iter().map(|&(x, y)| (x + dx, y + dy)).collect()
    }

    fn create_test_frame(width: u32, height: u32) -> Frame {
        Frame::from_fn(width, height, |x, y| Rgb([(x * 5 % 256) as u8, (y * 7 % 256) as u8, 200]))
    }

    fn create_dot_frame(width: u32, height: u32, x: u32, y: u32) -> Frame {
        let mut frame = Frame::new(width, height);
        frame.put_pixel(x, y, Rgb([255, 255, 255]));
        frame
    }

    #[test]
    fn test_dimensions_preserved() {
        let cal = Calibration::simulator();
        let rectifier = PerspectiveRectifier::from_calibration(&cal).unwrap();
        let out = rectifier.rectify(&create_test_frame(320, 160)).unwrap();
        assert_eq!(out.dimensions(), (320, 160));
        assert_eq!(rectifier.dimensions(), (320, 160));
    }

    #[test]
    fn test_identity_correspondence() {
        let rectifier = PerspectiveRectifier::new(&SQUARE, &SQUARE, 40, 40).unwrap();
        let frame = create_test_frame(40, 40);
        let out = rectifier.rectify(&frame).unwrap();
        for y in 5..35 {
            for x in 5..35 {
                let a = frame.get_pixel(x, y);
                let b = out.get_pixel(x, y);
                for c in 0..3 {
                    assert!((a[c] as i32 - b[c] as i32).abs() <= 1, "mismatch at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_translation_moves_pixels_and_fills_zero() {
        let rectifier = PerspectiveRectifier::new(&SQUARE, &shifted(2.0, 3.0), 40, 40).unwrap();
        let out = rectifier.rectify(&create_dot_frame(40, 40, 20, 20)).unwrap();
        assert!(out.get_pixel(22, 23)[0] > 250);
        assert!(out.get_pixel(20, 20)[0] < 5);

        // Rows whose pre-image lies above the frame are filled with zero
        let bright = Frame::from_pixel(40, 40, Rgb([255, 255, 255]));
        let out = rectifier.rectify(&bright).unwrap();
        for x in 0..40 {
            assert_eq!(out.get_pixel(x, 0), &Rgb([0, 0, 0]));
            assert_eq!(out.get_pixel(x, 1), &Rgb([0, 0, 0]));
        }
        assert!(out.get_pixel(20, 20)[0] > 250);
    }

    #[test]
    fn test_identity_keeps_outer_rows_and_columns() {
        let rectifier = PerspectiveRectifier::new(&SQUARE, &SQUARE, 40, 40).unwrap();
        let bright = Frame::from_pixel(40, 40, Rgb([255, 255, 255]));
        let out = rectifier.rectify(&bright).unwrap();
        for i in 0..40 {
            assert_eq!(out.get_pixel(i, 39), &Rgb([255, 255, 255]), "last row at {i}");
            assert_eq!(out.get_pixel(39, i), &Rgb([255, 255, 255]), "last column at {i}");
            assert_eq!(out.get_pixel(i, 0), &Rgb([255, 255, 255]), "first row at {i}");
        }

        let out = rectifier.rectify(&create_dot_frame(40, 40, 20, 39)).unwrap();
        assert!(out.get_pixel(20, 39)[0] > 250);
        assert!(out.get_pixel(20, 38)[0] < 5);
    }

    #[test]
    fn test_sample_clamped_footprint() {
        let src = [10u8, 20, 30, 110, 120, 130];
        assert_eq!(sample_clamped(&src, 2, 1, 0.0, 0.0), Some([10, 20, 30]));
        assert_eq!(sample_clamped(&src, 2, 1, 0.5, 0.0), Some([60, 70, 80]));
        assert_eq!(sample_clamped(&src, 2, 1, 1.4, 0.3), Some([110, 120, 130]));
        assert_eq!(sample_clamped(&src, 2, 1, -0.6, 0.0), None);
        assert_eq!(sample_clamped(&src, 2, 1, 1.5, 0.0), None);
        assert_eq!(sample_clamped(&src, 2, 1, f32::NAN, 0.0), None);
    }

    #[test]
    fn test_rectify_into_matches_rectify() {
        let rectifier = PerspectiveRectifier::from_calibration(&Calibration::simulator()).unwrap();
        let frame = create_test_frame(320, 160);
        let mut out = Frame::new(320, 160);
        rectifier.rectify_into(&frame, &mut out).unwrap();
        assert_eq!(out, rectifier.rectify(&frame).unwrap());
    }

    #[test]
    fn test_wrong_frame_size() {
        let rectifier = PerspectiveRectifier::from_calibration(&Calibration::simulator()).unwrap();
        let result = rectifier.rectify(&create_test_frame(100, 100));
        assert!(matches!(result, Err(VisionError::InvalidFrame { width: 100, height: 100, .. })));
    }

    #[test]
    fn test_invalid_point_count() {
        let result = PerspectiveRectifier::new(&SQUARE[..3], &SQUARE, 40, 40);
        assert!(matches!(result, Err(VisionError::InvalidCalibration(_))));
    }

    #[test]
    fn test_invalid_dimensions() {
        let result = PerspectiveRectifier::new(&SQUARE, &SQUARE, 0, 40);
        assert!(matches!(result, Err(VisionError::InvalidCalibration(_))));
    }
}
