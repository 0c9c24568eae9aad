use rayon::prelude::*;
use rover_core::{Frame, Mask, RgbThreshold, TerrainClass};
use crate::config::ClassThresholds;
use crate::error::{VisionError, VisionResult};

/// Binary masks for the three terrain classes of one frame
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMasks {
    pub terrain: Mask,
    pub obstacle: Mask,
    pub sample: Mask,
}

impl ClassMasks {
    pub fn get(&self, class: TerrainClass) -> &Mask {
        match class {
            TerrainClass::Navigable => &self.terrain,
            TerrainClass::Obstacle => &self.obstacle,
            TerrainClass::Sample => &self.sample,
        }
    }

    /// Number of set pixels per class as (terrain, obstacle, sample)
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            active_pixel_count(&self.terrain),
            active_pixel_count(&self.obstacle),
            active_pixel_count(&self.sample),
        )
    }
}

/// Count pixels set in a mask
pub fn active_pixel_count(mask: &Mask) -> usize {
    mask.as_raw().par_iter().filter(|&&v| v != 0).count()
}

/// Threshold a frame into a 0/1 mask.
///
/// A pixel is set iff R, G and B all strictly exceed the threshold.
pub fn color_threshold(frame: &Frame, threshold: RgbThreshold) -> VisionResult<Mask> {
    let (width, height) = frame.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return Err(VisionError::EmptyFrame { width, height });
    }

    let mut data = vec![0u8; w * h];
    data.par_chunks_mut(w)
        .zip(frame.as_raw().par_chunks(w * 3))
        .for_each(|(out_row, in_row)| {
            for (out, px) in out_row.iter_mut().zip(in_row.chunks_exact(3)) {
                *out = threshold.is_exceeded_by([px[0], px[1], px[2]]) as u8;
            }
        });

    Mask::from_raw(width, height, data).ok_or(VisionError::InvalidFrameData {
        expected_len: w * h,
        actual_len: frame.as_raw().len() / 3,
    })
}

/// Classifies rectified frames into terrain, obstacle and sample masks
#[derive(Debug, Clone)]
pub struct PixelClassifier {
    thresholds: ClassThresholds,
}

impl PixelClassifier {
    pub fn new(thresholds: ClassThresholds) -> Self {
        Self { thresholds }
    }

    /// Classify a single class
    pub fn classify_class(&self, frame: &Frame, class: TerrainClass) -> VisionResult<Mask> {
        color_threshold(frame, self.thresholds.get(class))
    }

    /// Classify all three classes; masks are independent and may overlap
    pub fn classify(&self, frame: &Frame) -> VisionResult<ClassMasks> {
        let (terrain, (obstacle, sample)) = rayon::join(
            || color_threshold(frame, self.thresholds.terrain),
            || {
                rayon::join(
                    || color_threshold(frame, self.thresholds.obstacle),
                    || color_threshold(frame, self.thresholds.sample),
                )
            },
        );

        Ok(ClassMasks {
            terrain: terrain?,
            obstacle: obstacle?,
            sample: sample?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use proptest::prelude::*;

    fn create_test_frame(width: u32, height: u32) -> Frame {
        Frame::from_fn(width, height, |x, y| {
            Rgb([(x * 13 % 256) as u8, (y * 29 % 256) as u8, ((x + y) * 7 % 256) as u8])
        })
    }

    #[test]
    fn test_black_frame_gives_empty_mask() {
        let frame = Frame::new(32, 16);
        for t in [RgbThreshold::new(0, 0, 0), RgbThreshold::new(160, 160, 160)] {
            let mask = color_threshold(&frame, t).unwrap();
            assert_eq!(mask.dimensions(), (32, 16));
            assert_eq!(active_pixel_count(&mask), 0);
        }
    }

    #[test]
    fn test_threshold_is_strict_per_channel() {
        let mut frame = Frame::new(3, 1);
        frame.put_pixel(0, 0, Rgb([161, 161, 161]));
        frame.put_pixel(1, 0, Rgb([160, 255, 255]));
        frame.put_pixel(2, 0, Rgb([255, 255, 160]));
        let mask = color_threshold(&frame, RgbThreshold::new(160, 160, 160)).unwrap();
        assert_eq!(mask.as_raw(), &vec![1, 0, 0]);
    }

    #[test]
    fn test_masks_may_overlap() {
        let frame = Frame::from_pixel(4, 4, Rgb([200, 200, 200]));
        let classifier = PixelClassifier::new(ClassThresholds::default());
        let masks = classifier.classify(&frame).unwrap();
        assert_eq!(masks.counts(), (16, 16, 16));
    }

    #[test]
    fn test_sample_color() {
        // Yellow rock: bright red and green, little blue
        let frame = Frame::from_pixel(2, 2, Rgb([180, 140, 20]));
        let classifier = PixelClassifier::new(ClassThresholds::default());
        let masks = classifier.classify(&frame).unwrap();
        assert_eq!(active_pixel_count(&masks.terrain), 0);
        assert_eq!(active_pixel_count(&masks.sample), 4);
        assert_eq!(masks.get(TerrainClass::Sample), &masks.sample);
    }

    #[test]
    fn test_classify_class_matches_classify() {
        let frame = create_test_frame(64, 32);
        let classifier = PixelClassifier::new(ClassThresholds::default());
        let masks = classifier.classify(&frame).unwrap();
        assert_eq!(classifier.classify_class(&frame, TerrainClass::Obstacle).unwrap(), masks.obstacle);
    }

    #[test]
    fn test_empty_frame_is_invalid() {
        let frame = Frame::new(0, 10);
        let classifier = PixelClassifier::new(ClassThresholds::default());
        assert!(classifier.classify(&frame).unwrap_err().is_frame_error());
        let result = color_threshold(&frame, RgbThreshold::new(0, 0, 0));
        let err = result.unwrap_err();
        assert!(matches!(err, VisionError::EmptyFrame { width: 0, height: 10 }));
        assert!(err.is_frame_error());
        assert!(err.to_string().starts_with("invalid frame"));
    }

    proptest! {
        #[test]
        fn prop_mask_matches_rule(
            pixels in proptest::collection::vec(any::<[u8; 3]>(), 12),
            r in any::<u8>(), g in any::<u8>(), b in any::<u8>(),
        ) {
            let frame = Frame::from_fn(4, 3, |x, y| Rgb(pixels[(y * 4 + x) as usize]));
            let t = RgbThreshold::new(r, g, b);
            let mask = color_threshold(&frame, t).unwrap();
            for (x, y, px) in frame.enumerate_pixels() {
                let expected = px[0] > r && px[1] > g && px[2] > b;
                prop_assert_eq!(mask.get_pixel(x, y)[0], expected as u8);
            }
        }
    }
}
