use image::{Rgb, RgbImage};
use rover_vision::ClassMasks;

/// Pack class masks into one RGB image for the display.
///
/// Channel 0 carries samples, channel 1 obstacles and channel 2 navigable
/// terrain; a set pixel becomes 255.
pub fn pack_vision_image(masks: &ClassMasks) -> RgbImage {
    let mut out = RgbImage::new(masks.terrain.width(), masks.terrain.height());
    pack_vision_image_into(masks, &mut out);
    out
}

/// Same as [`pack_vision_image`], writing into an existing buffer of matching size
pub fn pack_vision_image_into(masks: &ClassMasks, out: &mut RgbImage) {
    let on = |v: u8| if v != 0 { 255 } else { 0 };
    let pixels = masks
        .sample
        .as_raw()
        .iter()
        .zip(masks.obstacle.as_raw())
        .zip(masks.terrain.as_raw());
    for (px, ((&s, &o), &t)) in out.pixels_mut().zip(pixels) {
        *px = Rgb([on(s), on(o), on(t)]);
    }
}
