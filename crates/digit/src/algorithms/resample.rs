use image::{GrayImage, imageops};

use super::bounds::BoundingBox;

/// Round half up, the convention every stage of the normalization shares.
pub(crate) fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Output size when the longer of `width`/`height` is scaled to `long_side`.
///
/// The shorter side keeps the aspect ratio, rounded to the nearest pixel and never below 1.
pub fn scaled_dimensions(width: u32, height: u32, long_side: u32) -> (u32, u32) {
    let shorter = |short: u32, long: u32| {
        let scaled = round_half_up(short as f64 * long_side as f64 / long as f64) as u32;
        scaled.max(1)
    };

    if width > height {
        (long_side, shorter(height, width))
    } else {
        (shorter(width, height), long_side)
    }
}

/// Source index sampled by destination index `dst` under pixel-center mapping.
fn nearest_source(dst: u32, dst_len: u32, src_len: u32) -> u32 {
    let src = ((dst as f64 + 0.5) * src_len as f64 / dst_len as f64).floor() as u32;
    src.min(src_len - 1)
}

/// Nearest-neighbor resize. Keeps stroke edges hard; no blended intermediate values.
pub fn resize_nearest(image: &GrayImage, width: u32, height: u32) -> GrayImage {
    let (src_width, src_height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let sx = nearest_source(x, width, src_width);
        let sy = nearest_source(y, height, src_height);
        *image.get_pixel(sx, sy)
    })
}

/// Crop to `bounds` plus `padding` and scale the longer side to `long_side`.
pub fn crop_and_scale(
    image: &GrayImage,
    bounds: BoundingBox,
    padding: u32,
    long_side: u32,
) -> GrayImage {
    let padded = bounds.expand(padding, image.width(), image.height());
    let cropped = imageops::crop_imm(
        image,
        padded.min_x,
        padded.min_y,
        padded.width(),
        padded.height(),
    )
    .to_image();

    let (width, height) = scaled_dimensions(padded.width(), padded.height(), long_side);
    resize_nearest(&cropped, width, height)
}
