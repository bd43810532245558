use image::{GrayImage, Luma, imageops};
use serde::{Deserialize, Serialize};

use super::resample::round_half_up;
use crate::config::PasteBounds;

/// Intensity-weighted center of mass, in pixel coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
}

/// First-order mass accumulators, weights being `intensity / 255`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Mass {
    pub total: f64,
    pub sum_x: f64,
    pub sum_y: f64,
}

impl Mass {
    pub fn of(image: &GrayImage) -> Self {
        image
            .enumerate_pixels()
            .fold(Self::default(), |mut mass, (x, y, pixel)| {
                let weight = pixel[0] as f64 / 255.0;
                mass.total += weight;
                mass.sum_x += x as f64 * weight;
                mass.sum_y += y as f64 * weight;
                mass
            })
    }

    /// Mean coordinates, or `None` when the raster carries no mass.
    pub fn mean(&self) -> Option<Centroid> {
        (self.total != 0.0).then(|| Centroid {
            x: self.sum_x / self.total,
            y: self.sum_y / self.total,
        })
    }
}

/// Center of mass of `image`; the geometric center when it is completely dark.
pub fn centroid(image: &GrayImage) -> Centroid {
    Mass::of(image).mean().unwrap_or(Centroid {
        x: image.width() as f64 / 2.0,
        y: image.height() as f64 / 2.0,
    })
}

/// Where a raster was pasted onto the canvas and why.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    pub centroid: Centroid,
    pub offset_x: i64,
    pub offset_y: i64,
}

fn clamp_offset(offset: i64, canvas: u32, extent: u32, bounds: PasteBounds) -> i64 {
    bounds.min.max(bounds.max_for(canvas, extent).min(offset))
}

/// Paste offset that moves `centroid` of a `width` x `height` raster onto the canvas center.
pub fn paste_offset(
    centroid: Centroid,
    width: u32,
    height: u32,
    canvas_size: u32,
    bounds: PasteBounds,
) -> (i64, i64) {
    let center = canvas_size as f64 / 2.0;
    let offset_x = round_half_up(center - centroid.x) as i64;
    let offset_y = round_half_up(center - centroid.y) as i64;
    (
        clamp_offset(offset_x, canvas_size, width, bounds),
        clamp_offset(offset_y, canvas_size, height, bounds),
    )
}

/// Paste `image` onto a fresh `canvas_size` square so its center of mass sits at the center.
///
/// Pixels pushed past the canvas edge are dropped.
pub fn composite_centered(
    image: &GrayImage,
    canvas_size: u32,
    background: u8,
    bounds: PasteBounds,
) -> (GrayImage, Placement) {
    let centroid = centroid(image);
    let (offset_x, offset_y) =
        paste_offset(centroid, image.width(), image.height(), canvas_size, bounds);

    let mut canvas = GrayImage::from_pixel(canvas_size, canvas_size, Luma([background]));
    imageops::overlay(&mut canvas, image, offset_x, offset_y);

    (canvas, Placement { centroid, offset_x, offset_y })
}
