use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Inclusive pixel rectangle enclosing the ink of a raster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    fn point(x: u32, y: u32) -> Self {
        Self { min_x: x, min_y: y, max_x: x, max_y: y }
    }

    fn include(self, x: u32, y: u32) -> Self {
        Self {
            min_x: self.min_x.min(x),
            min_y: self.min_y.min(y),
            max_x: self.max_x.max(x),
            max_y: self.max_y.max(y),
        }
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Grow by `padding` on every side, clamped to a `width` x `height` raster.
    pub fn expand(&self, padding: u32, width: u32, height: u32) -> Self {
        Self {
            min_x: self.min_x.saturating_sub(padding),
            min_y: self.min_y.saturating_sub(padding),
            max_x: self.max_x.saturating_add(padding).min(width.saturating_sub(1)),
            max_y: self.max_y.saturating_add(padding).min(height.saturating_sub(1)),
        }
    }
}

/// Bounding box of every pixel brighter than `threshold`, or `None` for a blank raster.
pub fn ink_bounds(image: &GrayImage, threshold: u8) -> Option<BoundingBox> {
    image
        .enumerate_pixels()
        .filter(|(_, _, pixel)| pixel[0] > threshold)
        .fold(None, |bounds, (x, y, _)| {
            Some(match bounds {
                None => BoundingBox::point(x, y),
                Some(b) => b.include(x, y),
            })
        })
}
