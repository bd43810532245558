use image::{GrayImage, Luma};

use super::centroid::Mass;

/// Below this vertical spread the shear factor is numerically meaningless.
pub const MIN_VERTICAL_SPREAD: f64 = 1e-6;

/// Second-order central moments of a raster's intensity distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub mass: f64,
    pub mean_x: f64,
    pub mean_y: f64,
    pub mu11: f64,
    pub mu02: f64,
}

impl Moments {
    /// Moments of `image`, or `None` when it carries no ink at all.
    pub fn compute(image: &GrayImage) -> Option<Self> {
        let mass = Mass::of(image);
        let mean = mass.mean()?;

        let (mu11, mu02) = image
            .enumerate_pixels()
            .fold((0.0, 0.0), |(mu11, mu02), (x, y, pixel)| {
                let weight = pixel[0] as f64 / 255.0;
                let dx = x as f64 - mean.x;
                let dy = y as f64 - mean.y;
                (mu11 + dx * dy * weight, mu02 + dy * dy * weight)
            });

        Some(Self {
            mass: mass.total,
            mean_x: mean.x,
            mean_y: mean.y,
            mu11,
            mu02,
        })
    }

    /// Horizontal shear factor `mu11 / mu02`, if the vertical spread allows one.
    pub fn skew(&self) -> Option<f64> {
        (self.mu02.abs() >= MIN_VERTICAL_SPREAD).then(|| self.mu11 / self.mu02)
    }
}

/// Resample `image` through `x' = x + skew * (y - pivot_y)`, `y' = y`.
///
/// Each destination pixel center is mapped back through the inverse shear and takes the
/// source pixel containing it; samples falling outside the source become `background`.
pub fn shear(image: &GrayImage, skew: f64, pivot_y: f64, background: u8) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let center_y = y as f64 + 0.5;
        let source_x = (x as f64 + 0.5 - skew * (center_y - pivot_y)).floor();
        if source_x < 0.0 || source_x >= width as f64 {
            Luma([background])
        } else {
            *image.get_pixel(source_x as u32, y)
        }
    })
}

/// Result of the deskew stage.
#[derive(Debug, Clone)]
pub struct Deskewed {
    pub image: GrayImage,
    /// Shear factor applied, `None` when the input was left untouched.
    pub skew: Option<f64>,
}

/// Shear `image` by its own `mu11 / mu02` around the mean row.
///
/// Blank rasters and rasters without vertical spread come back unchanged.
pub fn deskew(image: &GrayImage, background: u8) -> Deskewed {
    let Some(moments) = Moments::compute(image) else {
        return Deskewed { image: image.clone(), skew: None };
    };
    let Some(skew) = moments.skew() else {
        return Deskewed { image: image.clone(), skew: None };
    };

    Deskewed {
        image: shear(image, skew, moments.mean_y, background),
        skew: Some(skew),
    }
}
