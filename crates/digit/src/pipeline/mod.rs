pub mod builder;

use image::{GrayImage, Luma};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    algorithms::{BoundingBox, Placement, composite_centered, crop_and_scale, deskew, ink_bounds},
    config::NormalizeConfig,
    error::{DigitError, Result},
};

/// Normalized raster plus what each stage decided along the way.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub image: GrayImage,
    pub report: NormalizeReport,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct NormalizeReport {
    /// Ink found in the input, `None` for a blank drawing.
    pub bounds: Option<BoundingBox>,
    /// Size of the crop after aspect-preserving rescale.
    pub scaled_size: Option<(u32, u32)>,
    pub placement: Option<Placement>,
    /// Shear factor applied by the deskew stage.
    pub skew: Option<f64>,
}

/// Shapes a free-hand drawing into the MNIST layout: cropped, rescaled,
/// centered by mass and deskewed on a fixed square canvas.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizeConfig,
}

impl Normalizer {
    /// Create a new normalizer builder
    pub fn builder() -> builder::NormalizerBuilder {
        builder::NormalizerBuilder::new()
    }

    pub fn new(config: NormalizeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    fn blank(&self) -> GrayImage {
        let size = self.config.canvas_size;
        GrayImage::from_pixel(size, size, Luma([self.config.background]))
    }

    /// Run every normalization stage over `image`.
    pub fn normalize(&self, image: &GrayImage) -> Result<Normalized> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DigitError::EmptyRaster { width, height });
        }
        let config = &self.config;

        // Step 1: locate the ink
        let Some(bounds) = ink_bounds(image, config.threshold) else {
            warn!(
                width,
                height,
                threshold = config.threshold,
                "no ink found, emitting blank canvas"
            );
            return Ok(Normalized {
                image: self.blank(),
                report: NormalizeReport {
                    bounds: None,
                    scaled_size: None,
                    placement: None,
                    skew: None,
                },
            });
        };

        // Step 2: crop with padding and rescale the long side
        let scaled = crop_and_scale(image, bounds, config.padding, config.target_long_side);

        // Step 3: paste centered by mass
        let (centered, placement) =
            composite_centered(&scaled, config.canvas_size, config.background, config.paste);

        // Step 4: straighten slant
        let deskewed = deskew(&centered, config.background);

        debug!(
            ?bounds,
            scaled = ?scaled.dimensions(),
            offset_x = placement.offset_x,
            offset_y = placement.offset_y,
            skew = ?deskewed.skew,
            "normalized drawing"
        );

        Ok(Normalized {
            image: deskewed.image,
            report: NormalizeReport {
                bounds: Some(bounds),
                scaled_size: Some(scaled.dimensions()),
                placement: Some(placement),
                skew: deskewed.skew,
            },
        })
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            config: NormalizeConfig::default(),
        }
    }
}
