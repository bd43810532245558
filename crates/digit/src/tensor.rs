use std::borrow::Cow;

use burn::tensor::{Tensor, TensorData, backend::Backend};
use image::{DynamicImage, GrayImage, imageops::FilterType};

use crate::error::{DigitError, Result};

/// Classifier input: shape `[1, 1, size, size]`, values in `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct InputTensor {
    data: TensorData,
}

impl InputTensor {
    pub fn shape(&self) -> &[usize] {
        &self.data.shape
    }

    pub fn data(&self) -> &TensorData {
        &self.data
    }

    /// Row-major values in `(batch, channel, height, width)` order.
    pub fn values(&self) -> Result<&[f32]> {
        self.data
            .as_slice::<f32>()
            .map_err(|e| DigitError::Tensor(format!("{e:?}")))
    }

    /// Materialize on a burn backend.
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 4> {
        Tensor::from_data(self.data.clone(), device)
    }
}

/// Map an 8-bit intensity into `[-1, 1]`: scale to `[0, 1]`, then `(v - 0.5) / 0.5`.
pub fn normalize_intensity(value: f32) -> f32 {
    let unit = value / 255.0;
    (unit - 0.5) / 0.5
}

/// Convert a raster of any channel layout into the classifier's input tensor.
///
/// This function:
/// 1. Resizes to `size` x `size` when the spatial size differs
/// 2. Averages color channels into one (alpha is ignored)
/// 3. Normalizes every sample with [`normalize_intensity`]
/// 4. Lays the samples out as `[1, 1, size, size]`
pub fn prepare_tensor(image: &DynamicImage, size: u32) -> Result<InputTensor> {
    if image.width() == 0 || image.height() == 0 {
        return Err(DigitError::EmptyRaster {
            width: image.width(),
            height: image.height(),
        });
    }
    if size == 0 {
        return Err(DigitError::InvalidConfig("tensor size must be positive".into()));
    }

    let resized: Cow<DynamicImage> = if image.width() != size || image.height() != size {
        Cow::Owned(image.resize_exact(size, size, FilterType::Triangle))
    } else {
        Cow::Borrowed(image)
    };

    let values: Vec<f32> = if resized.color().has_color() {
        resized
            .to_rgb8()
            .pixels()
            .map(|p| {
                let mean = (p[0] as f32 + p[1] as f32 + p[2] as f32) / 3.0;
                normalize_intensity(mean)
            })
            .collect()
    } else {
        resized
            .to_luma8()
            .pixels()
            .map(|p| normalize_intensity(p[0] as f32))
            .collect()
    };

    // A single channel means HWC and CHW share the same row-major order.
    let side = size as usize;
    Ok(InputTensor {
        data: TensorData::new(values, [1, 1, side, side]),
    })
}

/// Shorthand for the grayscale output of the normalization pipeline.
pub fn prepare_gray(image: &GrayImage, size: u32) -> Result<InputTensor> {
    prepare_tensor(&DynamicImage::ImageLuma8(image.clone()), size)
}
