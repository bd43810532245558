use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{GrayImage, ImageFormat};

use crate::error::{DigitError, Result};

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Decode any supported image container into an 8-bit grayscale raster.
pub fn decode_grayscale(bytes: &[u8]) -> Result<GrayImage> {
    let image = image::load_from_memory(bytes)?;
    Ok(image.to_luma8())
}

/// Lossless PNG encoding of a grayscale raster.
pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Base64 payload of a data URL; a bare base64 string is accepted too.
pub fn decode_data_url(input: &str) -> Result<Vec<u8>> {
    let payload = match input.find(',') {
        Some(comma) => &input[comma + 1..],
        None => input,
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(DigitError::EmptyPayload);
    }
    Ok(STANDARD.decode(payload)?)
}

pub fn to_png_data_url(image: &GrayImage) -> Result<String> {
    let png = encode_png(image)?;
    Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png)))
}
