use thiserror::Error;

use crate::types::Digit;

/// Opaque failure raised by a classifier implementation.
pub type ClassifierError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum DigitError {
    #[error("Failed to decode image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Raster has no pixels ({width}x{height})")]
    EmptyRaster { width: u32, height: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Request payload is empty")]
    EmptyPayload,

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Label {0} appears more than once")]
    DuplicateLabel(Digit),

    #[error("Classifier produced a non-finite score {value} for label {label}")]
    NonFiniteScore { label: Digit, value: f64 },

    #[error("Tensor error: {0}")]
    Tensor(String),

    #[error("Classifier returned {actual} scores, expected {expected}")]
    OutputShape { expected: usize, actual: usize },

    #[error("Failed to load model weights: {0}")]
    ModelLoad(String),

    #[error("Classifier failed: {0}")]
    Classifier(#[source] ClassifierError),

    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Unsupported config format. Please use .toml or .json files")]
    UnsupportedConfigFormat,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DigitError>;
