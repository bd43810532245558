use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{DigitError, Result};

/// Intensity a pixel must strictly exceed to count as ink.
pub const INK_THRESHOLD: u8 = 18;
/// Margin kept around the ink before rescaling, so loops near the edge survive.
pub const CROP_PADDING: u32 = 4;
/// Length the longer side of the cropped ink is scaled to.
pub const TARGET_LONG_SIDE: u32 = 18;
/// Side of the square output canvas.
pub const CANVAS_SIZE: u32 = 28;
pub const BACKGROUND: u8 = 0;
/// Lowest paste offset allowed when centering by mass.
pub const PASTE_OFFSET_MIN: i64 = -2;
/// How far past `canvas - resampled` the paste offset may go.
pub const PASTE_OFFSET_SLACK: i64 = 2;
pub const TOP_K: usize = 3;
/// Spatial size of the classifier input.
pub const TENSOR_SIZE: u32 = 28;

/// Clamp range for the centroid paste offset: `[min, canvas - resampled + slack]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct PasteBounds {
    pub min: i64,
    pub slack: i64,
}

impl Default for PasteBounds {
    fn default() -> Self {
        Self {
            min: PASTE_OFFSET_MIN,
            slack: PASTE_OFFSET_SLACK,
        }
    }
}

impl PasteBounds {
    /// Upper clamp for an image of `extent` pixels pasted onto a `canvas` side.
    pub fn max_for(&self, canvas: u32, extent: u32) -> i64 {
        canvas as i64 - extent as i64 + self.slack
    }
}

/// Parameters of the raster normalization stages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct NormalizeConfig {
    pub threshold: u8,
    pub padding: u32,
    #[schemars(range(min = 1))]
    pub target_long_side: u32,
    #[schemars(range(min = 1))]
    pub canvas_size: u32,
    pub background: u8,
    pub paste: PasteBounds,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            threshold: INK_THRESHOLD,
            padding: CROP_PADDING,
            target_long_side: TARGET_LONG_SIDE,
            canvas_size: CANVAS_SIZE,
            background: BACKGROUND,
            paste: PasteBounds::default(),
        }
    }
}

impl NormalizeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.canvas_size == 0 {
            return Err(DigitError::InvalidConfig("canvas_size must be positive".into()));
        }
        if self.target_long_side == 0 {
            return Err(DigitError::InvalidConfig("target_long_side must be positive".into()));
        }
        if self.target_long_side > self.canvas_size {
            return Err(DigitError::InvalidConfig(format!(
                "target_long_side ({}) exceeds canvas_size ({})",
                self.target_long_side, self.canvas_size
            )));
        }
        if self.paste.min > self.paste.slack {
            return Err(DigitError::InvalidConfig(format!(
                "paste.min ({}) is greater than paste.slack ({})",
                self.paste.min, self.paste.slack
            )));
        }
        Ok(())
    }
}

/// Full recognition settings: normalization, tensor contract and reporting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct RecognizerConfig {
    pub normalize: NormalizeConfig,
    #[schemars(range(min = 1))]
    pub top_k: usize,
    #[schemars(range(min = 1))]
    pub tensor_size: u32,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            normalize: NormalizeConfig::default(),
            top_k: TOP_K,
            tensor_size: TENSOR_SIZE,
        }
    }
}

impl RecognizerConfig {
    pub fn validate(&self) -> Result<()> {
        self.normalize.validate()?;
        if self.top_k == 0 {
            return Err(DigitError::InvalidConfig("top_k must be at least 1".into()));
        }
        if self.tensor_size == 0 {
            return Err(DigitError::InvalidConfig("tensor_size must be positive".into()));
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: RecognizerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: RecognizerConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(DigitError::UnsupportedConfigFormat),
        }
    }
}
