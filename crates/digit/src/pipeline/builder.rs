use crate::{
    config::{NormalizeConfig, PasteBounds},
    error::Result,
    pipeline::Normalizer,
};

/// Builder for creating normalizers with a fluent API
#[derive(Debug, Clone, Default)]
pub struct NormalizerBuilder {
    config: NormalizeConfig,
}

impl NormalizerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: NormalizeConfig) -> Self {
        Self { config }
    }

    /// Intensity a pixel must exceed to count as ink
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.config.threshold = threshold;
        self
    }

    pub fn padding(mut self, padding: u32) -> Self {
        self.config.padding = padding;
        self
    }

    pub fn target_long_side(mut self, long_side: u32) -> Self {
        self.config.target_long_side = long_side;
        self
    }

    pub fn canvas_size(mut self, size: u32) -> Self {
        self.config.canvas_size = size;
        self
    }

    pub fn background(mut self, background: u8) -> Self {
        self.config.background = background;
        self
    }

    /// Override the paste offset clamp range
    pub fn paste_bounds(mut self, min: i64, slack: i64) -> Self {
        self.config.paste = PasteBounds { min, slack };
        self
    }

    /// Validate the configuration and build the normalizer
    pub fn build(self) -> Result<Normalizer> {
        Normalizer::new(self.config)
    }
}
