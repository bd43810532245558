use std::sync::Arc;

use image::GrayImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    classifier::Classifier,
    config::RecognizerConfig,
    error::{DigitError, Result},
    io::{decode_data_url, decode_grayscale, to_png_data_url},
    pipeline::{Normalized, Normalizer},
    tensor::{InputTensor, prepare_gray},
    types::{Classification, Digit, Score},
};

/// Recognition request: an encoded drawing, optionally as a data URL.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeRequest {
    #[schemars(description = "Base64 image, with or without a data:image/...;base64, prefix")]
    pub image_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeResponse {
    #[schemars(description = "Most probable digit")]
    pub prediction: Digit,
    #[schemars(description = "Highest scoring digits, most probable first")]
    pub top_scores: Vec<Score>,
    #[schemars(description = "The normalized 28x28 input as a PNG data URL")]
    pub normalized_image_base64: String,
}

/// Everything produced for one drawing.
#[derive(Debug, Clone)]
pub struct Recognition {
    pub normalized: Normalized,
    pub tensor: InputTensor,
    pub classification: Classification,
    pub top_scores: Vec<Score>,
}

impl Recognition {
    pub fn prediction(&self) -> Result<Score> {
        self.classification.best().ok_or(DigitError::OutputShape {
            expected: Digit::COUNT,
            actual: 0,
        })
    }

    pub fn to_response(&self) -> Result<RecognizeResponse> {
        Ok(RecognizeResponse {
            prediction: self.prediction()?.label,
            top_scores: self.top_scores.clone(),
            normalized_image_base64: to_png_data_url(&self.normalized.image)?,
        })
    }
}

/// Long-lived recognition entry point owning the loaded classifier.
///
/// Start it once, clone the handle into every worker, and call [`shutdown`]
/// when the process is done with the model.
///
/// [`shutdown`]: RecognitionService::shutdown
pub struct RecognitionService<C> {
    classifier: Arc<C>,
    normalizer: Normalizer,
    config: RecognizerConfig,
}

impl<C> Clone for RecognitionService<C> {
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
            normalizer: self.normalizer.clone(),
            config: self.config,
        }
    }
}

impl<C: Classifier> RecognitionService<C> {
    pub fn start(classifier: C, config: RecognizerConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = Normalizer::new(config.normalize)?;
        info!(
            canvas = config.normalize.canvas_size,
            tensor = config.tensor_size,
            top_k = config.top_k,
            "recognition service started"
        );
        Ok(Self {
            classifier: Arc::new(classifier),
            normalizer,
            config,
        })
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    /// Normalize, classify and rank one grayscale drawing.
    pub fn recognize_raster(&self, image: &GrayImage) -> Result<Recognition> {
        let normalized = self.normalizer.normalize(image)?;
        let tensor = prepare_gray(&normalized.image, self.config.tensor_size)?;
        let classification = self
            .classifier
            .classify(&tensor)
            .map_err(DigitError::Classifier)?;
        let top_scores = classification.top_k(self.config.top_k);

        debug!(top = ?top_scores.first(), "classified drawing");
        Ok(Recognition {
            normalized,
            tensor,
            classification,
            top_scores,
        })
    }

    /// Decode an encoded image (PNG, JPEG, ...) and recognize it.
    pub fn recognize_bytes(&self, bytes: &[u8]) -> Result<Recognition> {
        if bytes.is_empty() {
            return Err(DigitError::EmptyPayload);
        }
        let image = decode_grayscale(bytes)?;
        self.recognize_raster(&image)
    }

    pub fn recognize_request(&self, request: &RecognizeRequest) -> Result<RecognizeResponse> {
        let bytes = decode_data_url(&request.image_base64)?;
        self.recognize_bytes(&bytes)?.to_response()
    }

    /// Release this handle. Returns the classifier once the last handle is gone.
    pub fn shutdown(self) -> Option<C> {
        match Arc::try_unwrap(self.classifier) {
            Ok(classifier) => {
                info!("recognition service stopped, classifier released");
                Some(classifier)
            }
            Err(_) => {
                debug!("recognition service handle dropped, classifier still shared");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::FixedClassifier;

    fn service() -> RecognitionService<FixedClassifier> {
        let mut probabilities = [0.0; Digit::COUNT];
        probabilities[4] = 0.6;
        probabilities[9] = 0.3;
        probabilities[7] = 0.1;
        let classifier = FixedClassifier::new(Classification::from_probabilities(probabilities));
        RecognitionService::start(classifier, RecognizerConfig::default()).unwrap()
    }

    #[test]
    fn test_request_json_uses_camel_case() {
        let request: RecognizeRequest =
            serde_json::from_str(r#"{"imageBase64": "data:image/png;base64,AAAA"}"#).unwrap();
        assert_eq!(request.image_base64, "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_start_rejects_bad_config() {
        let config = RecognizerConfig {
            top_k: 0,
            ..RecognizerConfig::default()
        };
        let classifier =
            FixedClassifier::new(Classification::from_probabilities([0.1; Digit::COUNT]));
        let result = RecognitionService::start(classifier, config);
        assert!(matches!(result, Err(DigitError::InvalidConfig(_))));
    }

    #[test]
    fn test_blank_raster_still_classified() {
        let recognition = service().recognize_raster(&GrayImage::new(64, 64)).unwrap();
        assert_eq!(recognition.tensor.shape(), &[1, 1, 28, 28]);
        assert!(recognition.tensor.values().unwrap().iter().all(|&v| v == -1.0));
        assert_eq!(recognition.prediction().unwrap().label, Digit::Four);
    }

    #[test]
    fn test_shutdown_returns_classifier_after_last_handle() {
        let first = service();
        let second = first.clone();

        assert!(first.shutdown().is_none());
        assert!(second.shutdown().is_some());
    }

    #[test]
    fn test_empty_bytes_rejected() {
        assert!(matches!(service().recognize_bytes(&[]), Err(DigitError::EmptyPayload)));
    }
}
