//! # Handwritten Digit Normalization Library
//!
//! Shapes a free-hand drawn digit into the statistical form an MNIST-style
//! classifier was trained on, then prepares the classifier input tensor.
//!
//! ## Stages
//!
//! - **Ink bounds**: rectangle enclosing every pixel above the ink threshold
//! - **Resample**: crop with padding, scale the long side with nearest neighbor
//! - **Centroid compositing**: paste onto a 28x28 canvas centered by mass
//! - **Deskew**: horizontal shear from second-order image moments
//! - **Tensor**: `[1, 1, 28, 28]` values in `[-1, 1]`
//! - **Top-k**: most probable labels from the classifier output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use digit::Normalizer;
//!
//! let image = image::open("drawing.png")?.to_luma8();
//! let normalized = Normalizer::default().normalize(&image)?;
//! normalized.image.save("normalized.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Recognition
//!
//! ```rust,no_run
//! use digit::{Classification, FixedClassifier, RecognitionService, RecognizerConfig};
//!
//! let classifier = FixedClassifier::new(Classification::from_probabilities([0.1; 10]));
//! let service = RecognitionService::start(classifier, RecognizerConfig::default())?;
//! let recognition = service.recognize_bytes(&std::fs::read("drawing.png")?)?;
//! println!("{:?}", recognition.top_scores);
//! service.shutdown();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod config;
pub mod algorithms;
pub mod pipeline;
pub mod tensor;
pub mod classifier;
pub mod io;
pub mod service;

// Re-exports for convenience
pub use error::{ClassifierError, DigitError, Result};
pub use types::{Classification, Digit, Score};
pub use config::{NormalizeConfig, PasteBounds, RecognizerConfig};
pub use algorithms::{BoundingBox, Centroid, Moments, Placement};
pub use pipeline::{Normalized, NormalizeReport, Normalizer, builder::NormalizerBuilder};
pub use tensor::{InputTensor, prepare_gray, prepare_tensor};
pub use classifier::{
    Classifier, DigitMlp, Exclusive, FixedClassifier, MlpClassifier, SessionClassifier,
};
pub use service::{Recognition, RecognitionService, RecognizeRequest, RecognizeResponse};
