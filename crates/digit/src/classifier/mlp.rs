use std::path::Path;

use burn::{
    module::Module,
    nn::{Linear, LinearConfig},
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
    tensor::{Tensor, activation::relu, backend::Backend},
};
use tracing::info;

use super::SessionClassifier;
use crate::{
    config::TENSOR_SIZE,
    error::{ClassifierError, DigitError, Result},
    tensor::InputTensor,
    types::{Classification, Digit},
};

/// Flattened 28x28 input
pub const INPUT_FEATURES: usize = (TENSOR_SIZE * TENSOR_SIZE) as usize;
pub const DEFAULT_HIDDEN_SIZE: usize = 128;

/// Two-layer perceptron over the flattened digit canvas.
#[derive(Module, Debug)]
pub struct DigitMlp<B: Backend> {
    hidden: Linear<B>,
    output: Linear<B>,
}

impl<B: Backend> DigitMlp<B> {
    pub fn new(hidden_size: usize, device: &B::Device) -> Self {
        Self {
            hidden: LinearConfig::new(INPUT_FEATURES, hidden_size).init(device),
            output: LinearConfig::new(hidden_size, Digit::COUNT).init(device),
        }
    }

    /// `[batch, 1, 28, 28]` -> logits `[batch, 10]`
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let x: Tensor<B, 2> = input.flatten(1, 3);
        let x = relu(self.hidden.forward(x));
        self.output.forward(x)
    }
}

/// Burn-backed classifier with weights from a named MessagePack record.
pub struct MlpClassifier<B: Backend> {
    model: DigitMlp<B>,
    device: B::Device,
}

impl<B: Backend> MlpClassifier<B> {
    pub fn new(model: DigitMlp<B>, device: B::Device) -> Self {
        Self { model, device }
    }

    /// Load weights saved with `NamedMpkFileRecorder<FullPrecisionSettings>`.
    pub fn load<P: AsRef<Path>>(path: P, hidden_size: usize, device: B::Device) -> Result<Self> {
        let path = path.as_ref();
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let model = DigitMlp::new(hidden_size, &device)
            .load_file(path.to_path_buf(), &recorder, &device)
            .map_err(|e| DigitError::ModelLoad(format!("{}: {e:?}", path.display())))?;

        info!(path = %path.display(), hidden_size, "loaded digit classifier weights");
        Ok(Self::new(model, device))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        self.model
            .clone()
            .save_file(path.as_ref().to_path_buf(), &recorder)
            .map_err(|e| DigitError::ModelLoad(format!("{e:?}")))
    }

    fn predict(&self, input: &InputTensor) -> Result<Classification> {
        let side = TENSOR_SIZE as usize;
        if input.shape() != [1, 1, side, side] {
            return Err(DigitError::Tensor(format!(
                "expected input shape [1, 1, {side}, {side}], got {:?}",
                input.shape()
            )));
        }

        let logits = self.model.forward(input.to_tensor::<B>(&self.device));
        let values = logits
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| DigitError::Tensor(format!("{e:?}")))?;
        Classification::from_logits(&values)
    }
}

impl<B: Backend> SessionClassifier for MlpClassifier<B> {
    fn classify(
        &mut self,
        input: &InputTensor,
    ) -> std::result::Result<Classification, ClassifierError> {
        self.predict(input).map_err(|e| Box::new(e) as ClassifierError)
    }
}
