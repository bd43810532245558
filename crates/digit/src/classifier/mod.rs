pub mod mlp;

use std::sync::{Arc, Mutex};

use crate::{
    error::{ClassifierError, DigitError},
    tensor::InputTensor,
    types::Classification,
};

pub use mlp::{DigitMlp, MlpClassifier};

/// Maps a prepared input tensor to a probability per digit.
///
/// Implementations are shared across concurrent recognitions, so `classify`
/// must be safe to call from several threads at once.
pub trait Classifier: Send + Sync {
    fn classify(&self, input: &InputTensor) -> Result<Classification, ClassifierError>;
}

impl<C: Classifier + ?Sized> Classifier for Arc<C> {
    fn classify(&self, input: &InputTensor) -> Result<Classification, ClassifierError> {
        (**self).classify(input)
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn classify(&self, input: &InputTensor) -> Result<Classification, ClassifierError> {
        (**self).classify(input)
    }
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn classify(&self, input: &InputTensor) -> Result<Classification, ClassifierError> {
        (**self).classify(input)
    }
}

/// A classifier that needs exclusive access while it predicts.
pub trait SessionClassifier: Send {
    fn classify(&mut self, input: &InputTensor) -> Result<Classification, ClassifierError>;
}

/// Serializes access to a [`SessionClassifier`] so it can be shared.
///
/// Each call acquires the session, predicts and releases it again when the
/// guard drops, including when prediction fails.
pub struct Exclusive<C> {
    session: Mutex<C>,
}

impl<C: SessionClassifier> Exclusive<C> {
    pub fn new(session: C) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    /// Take the session back. Fails if a prediction panicked while holding it.
    pub fn into_inner(self) -> crate::error::Result<C> {
        self.session.into_inner().map_err(|_| poisoned())
    }
}

fn poisoned() -> DigitError {
    DigitError::ClassifierUnavailable(
        "a previous prediction panicked while holding the session".into(),
    )
}

impl<C: SessionClassifier> Classifier for Exclusive<C> {
    fn classify(&self, input: &InputTensor) -> Result<Classification, ClassifierError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| Box::new(poisoned()) as ClassifierError)?;
        session.classify(input)
    }
}

/// Always answers with the same distribution.
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    classification: Classification,
}

impl FixedClassifier {
    pub fn new(classification: Classification) -> Self {
        Self { classification }
    }
}

impl Classifier for FixedClassifier {
    fn classify(&self, _input: &InputTensor) -> Result<Classification, ClassifierError> {
        Ok(self.classification.clone())
    }
}
