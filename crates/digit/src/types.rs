use std::cmp::Ordering;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr, VariantNames};

use crate::error::{DigitError, Result};

/// The fixed label set: one symbol per decimal digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize, JsonSchema)]
#[derive(Display, EnumString, EnumIter, VariantNames, IntoStaticStr)]
pub enum Digit {
    #[serde(rename = "0")]
    #[strum(serialize = "0")]
    Zero,
    #[serde(rename = "1")]
    #[strum(serialize = "1")]
    One,
    #[serde(rename = "2")]
    #[strum(serialize = "2")]
    Two,
    #[serde(rename = "3")]
    #[strum(serialize = "3")]
    Three,
    #[serde(rename = "4")]
    #[strum(serialize = "4")]
    Four,
    #[serde(rename = "5")]
    #[strum(serialize = "5")]
    Five,
    #[serde(rename = "6")]
    #[strum(serialize = "6")]
    Six,
    #[serde(rename = "7")]
    #[strum(serialize = "7")]
    Seven,
    #[serde(rename = "8")]
    #[strum(serialize = "8")]
    Eight,
    #[serde(rename = "9")]
    #[strum(serialize = "9")]
    Nine,
}

impl Digit {
    pub const COUNT: usize = 10;

    /// Position of this label in the classifier's output vector.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::iter().nth(index)
    }
}

/// One labelled probability, as returned by top-k selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Score {
    pub label: Digit,
    pub probability: f64,
}

impl From<(Digit, f64)> for Score {
    fn from((label, probability): (Digit, f64)) -> Self {
        Self { label, probability }
    }
}

/// Probability per label for a single inference, in insertion order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Classification {
    entries: Vec<(Digit, f64)>,
}

impl Classification {
    /// Build from probabilities indexed by digit value.
    pub fn from_probabilities(probabilities: [f64; Digit::COUNT]) -> Self {
        Self {
            entries: Digit::iter().zip(probabilities).collect(),
        }
    }

    /// Build from explicit pairs, keeping their order. Every label must appear exactly once
    /// with a finite probability.
    pub fn from_pairs(entries: Vec<(Digit, f64)>) -> Result<Self> {
        let mut seen = [false; Digit::COUNT];
        for &(label, value) in &entries {
            if std::mem::replace(&mut seen[label.index()], true) {
                return Err(DigitError::DuplicateLabel(label));
            }
            if !value.is_finite() {
                return Err(DigitError::NonFiniteScore { label, value });
            }
        }
        if entries.len() != Digit::COUNT {
            return Err(DigitError::OutputShape {
                expected: Digit::COUNT,
                actual: entries.len(),
            });
        }
        Ok(Self { entries })
    }

    /// Softmax raw model outputs into a distribution over the ten digits.
    pub fn from_logits(logits: &[f32]) -> Result<Self> {
        if logits.len() != Digit::COUNT {
            return Err(DigitError::OutputShape {
                expected: Digit::COUNT,
                actual: logits.len(),
            });
        }
        if let Some((label, &value)) = Digit::iter().zip(logits).find(|(_, l)| !l.is_finite()) {
            return Err(DigitError::NonFiniteScore {
                label,
                value: value as f64,
            });
        }

        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
        let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
        let total: f64 = exps.iter().sum();

        let mut probabilities = [0.0; Digit::COUNT];
        for (slot, e) in probabilities.iter_mut().zip(&exps) {
            *slot = e / total;
        }
        Ok(Self::from_probabilities(probabilities))
    }

    pub fn entries(&self) -> &[(Digit, f64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn probability(&self, label: Digit) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|&(_, p)| p)
    }

    /// Highest-probability entry; the earliest one wins a tie.
    pub fn best(&self) -> Option<Score> {
        self.top_k(1).into_iter().next()
    }

    /// The `k` most probable labels, descending. Equal probabilities keep insertion order
    /// and NaN ranks last.
    pub fn top_k(&self, k: usize) -> Vec<Score> {
        let mut items = self.entries.clone();
        // sort_by is stable
        items.sort_by(|a, b| descending(a.1, b.1));
        items.into_iter().take(k).map(Score::from).collect()
    }
}

/// Total descending order over probabilities with NaN after every number.
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Classification {
        let mut probabilities = [0.0; Digit::COUNT];
        probabilities[0] = 0.7;
        probabilities[1] = 0.2;
        probabilities[2] = 0.1;
        Classification::from_probabilities(probabilities)
    }

    #[test]
    fn test_top_three() {
        let top = sample().top_k(3);
        let pairs: Vec<(String, f64)> = top
            .iter()
            .map(|s| (s.label.to_string(), s.probability))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("0".to_string(), 0.7),
                ("1".to_string(), 0.2),
                ("2".to_string(), 0.1)
            ]
        );
    }

    #[test]
    fn test_top_k_beyond_label_count_returns_all() {
        let top = sample().top_k(25);
        assert_eq!(top.len(), Digit::COUNT);
        assert!(top.windows(2).all(|w| w[0].probability >= w[1].probability));
    }

    #[test]
    fn test_top_k_zero_is_empty() {
        assert!(sample().top_k(0).is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let classification = Classification::from_pairs(vec![
            (Digit::Nine, 0.25),
            (Digit::Three, 0.25),
            (Digit::Zero, 0.25),
            (Digit::One, 0.25),
            (Digit::Two, 0.0),
            (Digit::Four, 0.0),
            (Digit::Five, 0.0),
            (Digit::Six, 0.0),
            (Digit::Seven, 0.0),
            (Digit::Eight, 0.0),
        ])
        .unwrap();

        let labels: Vec<Digit> = classification.top_k(4).iter().map(|s| s.label).collect();
        assert_eq!(labels, vec![Digit::Nine, Digit::Three, Digit::Zero, Digit::One]);
        assert_eq!(classification.best().unwrap().label, Digit::Nine);
    }

    #[test]
    fn test_from_pairs_rejects_duplicates_and_gaps() {
        assert!(matches!(
            Classification::from_pairs(vec![(Digit::One, 0.5), (Digit::One, 0.5)]),
            Err(DigitError::DuplicateLabel(Digit::One))
        ));
        assert!(matches!(
            Classification::from_pairs(vec![(Digit::One, 1.0)]),
            Err(DigitError::OutputShape { expected: 10, actual: 1 })
        ));
    }

    #[test]
    fn test_softmax_of_logits() {
        let mut logits = [0.0f32; Digit::COUNT];
        logits[7] = 5.0;
        let classification = Classification::from_logits(&logits).unwrap();

        let total: f64 = classification.entries().iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(classification.best().unwrap().label, Digit::Seven);

        let uniform = Classification::from_logits(&[1.0; Digit::COUNT]).unwrap();
        for (_, p) in uniform.entries() {
            assert!((p - 0.1).abs() < 1e-12);
        }
    }

    #[test]
    fn test_logit_count_must_match_labels() {
        assert!(matches!(
            Classification::from_logits(&[0.0; 3]),
            Err(DigitError::OutputShape { expected: 10, actual: 3 })
        ));
    }

    #[test]
    fn test_nan_probability_ranks_last() {
        let mut probabilities = [0.0; Digit::COUNT];
        probabilities[0] = 0.1;
        probabilities[1] = f64::NAN;
        probabilities[2] = 0.7;
        probabilities[3] = 0.2;
        let classification = Classification::from_probabilities(probabilities);

        let top = classification.top_k(4);
        let labels: Vec<Digit> = top.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec![Digit::Two, Digit::Three, Digit::Zero, Digit::Four]);
        assert_eq!(classification.best().unwrap().label, Digit::Two);

        let all = classification.top_k(Digit::COUNT);
        assert_eq!(all.last().unwrap().label, Digit::One);
        assert!(all[..Digit::COUNT - 1]
            .windows(2)
            .all(|w| w[0].probability >= w[1].probability));
    }

    #[test]
    fn test_non_finite_logits_rejected() {
        let mut logits = [0.0f32; Digit::COUNT];
        logits[0] = f32::INFINITY;
        logits[9] = 1.0;
        assert!(matches!(
            Classification::from_logits(&logits),
            Err(DigitError::NonFiniteScore { label: Digit::Zero, .. })
        ));

        logits[0] = 0.0;
        logits[4] = f32::NAN;
        assert!(matches!(
            Classification::from_logits(&logits),
            Err(DigitError::NonFiniteScore { label: Digit::Four, .. })
        ));
    }

    #[test]
    fn test_from_pairs_rejects_non_finite() {
        let mut pairs: Vec<(Digit, f64)> = Digit::iter().map(|d| (d, 0.1)).collect();
        pairs[5].1 = f64::NAN;
        assert!(matches!(
            Classification::from_pairs(pairs),
            Err(DigitError::NonFiniteScore { label: Digit::Five, .. })
        ));
    }

    #[test]
    fn test_digit_labels() {
        assert_eq!(Digit::Four.to_string(), "4");
        assert_eq!("8".parse::<Digit>().unwrap(), Digit::Eight);
        assert_eq!(Digit::from_index(6), Some(Digit::Six));
        assert_eq!(Digit::from_index(10), None);
        assert_eq!(serde_json::to_string(&Digit::Two).unwrap(), "\"2\"");
    }
}
