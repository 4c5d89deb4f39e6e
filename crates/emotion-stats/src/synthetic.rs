//! Synthetic cross-modal estimates
//!
//! Audio and text distributions are not measured. They are placeholders
//! derived from the video counts with fixed per-label factors, and every
//! estimate carries `synthetic = true` so downstream output can label them.

use serde::{Deserialize, Serialize};

use crate::label::EmotionLabel;
use crate::stats::{EmotionStats, LabelMap};

/// Placeholder modality derived from video counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Audio,
    Text,
}

impl Modality {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Audio => "audio",
            Modality::Text => "text",
        }
    }

    /// Per-label scaling applied to the video count
    pub fn factor(&self, label: EmotionLabel) -> Scale {
        use EmotionLabel::*;
        match (self, label) {
            (Modality::Audio, Anger) => Scale::Div(2.0),
            (Modality::Audio, Disgust) => Scale::Div(2.0),
            (Modality::Audio, Fear) => Scale::Div(2.0),
            (Modality::Audio, Happiness) => Scale::Mul(1.2),
            (Modality::Audio, Sadness) => Scale::Div(3.0),
            (Modality::Audio, Surprise) => Scale::Mul(1.5),
            (Modality::Audio, Neutral) => Scale::Div(1.5),

            (Modality::Text, Anger) => Scale::Mul(1.5),
            (Modality::Text, Disgust) => Scale::Mul(1.2),
            (Modality::Text, Fear) => Scale::Div(2.0),
            (Modality::Text, Happiness) => Scale::Div(1.5),
            (Modality::Text, Sadness) => Scale::Mul(1.2),
            (Modality::Text, Surprise) => Scale::Div(2.0),
            (Modality::Text, Neutral) => Scale::Mul(1.2),
        }
    }
}

/// Fixed scaling factor, always applied with floating-point arithmetic
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    Mul(f64),
    Div(f64),
}

impl Scale {
    /// Apply the factor to a count
    pub fn apply(&self, count: u64) -> f64 {
        match *self {
            Scale::Mul(f) => count as f64 * f,
            Scale::Div(d) => count as f64 / d,
        }
    }
}

/// Estimated distribution for a placeholder modality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalityEstimate {
    /// Which modality this stands in for
    pub modality: Modality,
    /// Always true: the values are derived, not measured
    pub synthetic: bool,
    /// Estimated per-label values
    pub values: LabelMap<f64>,
}

impl ModalityEstimate {
    /// Derive an estimate from the video counts
    pub fn derive(modality: Modality, stats: &EmotionStats) -> Self {
        Self {
            modality,
            synthetic: true,
            values: LabelMap::from_fn(|label| modality.factor(label).apply(stats.count(label))),
        }
    }

    /// Sum of all estimated values
    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }

    /// Share of each label in percent; all zeros when the total is zero
    pub fn percentages(&self) -> LabelMap<f64> {
        let total = self.total();
        if total <= 0.0 {
            return LabelMap::default();
        }
        LabelMap::from_fn(|label| self.values[label] / total * 100.0)
    }
}

impl EmotionStats {
    /// Placeholder audio distribution
    pub fn synthetic_audio(&self) -> ModalityEstimate {
        ModalityEstimate::derive(Modality::Audio, self)
    }

    /// Placeholder text distribution
    pub fn synthetic_text(&self) -> ModalityEstimate {
        ModalityEstimate::derive(Modality::Text, self)
    }
}
