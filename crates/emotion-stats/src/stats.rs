//! Cumulative emotion counters and derived statistics

use serde::{Deserialize, Serialize};
use std::ops::Index;
use tracing::debug;

use crate::label::EmotionLabel;

/// One value per emotion label, stored in enumeration order
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelMap<T> {
    values: [T; EmotionLabel::COUNT],
}

impl<T: Copy> LabelMap<T> {
    /// Build a map by evaluating `f` for every label
    pub fn from_fn(f: impl FnMut(EmotionLabel) -> T) -> Self {
        Self {
            values: EmotionLabel::ALL.map(f),
        }
    }

    /// Value for a label
    pub fn get(&self, label: EmotionLabel) -> T {
        self.values[label.index()]
    }

    /// (label, value) pairs in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, T)> + '_ {
        EmotionLabel::ALL.iter().copied().zip(self.values.iter().copied())
    }

    /// Values in enumeration order
    pub fn values(&self) -> impl Iterator<Item = T> + '_ {
        self.values.iter().copied()
    }
}

impl<T> Index<EmotionLabel> for LabelMap<T> {
    type Output = T;

    fn index(&self, label: EmotionLabel) -> &T {
        &self.values[label.index()]
    }
}

/// Per-label frame counts for one session.
///
/// `total_frames` always equals the sum of the per-label counts: frames with
/// no detected face or an unrecognized label never reach the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionStats {
    counts: [u64; EmotionLabel::COUNT],
    total_frames: u64,
}

impl EmotionStats {
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a classifier label into the counters.
    ///
    /// Names outside the label set are dropped without error; the parsed
    /// label is returned when the counters changed.
    pub fn update(&mut self, label: &str) -> Option<EmotionLabel> {
        match label.parse::<EmotionLabel>() {
            Ok(label) => {
                self.record(label);
                Some(label)
            }
            Err(e) => {
                debug!("Dropping frame result: {}", e);
                None
            }
        }
    }

    /// Count one frame for `label`
    pub fn record(&mut self, label: EmotionLabel) {
        self.counts[label.index()] += 1;
        self.total_frames += 1;
    }

    /// Count for a single label
    pub fn count(&self, label: EmotionLabel) -> u64 {
        self.counts[label.index()]
    }

    /// Frames that were assigned a label
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// All counts keyed by label
    pub fn counts(&self) -> LabelMap<u64> {
        LabelMap { values: self.counts }
    }

    /// Label with the highest count.
    ///
    /// Ties go to the label that comes first in enumeration order, so an
    /// empty aggregator reports `EmotionLabel::Anger`.
    pub fn dominant(&self) -> EmotionLabel {
        let mut best = EmotionLabel::ALL[0];
        for label in EmotionLabel::ALL {
            if self.count(label) > self.count(best) {
                best = label;
            }
        }
        best
    }

    /// Share of each label in percent; all zeros when nothing was counted
    pub fn percentages(&self) -> LabelMap<f64> {
        if self.total_frames == 0 {
            return LabelMap::default();
        }
        let total = self.total_frames as f64;
        LabelMap::from_fn(|label| self.count(label) as f64 / total * 100.0)
    }

    /// Number of labels seen at least once
    pub fn observed_labels(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Average number of frames per observed label.
    ///
    /// Reported as "average change frequency" in the findings section; zero
    /// when no label has been observed.
    pub fn average_change_frequency(&self) -> f64 {
        match self.observed_labels() {
            0 => 0.0,
            observed => self.total_frames as f64 / observed as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stats_from(labels: &[&str]) -> EmotionStats {
        let mut stats = EmotionStats::new();
        for label in labels {
            stats.update(label);
        }
        stats
    }

    #[test]
    fn test_three_label_scenario() {
        let stats = stats_from(&["happiness", "sadness", "neutral"]);

        assert_eq!(stats.total_frames(), 3);
        assert_eq!(stats.dominant(), EmotionLabel::Happiness);
        let pct = stats.percentages();
        assert!((pct[EmotionLabel::Happiness] - 33.33).abs() < 0.01);
        assert_eq!(pct[EmotionLabel::Anger], 0.0);
    }

    #[test]
    fn test_unrecognized_labels_are_dropped() {
        let mut stats = EmotionStats::new();
        for _ in 0..100 {
            assert_eq!(stats.update("contempt"), None);
        }

        assert_eq!(stats.total_frames(), 0);
        assert_eq!(stats.dominant(), EmotionLabel::Anger);
        assert!(stats.percentages().values().all(|p| p == 0.0));
        assert_eq!(stats.average_change_frequency(), 0.0);
    }

    #[test]
    fn test_fresh_stats_are_all_zero() {
        let stats = EmotionStats::new();
        assert_eq!(stats.percentages(), LabelMap::default());
        assert_eq!(stats.dominant(), EmotionLabel::Anger);
    }

    #[test]
    fn test_dominant_tie_breaks_by_enumeration_order() {
        let stats = stats_from(&["neutral", "fear", "neutral", "fear"]);
        assert_eq!(stats.dominant(), EmotionLabel::Fear);
    }

    #[test]
    fn test_average_change_frequency() {
        let stats = stats_from(&["anger", "anger", "anger", "surprise"]);
        assert_eq!(stats.observed_labels(), 2);
        assert!((stats.average_change_frequency() - 2.0).abs() < f64::EPSILON);
    }

    fn any_label() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("anger".to_string()),
            Just("disgust".to_string()),
            Just("fear".to_string()),
            Just("happiness".to_string()),
            Just("sadness".to_string()),
            Just("surprise".to_string()),
            Just("neutral".to_string()),
            "[a-zA-Z]{0,10}",
        ]
    }

    proptest! {
        #[test]
        fn prop_counts_sum_to_total(labels in proptest::collection::vec(any_label(), 0..200)) {
            let mut stats = EmotionStats::new();
            for label in &labels {
                stats.update(label);
            }
            let sum: u64 = stats.counts().values().sum();
            prop_assert_eq!(sum, stats.total_frames());
        }

        #[test]
        fn prop_percentages_sum_to_zero_or_hundred(labels in proptest::collection::vec(any_label(), 0..200)) {
            let mut stats = EmotionStats::new();
            for label in &labels {
                stats.update(label);
            }
            let sum: f64 = stats.percentages().values().sum();
            if stats.total_frames() == 0 {
                prop_assert_eq!(sum, 0.0);
            } else {
                prop_assert!((sum - 100.0).abs() < 1e-9);
            }
        }

        #[test]
        fn prop_invalid_update_is_noop(labels in proptest::collection::vec(any_label(), 0..50), junk in "[0-9 ]{1,8}") {
            let mut stats = EmotionStats::new();
            for label in &labels {
                stats.update(label);
            }
            let before = stats.clone();
            prop_assert_eq!(stats.update(&junk), None);
            prop_assert_eq!(stats, before);
        }
    }
}
