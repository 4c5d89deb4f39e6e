//! Emotion Statistics
//!
//! Per-session aggregation of frame-level emotion classifications:
//! - Closed emotion label set
//! - Cumulative counts with percentages and dominant label
//! - Synthetic audio/text placeholder distributions
//! - Immutable snapshots for report rendering

mod label;
mod session;
mod stats;
mod synthetic;

pub use label::{EmotionLabel, UnknownLabel};
pub use session::{SessionStats, StatsSnapshot};
pub use stats::{EmotionStats, LabelMap};
pub use synthetic::{Modality, ModalityEstimate, Scale};
