//! Emotion Report
//!
//! Renders a session snapshot into a timestamped PDF:
//! - Session metadata (start, duration, frames analyzed)
//! - Video distribution table plus marked synthetic audio/text estimates
//! - Key findings (dominant emotion, change frequency)
//! - Embedded bar chart of the video counts

pub mod chart;
pub mod document;
mod pdf;
pub mod renderer;

pub use chart::{render_bar_chart, ChartFile, ChartLayout};
pub use document::{ChartData, DistributionTable, ReportDocument, TableRow};
pub use renderer::ReportRenderer;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Report error types
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Font error: {0}")]
    Font(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Chart error: {0}")]
    Chart(#[from] image::ImageError),
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory receiving report PDFs (created on demand)
    pub output_dir: PathBuf,

    /// TrueType font for all text; builtin Helvetica when unset
    pub font_path: Option<PathBuf>,

    /// Chart image size in pixels
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("reports"),
            font_path: None,
            chart_width: 1000,
            chart_height: 600,
        }
    }
}
