//! Bar chart side file
//!
//! The chart is drawn into a PNG next to the report, embedded, and removed
//! again when its `ChartFile` guard is dropped.

use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::document::ChartData;
use crate::ReportError;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([220, 220, 220]);
const BAR: Rgb<u8> = Rgb([135, 206, 235]);
const BAR_EDGE: Rgb<u8> = Rgb([70, 130, 180]);

/// Horizontal gridlines drawn above the x axis
const GRID_LINES: u32 = 5;

/// Plot area geometry inside the chart image.
///
/// Positions are also exposed as fractions of the image size so the PDF
/// can place axis labels over the embedded image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub width: u32,
    pub height: u32,
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
    pub bars: usize,
}

impl ChartLayout {
    pub fn new(width: u32, height: u32, bars: usize) -> Self {
        Self {
            width,
            height,
            left: width / 16,
            right: width - width / 40,
            top: height / 20,
            bottom: height - height / 12,
            bars,
        }
    }

    fn plot_width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    fn plot_height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    fn slot_width(&self) -> f32 {
        self.plot_width() as f32 / self.bars.max(1) as f32
    }

    /// Horizontal center of bar `index` as a fraction of the image width
    pub fn bar_center_fraction(&self, index: usize) -> f32 {
        (self.left as f32 + self.slot_width() * (index as f32 + 0.5)) / self.width as f32
    }

    /// Bottom of the plot area as a fraction of the image height, from the top
    pub fn baseline_fraction(&self) -> f32 {
        self.bottom as f32 / self.height as f32
    }

    /// Top of the plot area as a fraction of the image height, from the top
    pub fn top_fraction(&self) -> f32 {
        self.top as f32 / self.height as f32
    }
}

/// Chart PNG on disk, deleted on drop
#[derive(Debug)]
pub struct ChartFile {
    path: PathBuf,
    layout: ChartLayout,
}

impl ChartFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &ChartLayout {
        &self.layout
    }
}

impl Drop for ChartFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed chart file {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove chart file {}: {}", self.path.display(), e),
        }
    }
}

/// Draw the bar chart into a uniquely named PNG inside `dir`
pub fn render_bar_chart(
    chart: &ChartData,
    dir: &Path,
    width: u32,
    height: u32,
) -> Result<ChartFile, ReportError> {
    let layout = ChartLayout::new(width, height, chart.bars.len());
    let image = draw_bars(chart, &layout);

    // Guard first so a failed write does not leave a partial file behind.
    let file = ChartFile {
        path: dir.join(format!("emotion_distribution_{}.png", Uuid::new_v4().simple())),
        layout,
    };
    image.save_with_format(&file.path, ImageFormat::Png)?;
    debug!("Chart written to {}", file.path.display());
    Ok(file)
}

fn draw_bars(chart: &ChartData, layout: &ChartLayout) -> RgbImage {
    let mut image = RgbImage::from_pixel(layout.width, layout.height, BACKGROUND);
    let left = layout.left as f32;
    let right = layout.right as f32;
    let top = layout.top as f32;
    let bottom = layout.bottom as f32;

    for i in 1..=GRID_LINES {
        let y = bottom - layout.plot_height() as f32 * i as f32 / GRID_LINES as f32;
        draw_line_segment_mut(&mut image, (left, y), (right, y), GRID);
    }

    let max = chart.max_value();
    if max > 0 {
        let slot = layout.slot_width();
        let bar_width = ((slot * 0.6) as u32).max(1);
        for (i, &(_, value)) in chart.bars.iter().enumerate() {
            let bar_height = (layout.plot_height() as f64 * value as f64 / max as f64) as u32;
            if bar_height == 0 {
                continue;
            }
            let center = left + slot * (i as f32 + 0.5);
            let x = (center - bar_width as f32 / 2.0) as i32;
            let y = layout.bottom as i32 - bar_height as i32;
            let rect = Rect::at(x, y).of_size(bar_width, bar_height);
            draw_filled_rect_mut(&mut image, rect, BAR);
            draw_hollow_rect_mut(&mut image, rect, BAR_EDGE);
        }
    }

    draw_line_segment_mut(&mut image, (left, top), (left, bottom), AXIS);
    draw_line_segment_mut(&mut image, (left, bottom), (right, bottom), AXIS);
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use emotion_stats::EmotionLabel;

    fn chart(values: [u64; 7]) -> ChartData {
        ChartData {
            title: "Emotion distribution".into(),
            x_label: "Emotion".into(),
            y_label: "Occurrences".into(),
            bars: EmotionLabel::ALL.iter().copied().zip(values).collect(),
        }
    }

    #[test]
    fn test_chart_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let file = render_bar_chart(&chart([1, 0, 3, 9, 0, 2, 4]), dir.path(), 400, 240).unwrap();
        let path = file.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(image::open(&path).unwrap().width(), 400);

        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn test_tallest_bar_reaches_top() {
        let layout = ChartLayout::new(400, 240, 7);
        let image = draw_bars(&chart([0, 0, 0, 5, 0, 0, 0]), &layout);
        let x = (layout.bar_center_fraction(3) * 400.0) as u32;
        assert_eq!(*image.get_pixel(x, layout.top + 2), BAR);

        let empty = (layout.bar_center_fraction(0) * 400.0) as u32;
        assert_ne!(*image.get_pixel(empty, layout.bottom - 2), BAR);
    }

    #[test]
    fn test_empty_chart_draws_axes_only() {
        let layout = ChartLayout::new(200, 120, 7);
        let image = draw_bars(&chart([0; 7]), &layout);
        assert!(image.pixels().all(|p| *p != BAR));
    }

    #[test]
    fn test_layout_fractions() {
        let layout = ChartLayout::new(1000, 600, 7);
        assert!(layout.bar_center_fraction(0) > 0.0);
        assert!(layout.bar_center_fraction(6) < 1.0);
        assert!(layout.top_fraction() < layout.baseline_fraction());
    }
}
