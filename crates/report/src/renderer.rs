//! Report rendering entry point

use emotion_stats::StatsSnapshot;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::chart::render_bar_chart;
use crate::document::ReportDocument;
use crate::pdf::write_pdf;
use crate::{ReportConfig, ReportError};

/// Collision suffixes tried for reports stamped within the same second
const MAX_NAME_SUFFIX: u32 = 1000;

/// Renders snapshots into PDF files under the configured directory
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    config: ReportConfig,
}

impl ReportRenderer {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Render `snapshot` and return the path of the new PDF.
    ///
    /// The file is named after `snapshot.taken_at`; a numeric suffix is
    /// appended when that name is already taken. Nothing is left on disk
    /// when rendering fails.
    pub fn render(&self, snapshot: &StatsSnapshot) -> Result<PathBuf, ReportError> {
        let dir = &self.config.output_dir;
        fs::create_dir_all(dir)?;

        let stem = format!("emotion_report_{}", snapshot.taken_at.format("%Y%m%d_%H%M%S"));
        let (path, file) = reserve_file(dir, &stem)?;

        match self.write(snapshot, dir, file) {
            Ok(pages) => {
                info!(
                    "Report generated: {} ({} frames, {} pages)",
                    path.display(),
                    snapshot.stats.total_frames(),
                    pages
                );
                Ok(path)
            }
            Err(e) => {
                error!("Report rendering failed: {}", e);
                if let Err(rm) = fs::remove_file(&path) {
                    warn!("Failed to remove partial report {}: {}", path.display(), rm);
                }
                Err(e)
            }
        }
    }

    /// Write the PDF into `file`. The chart side file lives only for the
    /// duration of this call.
    fn write(&self, snapshot: &StatsSnapshot, dir: &Path, file: File) -> Result<usize, ReportError> {
        let document = ReportDocument::from_snapshot(snapshot);
        let chart = render_bar_chart(
            &document.chart,
            dir,
            self.config.chart_width,
            self.config.chart_height,
        )?;
        write_pdf(&document, &chart, self.config.font_path.as_deref(), file)
    }
}

/// Create `<stem>.pdf`, or `<stem>_<n>.pdf` when taken
fn reserve_file(dir: &Path, stem: &str) -> Result<(PathBuf, File), ReportError> {
    for n in 0..MAX_NAME_SUFFIX {
        let name = if n == 0 {
            format!("{}.pdf", stem)
        } else {
            format!("{}_{}.pdf", stem, n)
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(ReportError::Io(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free report name for {}", stem),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use emotion_stats::{EmotionLabel, SessionStats};

    fn renderer(dir: &Path) -> ReportRenderer {
        ReportRenderer::new(ReportConfig {
            output_dir: dir.to_path_buf(),
            chart_width: 300,
            chart_height: 200,
            ..Default::default()
        })
    }

    fn snapshot(labels: &[&str]) -> StatsSnapshot {
        let start = Local.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap();
        let mut session = SessionStats::starting_at(start);
        for label in labels {
            session.update(label);
        }
        session.snapshot_at(Local.with_ymd_and_hms(2026, 5, 4, 12, 10, 30).unwrap())
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_zero_frame_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = renderer(dir.path()).render(&snapshot(&[])).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "emotion_report_20260504_121030.pdf"
        );
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(String::from_utf8_lossy(&bytes).trim_end().ends_with("%%EOF"));
        assert_eq!(files_in(dir.path()), vec!["emotion_report_20260504_121030.pdf"]);
    }

    #[test]
    fn test_same_second_reports_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = renderer(dir.path());
        let snap = snapshot(&["happiness", "anger", "happiness"]);

        let first = renderer.render(&snap).unwrap();
        let second = renderer.render(&snap).unwrap();
        assert_ne!(first, second);
        assert_eq!(
            second.file_name().unwrap().to_string_lossy(),
            "emotion_report_20260504_121030_1.pdf"
        );
        assert_eq!(files_in(dir.path()).len(), 2);
    }

    #[test]
    fn test_video_table_reads_back_from_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let snap = snapshot(&["happiness", "happiness", "fear", "neutral"]);
        let path = renderer(dir.path()).render(&snap).unwrap();

        let pdf = lopdf::Document::load(&path).unwrap();
        let pages: Vec<u32> = pdf.get_pages().keys().copied().collect();
        let text = pdf.extract_text(&pages).unwrap();
        let tokens: Vec<&str> = text.split_whitespace().collect();

        let title = tokens
            .windows(3)
            .position(|w| w == ["Video", "emotion", "distribution"])
            .expect("video table title");
        assert_eq!(tokens[title + 3..title + 7], ["Emotion", "Count", "Share", "(%)"]);
        let body = &tokens[title + 7..];

        let percentages = snap.stats.percentages();
        for (i, label) in EmotionLabel::ALL.iter().enumerate() {
            let row = &body[i * 3..i * 3 + 3];
            assert_eq!(row[0], label.as_str());
            assert_eq!(row[1], snap.stats.count(*label).to_string());
            assert_eq!(row[2], format!("{:.2}%", percentages.get(*label)));
        }
    }

    #[test]
    fn test_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("reports");
        let path = renderer(&nested).render(&snapshot(&["fear"])).unwrap();
        assert!(path.starts_with(&nested));
        assert!(path.exists());
    }

    #[test]
    fn test_missing_font_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ReportRenderer::new(ReportConfig {
            output_dir: dir.path().to_path_buf(),
            font_path: Some(dir.path().join("missing.ttf")),
            chart_width: 300,
            chart_height: 200,
        });

        let err = renderer.render(&snapshot(&["sadness"])).unwrap_err();
        assert!(matches!(err, ReportError::Font(_)));
        assert!(files_in(dir.path()).is_empty());
    }
}
