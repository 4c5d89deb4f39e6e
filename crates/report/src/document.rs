//! Report content model
//!
//! Everything the PDF shows is computed here from one snapshot, so the
//! layout code only places strings and the chart.

use chrono::Duration;
use emotion_stats::{EmotionLabel, LabelMap, ModalityEstimate, StatsSnapshot};

/// Document title
pub const TITLE: &str = "Emotion Recognition Report";

/// Column headers shared by all distribution tables
pub const TABLE_HEADER: [&str; 3] = ["Emotion", "Count", "Share (%)"];

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of a distribution table
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub label: EmotionLabel,
    pub count: String,
    pub percentage: String,
}

/// Per-label distribution table
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionTable {
    pub title: String,
    /// Set for tables whose numbers are estimates rather than measurements
    pub synthetic: bool,
    /// Footnote printed under the table
    pub note: Option<String>,
    pub rows: Vec<TableRow>,
}

impl DistributionTable {
    fn measured(title: &str, counts: LabelMap<u64>, percentages: LabelMap<f64>) -> Self {
        Self {
            title: title.to_string(),
            synthetic: false,
            note: None,
            rows: counts
                .iter()
                .map(|(label, count)| TableRow {
                    label,
                    count: count.to_string(),
                    percentage: format_percentage(percentages[label]),
                })
                .collect(),
        }
    }

    fn estimated(estimate: &ModalityEstimate) -> Self {
        let percentages = estimate.percentages();
        let modality = estimate.modality.as_str();
        Self {
            title: format!(
                "{}{} emotion distribution (synthetic estimate)",
                modality[..1].to_uppercase(),
                &modality[1..]
            ),
            synthetic: estimate.synthetic,
            note: Some(format!(
                "Derived from video counts with fixed factors; no {} data was measured.",
                modality
            )),
            rows: estimate
                .values
                .iter()
                .map(|(label, value)| TableRow {
                    label,
                    count: format!("{:.2}", value),
                    percentage: format_percentage(percentages[label]),
                })
                .collect(),
        }
    }

    /// Re-read the count column.
    ///
    /// Returns `None` when a cell does not hold a number.
    pub fn parsed_counts(&self) -> Option<Vec<(EmotionLabel, f64)>> {
        self.rows
            .iter()
            .map(|row| row.count.parse::<f64>().ok().map(|count| (row.label, count)))
            .collect()
    }
}

/// Bar chart content
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<(EmotionLabel, u64)>,
}

impl ChartData {
    /// Largest bar value
    pub fn max_value(&self) -> u64 {
        self.bars.iter().map(|&(_, v)| v).max().unwrap_or(0)
    }
}

/// Complete report content built from one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub metadata: Vec<String>,
    pub tables: Vec<DistributionTable>,
    pub findings_title: String,
    pub findings: Vec<String>,
    pub chart: ChartData,
}

impl ReportDocument {
    pub fn from_snapshot(snapshot: &StatsSnapshot) -> Self {
        let stats = &snapshot.stats;

        let metadata = vec![
            format!("Report generated: {}", snapshot.taken_at.format(TIME_FORMAT)),
            format!("Session started: {}", snapshot.start_time.format(TIME_FORMAT)),
            format!("Session duration: {}", format_duration(snapshot.elapsed())),
            format!("Frames analyzed: {}", stats.total_frames()),
        ];

        let tables = vec![
            DistributionTable::measured(
                "Video emotion distribution",
                stats.counts(),
                stats.percentages(),
            ),
            DistributionTable::estimated(&stats.synthetic_audio()),
            DistributionTable::estimated(&stats.synthetic_text()),
        ];

        let findings = vec![
            format!("- Dominant emotion: {}", stats.dominant()),
            format!(
                "- Emotion change frequency: one change every {:.2} frames",
                stats.average_change_frequency()
            ),
        ];

        Self {
            title: TITLE.to_string(),
            metadata,
            tables,
            findings_title: "Key findings".to_string(),
            findings,
            chart: ChartData {
                title: "Emotion distribution".to_string(),
                x_label: "Emotion".to_string(),
                y_label: "Occurrences".to_string(),
                bars: stats.counts().iter().collect(),
            },
        }
    }

    /// The measured video table
    pub fn video_table(&self) -> &DistributionTable {
        &self.tables[0]
    }
}

fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

/// `H:MM:SS`, hours unbounded
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.num_seconds().max(0);
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use emotion_stats::SessionStats;

    fn snapshot(labels: &[&str]) -> StatsSnapshot {
        let start = Local.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let mut session = SessionStats::starting_at(start);
        for label in labels {
            session.update(label);
        }
        session.snapshot_at(start + Duration::seconds(3725))
    }

    #[test]
    fn test_video_counts_round_trip() {
        let snap = snapshot(&["happiness", "happiness", "fear", "neutral", "contempt"]);
        let document = ReportDocument::from_snapshot(&snap);

        let parsed = document.video_table().parsed_counts().unwrap();
        let expected: Vec<(EmotionLabel, f64)> = snap
            .stats
            .counts()
            .iter()
            .map(|(label, count)| (label, count as f64))
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_metadata_lines() {
        let document = ReportDocument::from_snapshot(&snapshot(&["anger"]));
        assert_eq!(document.metadata.len(), 4);
        assert_eq!(document.metadata[1], "Session started: 2026-03-01 09:30:00");
        assert_eq!(document.metadata[2], "Session duration: 1:02:05");
        assert_eq!(document.metadata[3], "Frames analyzed: 1");
    }

    #[test]
    fn test_tables_follow_label_order() {
        let document = ReportDocument::from_snapshot(&snapshot(&["sadness"]));
        assert_eq!(document.tables.len(), 3);
        for table in &document.tables {
            let labels: Vec<EmotionLabel> = table.rows.iter().map(|r| r.label).collect();
            assert_eq!(labels, EmotionLabel::ALL.to_vec());
        }
        assert_eq!(document.video_table().rows[4].percentage, "100.00%");
    }

    #[test]
    fn test_synthetic_tables_are_marked() {
        let document = ReportDocument::from_snapshot(&snapshot(&["surprise", "anger"]));
        assert!(!document.tables[0].synthetic);
        for table in &document.tables[1..] {
            assert!(table.synthetic);
            assert!(table.title.contains("synthetic estimate"));
            assert!(table.note.is_some());
        }
        assert!(document.tables[1].title.starts_with("Audio"));
        assert!(document.tables[2].title.starts_with("Text"));
    }

    #[test]
    fn test_empty_snapshot_findings() {
        let document = ReportDocument::from_snapshot(&snapshot(&[]));
        assert_eq!(document.findings[0], "- Dominant emotion: anger");
        assert_eq!(
            document.findings[1],
            "- Emotion change frequency: one change every 0.00 frames"
        );
        for table in &document.tables {
            assert!(table.rows.iter().all(|r| r.percentage == "0.00%"));
        }
        assert_eq!(document.chart.max_value(), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(0)), "0:00:00");
        assert_eq!(format_duration(Duration::seconds(59)), "0:00:59");
        assert_eq!(format_duration(Duration::seconds(36_061)), "10:01:01");
        assert_eq!(format_duration(Duration::seconds(-4)), "0:00:00");
    }
}
