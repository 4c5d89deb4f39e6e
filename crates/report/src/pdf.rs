//! PDF layout
//!
//! US Letter pages with 1 inch margins. Content flows top to bottom and a new
//! page is started whenever the next block does not fit.

use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Rect, Rgb,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

use crate::chart::ChartFile;
use crate::document::{DistributionTable, ReportDocument, TABLE_HEADER};
use crate::ReportError;

const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
const MARGIN: f32 = 25.4;

const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica glyph width in ems, used to center text
const AVG_GLYPH_EM: f32 = 0.5;

const TITLE_SIZE: f32 = 24.0;
const HEADING_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 12.0;
const TABLE_HEADER_SIZE: f32 = 12.0;
const TABLE_BODY_SIZE: f32 = 11.0;
const NOTE_SIZE: f32 = 9.0;

const COLUMN_WIDTHS: [f32; 3] = [50.8, 38.1, 38.1];
const ROW_HEIGHT: f32 = 8.0;

const CHART_WIDTH: f32 = 152.4;
const CHART_HEIGHT: f32 = 101.6;
/// Image DPI assumed when scaling the embedded chart
const CHART_DPI: f32 = 300.0;

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_EM * PT_TO_MM
}

fn pdf_error(e: impl std::fmt::Display) -> ReportError {
    ReportError::Pdf(e.to_string())
}

/// Fonts used by the layout
struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference, font_path: Option<&Path>) -> Result<Self, ReportError> {
        match font_path {
            Some(path) => {
                let file = File::open(path)
                    .map_err(|e| ReportError::Font(format!("{}: {}", path.display(), e)))?;
                let font = doc
                    .add_external_font(BufReader::new(file))
                    .map_err(|e| ReportError::Font(format!("{}: {}", path.display(), e)))?;
                Ok(Self {
                    regular: font.clone(),
                    bold: font,
                })
            }
            None => Ok(Self {
                regular: doc
                    .add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(|e| ReportError::Font(e.to_string()))?,
                bold: doc
                    .add_builtin_font(BuiltinFont::HelveticaBold)
                    .map_err(|e| ReportError::Font(e.to_string()))?,
            }),
        }
    }
}

/// Write position on the current page
struct PageCursor {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: Fonts,
    /// Distance from the bottom edge, in mm
    y: f32,
    pages: usize,
}

impl PageCursor {
    fn new(title: &str, font_path: Option<&Path>) -> Result<Self, ReportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Page 1");
        let fonts = Fonts::load(&doc, font_path)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            fonts,
            y: PAGE_HEIGHT - MARGIN,
            pages: 1,
        })
    }

    fn new_page(&mut self) {
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            format!("Page {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
        debug!("Started report page {}", self.pages);
    }

    /// Start a new page unless `height` mm still fit above the bottom margin
    fn reserve(&mut self, height: f32) {
        if self.y - height < MARGIN && self.y < PAGE_HEIGHT - MARGIN {
            self.new_page();
        }
    }

    fn space(&mut self, height: f32) {
        self.y -= height;
    }

    fn line_of_text(&mut self, text: &str, size: f32, bold: bool, centered: bool) {
        let height = size * PT_TO_MM * 1.4;
        self.reserve(height);
        self.y -= height;
        let x = if centered {
            ((PAGE_WIDTH - text_width(text, size)) / 2.0).max(MARGIN)
        } else {
            MARGIN
        };
        let font = if bold { &self.fonts.bold } else { &self.fonts.regular };
        self.layer.set_fill_color(rgb(0.0, 0.0, 0.0));
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn table(&mut self, table: &DistributionTable) {
        let rows = table.rows.len() as f32 + 1.0;
        let note_height = if table.note.is_some() { 6.0 } else { 0.0 };
        self.reserve(HEADING_SIZE * PT_TO_MM * 1.4 + rows * ROW_HEIGHT + note_height);

        self.line_of_text(&table.title, HEADING_SIZE, true, false);
        self.space(2.0);

        let total_width: f32 = COLUMN_WIDTHS.iter().sum();
        let left = (PAGE_WIDTH - total_width) / 2.0;
        let top = self.y;
        let bottom = top - rows * ROW_HEIGHT;

        // Header background, then body background
        self.layer.set_fill_color(rgb(0.5, 0.5, 0.5));
        self.layer.add_rect(
            Rect::new(Mm(left), Mm(top - ROW_HEIGHT), Mm(left + total_width), Mm(top))
                .with_mode(PaintMode::Fill),
        );
        self.layer.set_fill_color(rgb(0.96, 0.96, 0.86));
        self.layer.add_rect(
            Rect::new(Mm(left), Mm(bottom), Mm(left + total_width), Mm(top - ROW_HEIGHT))
                .with_mode(PaintMode::Fill),
        );

        self.layer.set_fill_color(rgb(0.96, 0.96, 0.96));
        self.table_row(&TABLE_HEADER, left, top - ROW_HEIGHT, TABLE_HEADER_SIZE, true);
        self.layer.set_fill_color(rgb(0.0, 0.0, 0.0));
        for (i, row) in table.rows.iter().enumerate() {
            let baseline = top - ROW_HEIGHT * (i as f32 + 2.0);
            let cells = [row.label.as_str(), row.count.as_str(), row.percentage.as_str()];
            self.table_row(&cells, left, baseline, TABLE_BODY_SIZE, false);
        }

        self.grid(left, top, total_width, rows as usize);
        self.y = bottom;

        if let Some(note) = &table.note {
            self.space(1.0);
            self.line_of_text(note, NOTE_SIZE, false, false);
        }
    }

    /// Centered cell texts for one row whose bottom edge is at `row_bottom`
    fn table_row(&self, cells: &[&str; 3], left: f32, row_bottom: f32, size: f32, bold: bool) {
        let font = if bold { &self.fonts.bold } else { &self.fonts.regular };
        let mut x = left;
        for (cell, width) in cells.iter().zip(COLUMN_WIDTHS) {
            let text_x = x + (width - text_width(cell, size)) / 2.0;
            let baseline = row_bottom + (ROW_HEIGHT - size * PT_TO_MM) / 2.0;
            self.layer.use_text(*cell, size, Mm(text_x), Mm(baseline), font);
            x += width;
        }
    }

    fn grid(&self, left: f32, top: f32, width: f32, rows: usize) {
        self.layer.set_outline_color(rgb(0.0, 0.0, 0.0));
        self.layer.set_outline_thickness(1.0);
        let bottom = top - rows as f32 * ROW_HEIGHT;

        for r in 0..=rows {
            let y = top - r as f32 * ROW_HEIGHT;
            self.stroke(left, y, left + width, y);
        }
        let mut x = left;
        self.stroke(x, top, x, bottom);
        for w in COLUMN_WIDTHS {
            x += w;
            self.stroke(x, top, x, bottom);
        }
    }

    fn stroke(&self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(y1)), false),
                (Point::new(Mm(x2), Mm(y2)), false),
            ],
            is_closed: false,
        });
    }

    fn chart(&mut self, document: &ReportDocument, chart: &ChartFile) -> Result<(), ReportError> {
        let caption_height = HEADING_SIZE * PT_TO_MM * 1.4;
        self.reserve(caption_height + CHART_HEIGHT + 12.0);
        self.line_of_text(&document.chart.title, HEADING_SIZE, true, true);
        self.space(2.0);

        let file = File::open(chart.path())?;
        let decoder = PngDecoder::new(BufReader::new(file)).map_err(pdf_error)?;
        let image = Image::try_from(decoder).map_err(pdf_error)?;

        let layout = chart.layout();
        let natural_width = layout.width as f32 / CHART_DPI * 25.4;
        let natural_height = layout.height as f32 / CHART_DPI * 25.4;
        let left = (PAGE_WIDTH - CHART_WIDTH) / 2.0;
        let bottom = self.y - CHART_HEIGHT;

        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(left)),
                translate_y: Some(Mm(bottom)),
                scale_x: Some(CHART_WIDTH / natural_width),
                scale_y: Some(CHART_HEIGHT / natural_height),
                dpi: Some(CHART_DPI),
                ..Default::default()
            },
        );

        // Axis annotations over the image
        self.layer.set_fill_color(rgb(0.0, 0.0, 0.0));
        let baseline = bottom + CHART_HEIGHT * (1.0 - layout.baseline_fraction());
        for (i, (label, _)) in document.chart.bars.iter().enumerate() {
            let center = left + CHART_WIDTH * layout.bar_center_fraction(i);
            let name = label.as_str();
            self.layer.use_text(
                name,
                NOTE_SIZE,
                Mm(center - text_width(name, NOTE_SIZE) / 2.0),
                Mm(baseline - 4.0),
                &self.fonts.regular,
            );
        }
        let plot_top = bottom + CHART_HEIGHT * (1.0 - layout.top_fraction());
        let max_label = document.chart.max_value().to_string();
        self.layer.use_text(
            max_label.as_str(),
            NOTE_SIZE,
            Mm(left - text_width(&max_label, NOTE_SIZE) - 1.0),
            Mm(plot_top - 1.0),
            &self.fonts.regular,
        );
        self.layer.use_text(
            "0",
            NOTE_SIZE,
            Mm(left - text_width("0", NOTE_SIZE) - 1.0),
            Mm(baseline - 1.0),
            &self.fonts.regular,
        );

        self.y = bottom - 8.0;
        let axis_caption = format!(
            "{} (x) / {} (y)",
            document.chart.x_label, document.chart.y_label
        );
        self.line_of_text(&axis_caption, NOTE_SIZE, false, true);
        Ok(())
    }

    fn save(self, out: File) -> Result<usize, ReportError> {
        let pages = self.pages;
        let mut writer = BufWriter::new(out);
        self.doc.save(&mut writer).map_err(pdf_error)?;
        writer.flush()?;
        Ok(pages)
    }
}

/// Lay out `document` with the embedded chart and write it to `out`.
///
/// Returns the number of pages written.
pub fn write_pdf(
    document: &ReportDocument,
    chart: &ChartFile,
    font_path: Option<&Path>,
    out: File,
) -> Result<usize, ReportError> {
    let mut cursor = PageCursor::new(&document.title, font_path)?;

    cursor.line_of_text(&document.title, TITLE_SIZE, true, true);
    cursor.space(8.0);

    for line in &document.metadata {
        cursor.line_of_text(line, BODY_SIZE, false, false);
        cursor.space(1.5);
    }
    cursor.space(6.0);

    for table in &document.tables {
        cursor.table(table);
        cursor.space(7.0);
    }

    cursor.line_of_text(&document.findings_title, HEADING_SIZE, true, false);
    cursor.space(2.0);
    for finding in &document.findings {
        cursor.line_of_text(finding, BODY_SIZE, false, false);
        cursor.space(1.5);
    }
    cursor.space(7.0);

    cursor.chart(document, chart)?;
    cursor.save(out)
}
