//! Export sink: capped table view, CSV and the PDF report.

use crate::chart::ColorScheme;
use crate::filter::FilterConfig;
use crate::normalizer::event_visitor;
use crate::report::{ChartSeries, RenderedReport, ReportRenderer};
use crate::types::NormalizedRow;
use blip_common::{format_timestamp, to_iso_z, InsightsError, RawEvent, Result};
use blip_i18n::{ids, Localizer};
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use plotters::style::RGBColor;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point,
    Polygon, Rgb,
};
use serde::Serialize;
use std::io::Write;
use tracing::{debug, info, instrument, warn};

/// Rows kept in the table view
pub const TABLE_ROW_LIMIT: usize = 5_000;

/// One first contact as shown in the table and CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    /// Visitor identity.
    pub visitor_id: String,
    /// First contact, UTC.
    pub first_contact_utc: String,
    /// First contact in the analysis timezone.
    pub first_contact_local: String,
    /// Local calendar date.
    pub date: NaiveDate,
    /// Local hour.
    pub hour: u32,
    /// Local weekday, English short name.
    pub weekday: String,
    /// ISO week, `YYYY-Www`.
    pub iso_week: String,
    /// Whether the contact was in business hours.
    pub business_hours: bool,
    /// Event category.
    pub category: Option<String>,
    /// Event action.
    pub action: Option<String>,
}

/// One fetched event as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRow {
    /// Storage timestamp as sent.
    pub storage_date: Option<String>,
    /// Event timestamp as sent.
    pub event_date: Option<String>,
    /// Visitor identity, if one could be derived.
    pub visitor_id: Option<String>,
    /// Event category.
    pub category: Option<String>,
    /// Event action.
    pub action: Option<String>,
    /// Contact as JSON text.
    pub contact: Option<String>,
    /// Extras as JSON text.
    pub extras: Option<String>,
}

/// A table capped at [`TABLE_ROW_LIMIT`] rows.
///
/// Defaults to the chronological first-contact table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView<R = TableRow> {
    /// Rows shown.
    pub rows: Vec<R>,
    /// Rows before the cap.
    pub total_rows: usize,
}

impl<R> Default for TableView<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            total_rows: 0,
        }
    }
}

impl<R> TableView<R> {
    /// Whether rows were cut by the cap
    pub fn is_truncated(&self) -> bool {
        self.total_rows > self.rows.len()
    }
}

/// Build the capped table view in chronological order
#[instrument(skip_all, fields(rows = rows.len()))]
pub fn table_view(rows: &[NormalizedRow], filter: &FilterConfig) -> TableView {
    let mut ordered: Vec<&NormalizedRow> = rows.iter().collect();
    ordered.sort_by_key(|row| row.timestamp);

    let shown = ordered
        .into_iter()
        .take(TABLE_ROW_LIMIT)
        .map(|row| {
            let local = row.local_time(&filter.timezone);
            let iso = local.iso_week();
            TableRow {
                visitor_id: row.visitor_id.to_string(),
                first_contact_utc: to_iso_z(row.timestamp),
                first_contact_local: local.format("%Y-%m-%d %H:%M:%S").to_string(),
                date: row.date,
                hour: local.hour(),
                weekday: local.weekday().to_string(),
                iso_week: format!("{}-W{:02}", iso.year(), iso.week()),
                business_hours: filter.is_business(row.timestamp),
                category: row.metadata.category.clone(),
                action: row.metadata.action.clone(),
            }
        })
        .collect();

    TableView {
        rows: shown,
        total_rows: rows.len(),
    }
}

/// Raw events in fetch order, capped like the first-contact table
#[instrument(skip_all, fields(events = events.len()))]
pub fn event_table(events: &[RawEvent]) -> TableView<EventRow> {
    let rows = events
        .iter()
        .take(TABLE_ROW_LIMIT)
        .map(|event| EventRow {
            storage_date: event.storage_date.clone(),
            event_date: event.event_date.clone(),
            visitor_id: event_visitor(event).map(|id| id.to_string()),
            category: event.category.clone(),
            action: event.action.clone(),
            contact: event.contact.as_ref().map(json_text),
            extras: event.extras.as_ref().map(json_text),
        })
        .collect();

    TableView {
        rows,
        total_rows: events.len(),
    }
}

fn json_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Write the table as CSV with a header row
pub fn write_csv<R: Serialize, W: Write>(table: &TableView<R>, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in &table.rows {
        csv_writer
            .serialize(row)
            .map_err(|e| InsightsError::render_with_source("Could not write CSV row", e))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// The table as CSV bytes
pub fn csv_bytes<R: Serialize>(table: &TableView<R>) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer)?;
    debug!(rows = table.rows.len(), bytes = buffer.len(), "Serialized table to CSV");
    Ok(buffer)
}

/// Facts printed in the PDF header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    /// Analyzed flow.
    pub flow: String,
    /// Generation time.
    pub generated_at: DateTime<Utc>,
}

/// A rendered PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfArtifact {
    /// Document bytes.
    pub bytes: Vec<u8>,
    /// Whether this is the "no data" document instead of the full report.
    pub placeholder: bool,
    /// Rendering problem worth telling the operator about.
    pub notice: Option<String>,
}

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 18.0;
const CHART_HEIGHT: f32 = 82.0;
const CHART_GAP: f32 = 8.0;
const MAX_PDF_LABELS: usize = 12;

/// Builtin PDF fonts only cover ASCII reliably, so accented Latin letters
/// lose their marks and anything else becomes `?`.
pub fn pdf_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            'ñ' => 'n',
            'Ñ' => 'N',
            c if c.is_ascii() => c,
            _ => '?',
        })
        .collect()
}

fn rgb(color: RGBColor) -> Color {
    let RGBColor(r, g, b) = color;
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

fn pdf_error(stage: &str, err: impl std::fmt::Debug) -> InsightsError {
    InsightsError::render(format!("PDF {stage} failed: {err:?}"))
}

/// Page cursor: writes top-down and opens new pages as needed
struct PdfCanvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl PdfCanvas {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(pdf_text(title), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1".to_string());
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| pdf_error("font setup", e))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| pdf_error("font setup", e))?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
            pages: 1,
        })
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y - height < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
            self.pages += 1;
        }
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        let advance = size * 0.5;
        self.ensure_space(advance);
        self.y -= advance;
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.set_fill_color(rgb(RGBColor(0, 0, 0)));
        self.layer.use_text(pdf_text(text), size, Mm(MARGIN), Mm(self.y), font);
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn text_at(&self, text: &str, size: f32, x: f32, y: f32) {
        self.layer.use_text(pdf_text(text), size, Mm(x), Mm(y), &self.regular);
    }

    fn rect(&self, x: f32, y: f32, width: f32, height: f32, color: RGBColor) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let corners = vec![
            (Point::new(Mm(x), Mm(y)), false),
            (Point::new(Mm(x + width), Mm(y)), false),
            (Point::new(Mm(x + width), Mm(y + height)), false),
            (Point::new(Mm(x), Mm(y + height)), false),
        ];
        self.layer.set_fill_color(rgb(color));
        self.layer.add_polygon(Polygon {
            rings: vec![corners],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn segment(&self, from: (f32, f32), to: (f32, f32)) {
        self.layer.set_outline_color(rgb(RGBColor(80, 80, 80)));
        self.layer.set_outline_thickness(0.6);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(from.0), Mm(from.1)), false),
                (Point::new(Mm(to.0), Mm(to.1)), false),
            ],
            is_closed: false,
        });
    }

    #[allow(clippy::cast_precision_loss)]
    fn chart(&mut self, chart: &ChartSeries, palette: &[RGBColor]) {
        self.ensure_space(CHART_HEIGHT);
        let top = self.y;
        let bottom = top - CHART_HEIGHT;
        self.y = bottom - CHART_GAP;

        self.layer.set_fill_color(rgb(RGBColor(0, 0, 0)));
        self.layer
            .use_text(pdf_text(&chart.title), 11.0, Mm(MARGIN), Mm(top - 5.0), &self.bold);

        // Legend under the title
        let mut legend_x = MARGIN;
        if chart.series.len() > 1 {
            for (index, series) in chart.series.iter().enumerate() {
                self.rect(legend_x, top - 11.0, 3.0, 3.0, palette[index % palette.len()]);
                self.layer.set_fill_color(rgb(RGBColor(0, 0, 0)));
                self.text_at(&series.name, 7.0, legend_x + 4.5, top - 10.6);
                legend_x += 6.0 + series.name.chars().count() as f32 * 1.6;
            }
        }

        let plot_x = MARGIN + 12.0;
        let plot_y = bottom + 10.0;
        let plot_width = PAGE_WIDTH - MARGIN - plot_x;
        let plot_height = CHART_HEIGHT - 26.0;
        let max = chart.max_total().max(1) as f32;
        let count = chart.labels.len().max(1);
        let slot = plot_width / count as f32;

        let mut base = vec![0u64; chart.labels.len()];
        for (index, series) in chart.series.iter().enumerate() {
            let color = palette[index % palette.len()];
            for (i, (&value, bottom_value)) in series.values.iter().zip(base.iter_mut()).enumerate() {
                let y = plot_y + *bottom_value as f32 / max * plot_height;
                let height = value as f32 / max * plot_height;
                self.rect(plot_x + i as f32 * slot + slot * 0.15, y, slot * 0.7, height, color);
                *bottom_value += value;
            }
        }

        self.segment((plot_x, plot_y), (plot_x + plot_width, plot_y));
        self.segment((plot_x, plot_y), (plot_x, plot_y + plot_height));

        self.layer.set_fill_color(rgb(RGBColor(0, 0, 0)));
        self.text_at(&chart.max_total().to_string(), 7.0, MARGIN, plot_y + plot_height - 2.0);
        self.text_at("0", 7.0, MARGIN, plot_y);
        let step = count.div_ceil(MAX_PDF_LABELS).max(1);
        for (i, label) in chart.labels.iter().enumerate().step_by(step) {
            self.text_at(label, 6.5, plot_x + i as f32 * slot + slot * 0.15, plot_y - 4.5);
        }
        self.text_at(&chart.x_label, 7.0, plot_x, plot_y - 9.0);
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc.save_to_bytes().map_err(|e| pdf_error("serialization", e))
    }
}

/// Writes the PDF report.
#[derive(Debug, Clone, Default)]
pub struct PdfExporter {
    colors: ColorScheme,
}

impl PdfExporter {
    /// Exporter drawing bars with `colors`
    pub const fn new(colors: ColorScheme) -> Self {
        Self { colors }
    }

    /// Render `report` as a PDF.
    ///
    /// An empty report yields the "no data" document. If the full report
    /// cannot be drawn, the "no data" document is returned with a notice
    /// instead; only a failure of that fallback is an error.
    #[instrument(skip_all, fields(total = report.summary.total))]
    pub fn export(&self, report: &RenderedReport, context: &ReportContext, localizer: &Localizer) -> Result<PdfArtifact> {
        if report.is_empty() {
            info!("No visitors in the period, writing the no-data report");
            return Ok(PdfArtifact {
                bytes: Self::placeholder(report, context, localizer, None)?,
                placeholder: true,
                notice: None,
            });
        }

        match self.full_report(report, context, localizer) {
            Ok(bytes) => Ok(PdfArtifact {
                bytes,
                placeholder: false,
                notice: None,
            }),
            Err(err) => {
                warn!(error = %err, "Full PDF report failed, falling back to the no-data report");
                let notice = localizer.text_with(ids::REPORT_PDF_NOTICE, &[("reason", err.to_string())]);
                Ok(PdfArtifact {
                    bytes: Self::placeholder(report, context, localizer, Some(&notice))?,
                    placeholder: true,
                    notice: Some(notice),
                })
            }
        }
    }

    fn header(canvas: &mut PdfCanvas, context: &ReportContext, localizer: &Localizer) {
        canvas.line(&localizer.text(ids::REPORT_TITLE), 18.0, true);
        canvas.gap(2.0);
        canvas.line(
            &localizer.text_with(ids::REPORT_FLOW, &[("flow", context.flow.clone())]),
            11.0,
            false,
        );
        canvas.line(
            &localizer.text_with(
                ids::REPORT_GENERATED,
                &[("timestamp", format_timestamp(context.generated_at))],
            ),
            9.0,
            false,
        );
        canvas.gap(4.0);
    }

    fn full_report(&self, report: &RenderedReport, context: &ReportContext, localizer: &Localizer) -> Result<Vec<u8>> {
        let mut canvas = PdfCanvas::new(&localizer.text(ids::REPORT_TITLE))?;
        Self::header(&mut canvas, context, localizer);

        canvas.line(&localizer.text(ids::SUMMARY_TITLE), 13.0, true);
        canvas.gap(1.0);
        for line in ReportRenderer::new(localizer).summary_lines(&report.summary) {
            canvas.line(&line, 9.5, false);
        }
        canvas.gap(6.0);

        let palette = self.colors.colors();
        for chart in &report.charts {
            canvas.chart(chart, &palette);
        }

        debug!(pages = canvas.pages, "Laid out PDF report");
        canvas.finish()
    }

    fn placeholder(
        report: &RenderedReport,
        context: &ReportContext,
        localizer: &Localizer,
        notice: Option<&str>,
    ) -> Result<Vec<u8>> {
        let mut canvas = PdfCanvas::new(&localizer.text(ids::REPORT_TITLE))?;
        Self::header(&mut canvas, context, localizer);

        canvas.line(&localizer.text(ids::REPORT_NO_DATA), 14.0, true);
        canvas.gap(1.0);
        canvas.line(&localizer.text(ids::REPORT_NO_DATA_HINT), 9.5, false);
        canvas.gap(4.0);
        let summary = ReportRenderer::new(localizer).summary_lines(&report.summary);
        // Period and discarded-event lines help explain an empty result
        for line in summary.iter().skip(5) {
            canvas.line(line, 9.5, false);
        }
        if let Some(notice) = notice {
            canvas.gap(4.0);
            canvas.line(notice, 9.5, false);
        }
        canvas.finish()
    }
}
