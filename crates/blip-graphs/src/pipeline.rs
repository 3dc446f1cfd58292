//! Fetch → normalize → aggregate → render → export for one interaction.

use crate::aggregator::TemporalAggregator;
use crate::chart::{ChartRenderer, ChartStyle, SvgChartRenderer};
use crate::export::{csv_bytes, event_table, table_view, EventRow, PdfArtifact, PdfExporter, ReportContext, TableView};
use crate::filter::{FilterConfig, TimeWindow};
use crate::normalizer::{EventNormalizer, NormalizedEvents};
use crate::report::{ChartKind, RenderedReport, ReportRenderer};
use crate::types::TemporalAggregates;
use blip_common::{ApiKey, EventQuery, EventSource, FlowId, RawEvent, Result};
use blip_i18n::{ids, Localizer};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// What to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Flow whose first block marks a contact.
    pub flow: FlowId,
    /// Period, timezone and business hours.
    pub filter: FilterConfig,
}

/// Everything computed from one fetch.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Resolved window.
    pub window: TimeWindow,
    /// Events returned by the source.
    pub fetched_events: usize,
    /// First-contact rows and skip metrics.
    pub normalized: NormalizedEvents,
    /// The four temporal views.
    pub aggregates: TemporalAggregates,
    /// Chart series and summary.
    pub report: RenderedReport,
    /// Capped first-contact table.
    pub table: TableView,
    /// Capped table of the fetched events.
    pub events: TableView<EventRow>,
}

/// One rendered chart document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    /// View shown.
    pub kind: ChartKind,
    /// File name, e.g. `hours.svg`.
    pub file_name: String,
    /// Document contents.
    pub document: String,
}

/// Export payloads, ready to be written.
#[derive(Debug, Clone)]
pub struct Artifacts {
    /// PDF report.
    pub pdf: PdfArtifact,
    /// CSV of the first-contact table, absent if serialization failed.
    pub csv: Option<Vec<u8>>,
    /// CSV of the fetched events, absent if serialization failed.
    pub events_csv: Option<Vec<u8>>,
    /// Charts that rendered.
    pub charts: Vec<RenderedChart>,
    /// Non-fatal problems for the operator.
    pub notices: Vec<String>,
}

/// Runs one interaction against an event source.
pub struct InsightsPipeline<S> {
    source: S,
    localizer: Localizer,
    chart_renderer: Box<dyn ChartRenderer>,
    pdf_exporter: PdfExporter,
}

impl<S: EventSource> InsightsPipeline<S> {
    /// Pipeline with default SVG charts
    pub fn new(source: S, localizer: Localizer) -> Self {
        Self {
            source,
            localizer,
            chart_renderer: Box::new(SvgChartRenderer::default()),
            pdf_exporter: PdfExporter::default(),
        }
    }

    /// Draw charts with `style`
    #[must_use]
    pub fn with_chart_style(mut self, style: ChartStyle) -> Self {
        self.pdf_exporter = PdfExporter::new(style.colors.clone());
        self.chart_renderer = Box::new(SvgChartRenderer::new(style));
        self
    }

    /// Replace the chart renderer
    #[must_use]
    pub fn with_chart_renderer(mut self, renderer: Box<dyn ChartRenderer>) -> Self {
        self.chart_renderer = renderer;
        self
    }

    /// The localizer used for every label
    pub const fn localizer(&self) -> &Localizer {
        &self.localizer
    }

    /// Fetch the window's events and analyze them.
    ///
    /// Fetch errors propagate unchanged; nothing is retried.
    #[instrument(skip(self, key, request), fields(flow = %request.flow))]
    pub async fn run(&self, key: &ApiKey, request: &AnalysisRequest, now: DateTime<Utc>) -> Result<AnalysisOutcome> {
        let window = request.filter.window(now);
        let query = EventQuery::new(request.flow.clone(), window.start, window.end)?;
        let events = self.source.fetch_events(key, &query).await?;
        info!(events = events.len(), "Fetched events");
        Ok(self.analyze(&events, &request.filter, window))
    }

    /// Analyze already fetched events
    #[instrument(skip_all, fields(events = events.len()))]
    pub fn analyze(&self, events: &[RawEvent], filter: &FilterConfig, window: TimeWindow) -> AnalysisOutcome {
        let normalized = EventNormalizer::new(window, filter.timezone).normalize(events);
        let aggregates = TemporalAggregator::new(window).aggregate(&normalized.rows, filter);
        let report = ReportRenderer::new(&self.localizer).render(&aggregates, filter, window, normalized.skipped);
        let table = table_view(&normalized.rows, filter);
        let events_table = event_table(events);

        info!(
            visitors = aggregates.total,
            in_hours = aggregates.business.in_hours,
            out_hours = aggregates.business.out_hours,
            skipped = normalized.skipped.total(),
            "Analysis complete"
        );
        AnalysisOutcome {
            window,
            fetched_events: events.len(),
            normalized,
            aggregates,
            report,
            table,
            events: events_table,
        }
    }

    /// Render charts, CSV and PDF.
    ///
    /// Render failures become notices so the other artifacts still get
    /// produced; only a fatal error aborts.
    #[instrument(skip_all)]
    pub fn render_artifacts(&self, outcome: &AnalysisOutcome, context: &ReportContext) -> Result<Artifacts> {
        let mut notices = Vec::new();

        let mut charts = Vec::with_capacity(outcome.report.charts.len());
        for chart in &outcome.report.charts {
            match self.chart_renderer.render(chart) {
                Ok(document) => charts.push(RenderedChart {
                    kind: chart.kind,
                    file_name: format!("{}.{}", chart.kind.file_stem(), self.chart_renderer.extension()),
                    document,
                }),
                Err(err) if !err.is_fatal() => {
                    warn!(kind = ?chart.kind, error = %err, "Chart rendering failed");
                    notices.push(self.render_notice(&err.user_message()));
                }
                Err(err) => return Err(err),
            }
        }

        let csv = self.table_csv(&outcome.table, ids::TABLE_TITLE, &mut notices)?;
        let events_csv = self.table_csv(&outcome.events, ids::EVENTS_TABLE_TITLE, &mut notices)?;

        let pdf = self.pdf_exporter.export(&outcome.report, context, &self.localizer)?;
        if let Some(notice) = &pdf.notice {
            notices.push(notice.clone());
        }

        Ok(Artifacts {
            pdf,
            csv,
            events_csv,
            charts,
            notices,
        })
    }

    fn table_csv<R: Serialize>(
        &self,
        table: &TableView<R>,
        title_id: &str,
        notices: &mut Vec<String>,
    ) -> Result<Option<Vec<u8>>> {
        let bytes = match csv_bytes(table) {
            Ok(bytes) => Some(bytes),
            Err(err) if !err.is_fatal() => {
                warn!(table = title_id, error = %err, "CSV export failed");
                notices.push(self.localizer.csv_notice(title_id, &err.user_message()));
                None
            }
            Err(err) => return Err(err),
        };
        if table.is_truncated() {
            notices.push(self.localizer.table_truncated(title_id, table.rows.len(), table.total_rows));
        }
        Ok(bytes)
    }

    fn render_notice(&self, reason: &str) -> String {
        self.localizer
            .text_with(ids::REPORT_RENDER_NOTICE, &[("reason", reason.to_string())])
    }
}
