//! # BLiP Graphs
//!
//! Unique-visitor analytics for BLiP Insights.
//!
//! Raw flow events become one first-contact row per visitor, which are then
//! bucketed by business hours, ISO week, weekday and hour of day in the
//! analysis timezone. The resulting series feed SVG charts, an executive
//! summary, a capped CSV table and a PDF report.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use blip_common::{ApiKey, BlipClient, FlowId};
//! use blip_graphs::{AnalysisRequest, BusinessHours, FilterConfig, InsightsPipeline, Period};
//! use blip_i18n::{Locale, Localizer};
//!
//! # async fn example() -> blip_common::Result<()> {
//! let client = BlipClient::with_defaults()?;
//! let pipeline = InsightsPipeline::new(client, Localizer::new(Locale::English)?);
//! let request = AnalysisRequest {
//!     flow: FlowId::parse("Início")?,
//!     filter: FilterConfig::new(Period::LastDays(30), chrono_tz::Tz::UTC, BusinessHours::default())?,
//! };
//! let key = ApiKey::parse("Key abc123")?;
//! let outcome = pipeline.run(&key, &request, chrono::Utc::now()).await?;
//! println!("{} unique visitors", outcome.aggregates.total);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregator;
pub mod chart;
pub mod export;
pub mod filter;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod types;

pub use aggregator::{
    BusinessHoursAggregator, DataAggregator, HourOfDayAggregator, IsoWeekAggregator, TemporalAggregator,
    WeekdayAggregator, WEEKDAYS,
};
pub use chart::{parse_color, ChartRenderer, ChartStyle, ColorScheme, SvgChartRenderer};
pub use export::{
    csv_bytes, event_table, pdf_text, table_view, write_csv, EventRow, PdfArtifact, PdfExporter, ReportContext, TableRow,
    TableView,
    TABLE_ROW_LIMIT,
};
pub use filter::{BusinessHours, FilterConfig, Period, TimeWindow, MAX_YEAR};
pub use normalizer::{deduplicate, event_timestamp, event_visitor, extract_identity, parse_timestamp, EventNormalizer, NormalizedEvents};
pub use pipeline::{AnalysisOutcome, AnalysisRequest, Artifacts, InsightsPipeline, RenderedChart};
pub use report::{ChartKind, ChartSeries, ExecutiveSummary, RenderedReport, ReportRenderer, Series};
pub use types::*;
