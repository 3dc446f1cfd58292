//! Chart series and executive summary built from aggregates.

use crate::filter::{BusinessHours, FilterConfig, TimeWindow};
use crate::types::{SkipCounts, SplitCount, TemporalAggregates};
use blip_common::{format_timestamp, percentage};
use blip_i18n::{ids, Localizer};
use chrono::Weekday;
use serde::Serialize;
use tracing::{debug, instrument};

/// Which view a chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// In vs out of business hours.
    BusinessHours,
    /// Per ISO week.
    IsoWeek,
    /// Per weekday.
    Weekday,
    /// Per hour of the day.
    HourOfDay,
}

impl ChartKind {
    /// All kinds in report order
    pub const ALL: [Self; 4] = [Self::BusinessHours, Self::IsoWeek, Self::Weekday, Self::HourOfDay];

    /// File name stem of the chart's SVG
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::BusinessHours => "business_hours",
            Self::IsoWeek => "iso_weeks",
            Self::Weekday => "weekdays",
            Self::HourOfDay => "hours",
        }
    }
}

/// One named series of bar values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    /// Legend name.
    pub name: String,
    /// One value per label.
    pub values: Vec<u64>,
}

/// Labels and stacked series of one chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    /// View shown.
    pub kind: ChartKind,
    /// Chart title.
    pub title: String,
    /// X axis description.
    pub x_label: String,
    /// Y axis description.
    pub y_label: String,
    /// Category labels.
    pub labels: Vec<String>,
    /// Series stacked bottom to top.
    pub series: Vec<Series>,
}

impl ChartSeries {
    /// Stacked total per label
    pub fn totals(&self) -> Vec<u64> {
        (0..self.labels.len())
            .map(|i| self.series.iter().filter_map(|s| s.values.get(i)).sum())
            .collect()
    }

    /// Highest stacked total
    pub fn max_total(&self) -> u64 {
        self.totals().into_iter().max().unwrap_or(0)
    }

    /// Whether every value is zero
    pub fn is_empty(&self) -> bool {
        self.max_total() == 0
    }
}

/// Headline numbers of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    /// Unique visitors.
    pub total: u64,
    /// Visitors in business hours.
    pub in_hours: u64,
    /// Visitors outside business hours.
    pub out_hours: u64,
    /// Share in business hours, 0 to 100.
    pub in_hours_pct: f64,
    /// Share outside business hours, 0 to 100.
    pub out_hours_pct: f64,
    /// Busiest local hour, earliest on ties.
    pub peak_hour: Option<u32>,
    /// Busiest weekday, earliest on ties.
    pub peak_weekday: Option<Weekday>,
    /// Analyzed window.
    pub window: TimeWindow,
    /// IANA timezone name.
    pub timezone: String,
    /// Business hours used.
    pub business_hours: BusinessHours,
    /// Events dropped during normalization.
    pub skipped: SkipCounts,
}

impl ExecutiveSummary {
    /// Summarize aggregates; pure
    pub fn from_aggregates(
        aggregates: &TemporalAggregates,
        filter: &FilterConfig,
        window: TimeWindow,
        skipped: SkipCounts,
    ) -> Self {
        let SplitCount { in_hours, out_hours } = aggregates.business;
        Self {
            total: aggregates.total,
            in_hours,
            out_hours,
            in_hours_pct: percentage(in_hours, aggregates.total),
            out_hours_pct: percentage(out_hours, aggregates.total),
            peak_hour: peak(aggregates.hourly.iter().map(|b| (b.hour, b.counts.total()))),
            peak_weekday: peak(aggregates.weekday.iter().map(|b| (b.weekday, b.counts.total()))),
            window,
            timezone: filter.timezone.name().to_string(),
            business_hours: filter.business_hours,
            skipped,
        }
    }
}

/// Key of the largest non-zero count; the first one wins ties
fn peak<K>(buckets: impl Iterator<Item = (K, u64)>) -> Option<K> {
    let mut best: Option<(K, u64)> = None;
    for (key, count) in buckets {
        if count > 0 && best.as_ref().map_or(true, |(_, max)| count > *max) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key)
}

/// Charts and summary ready for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedReport {
    /// Charts in report order.
    pub charts: Vec<ChartSeries>,
    /// Headline numbers.
    pub summary: ExecutiveSummary,
}

impl RenderedReport {
    /// Whether the report has no visitors
    pub const fn is_empty(&self) -> bool {
        self.summary.total == 0
    }
}

/// Builds localized chart series and summary text.
#[derive(Debug)]
pub struct ReportRenderer<'a> {
    localizer: &'a Localizer,
}

impl<'a> ReportRenderer<'a> {
    /// Renderer using `localizer` for every label
    pub const fn new(localizer: &'a Localizer) -> Self {
        Self { localizer }
    }

    /// Build chart series and summary
    #[instrument(skip_all, fields(total = aggregates.total))]
    pub fn render(
        &self,
        aggregates: &TemporalAggregates,
        filter: &FilterConfig,
        window: TimeWindow,
        skipped: SkipCounts,
    ) -> RenderedReport {
        let charts = vec![
            self.business_chart(aggregates),
            self.weekly_chart(aggregates),
            self.weekday_chart(aggregates),
            self.hourly_chart(aggregates),
        ];
        debug!("Rendered {} chart series", charts.len());
        RenderedReport {
            charts,
            summary: ExecutiveSummary::from_aggregates(aggregates, filter, window, skipped),
        }
    }

    fn stacked(&self, kind: ChartKind, title: &str, x_label: &str, labels: Vec<String>, splits: &[SplitCount]) -> ChartSeries {
        let l = self.localizer;
        ChartSeries {
            kind,
            title: l.text(title),
            x_label: l.text(x_label),
            y_label: l.text(ids::AXIS_VISITORS),
            labels,
            series: vec![
                Series {
                    name: l.text(ids::SERIES_IN_HOURS),
                    values: splits.iter().map(|s| s.in_hours).collect(),
                },
                Series {
                    name: l.text(ids::SERIES_OUT_HOURS),
                    values: splits.iter().map(|s| s.out_hours).collect(),
                },
            ],
        }
    }

    fn business_chart(&self, aggregates: &TemporalAggregates) -> ChartSeries {
        let l = self.localizer;
        ChartSeries {
            kind: ChartKind::BusinessHours,
            title: l.text(ids::CHART_BUSINESS_TITLE),
            x_label: l.text(ids::AXIS_BUSINESS),
            y_label: l.text(ids::AXIS_VISITORS),
            labels: vec![l.text(ids::SERIES_IN_HOURS), l.text(ids::SERIES_OUT_HOURS)],
            series: vec![Series {
                name: l.text(ids::AXIS_VISITORS),
                values: vec![aggregates.business.in_hours, aggregates.business.out_hours],
            }],
        }
    }

    fn weekly_chart(&self, aggregates: &TemporalAggregates) -> ChartSeries {
        let labels = aggregates
            .weekly
            .iter()
            .map(|b| self.localizer.week(b.iso_year, b.week))
            .collect();
        let splits: Vec<SplitCount> = aggregates.weekly.iter().map(|b| b.counts).collect();
        self.stacked(ChartKind::IsoWeek, ids::CHART_WEEKLY_TITLE, ids::AXIS_WEEK, labels, &splits)
    }

    fn weekday_chart(&self, aggregates: &TemporalAggregates) -> ChartSeries {
        let labels = aggregates
            .weekday
            .iter()
            .map(|b| self.localizer.weekday(b.weekday))
            .collect();
        let splits: Vec<SplitCount> = aggregates.weekday.iter().map(|b| b.counts).collect();
        self.stacked(ChartKind::Weekday, ids::CHART_WEEKDAY_TITLE, ids::AXIS_WEEKDAY, labels, &splits)
    }

    fn hourly_chart(&self, aggregates: &TemporalAggregates) -> ChartSeries {
        let labels = aggregates.hourly.iter().map(|b| format!("{:02}", b.hour)).collect();
        let splits: Vec<SplitCount> = aggregates.hourly.iter().map(|b| b.counts).collect();
        self.stacked(ChartKind::HourOfDay, ids::CHART_HOURLY_TITLE, ids::AXIS_HOUR, labels, &splits)
    }

    /// Summary as localized lines, in reading order
    pub fn summary_lines(&self, summary: &ExecutiveSummary) -> Vec<String> {
        let l = self.localizer;
        let s = &summary.skipped;
        vec![
            l.total_line(summary.total),
            l.in_hours_line(summary.in_hours, summary.in_hours_pct),
            l.out_hours_line(summary.out_hours, summary.out_hours_pct),
            l.peak_hour_line(summary.peak_hour),
            l.peak_weekday_line(summary.peak_weekday),
            l.text_with(
                ids::SUMMARY_WINDOW,
                &[
                    ("start", format_timestamp(summary.window.start)),
                    ("end", format_timestamp(summary.window.end)),
                    ("timezone", summary.timezone.clone()),
                ],
            ),
            l.text_with(
                ids::SUMMARY_BUSINESS_HOURS,
                &[
                    ("start", summary.business_hours.start.format("%H:%M").to_string()),
                    ("end", summary.business_hours.end.format("%H:%M").to_string()),
                ],
            ),
            l.text_with(
                ids::SUMMARY_SKIPPED,
                &[
                    ("unparseable", s.unparseable_timestamp.to_string()),
                    ("missing", s.missing_visitor.to_string()),
                    ("outside", s.out_of_window.to_string()),
                    ("duplicate", s.duplicate.to_string()),
                ],
            ),
        ]
    }
}
