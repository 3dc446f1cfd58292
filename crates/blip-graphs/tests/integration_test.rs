//! Integration tests for blip-graphs crate.
//!
//! These exercise the whole normalize → aggregate → render → export chain
//! and the invariants that hold across it.

use async_trait::async_trait;
use blip_common::test_utils::event_fixtures::{distinct_visitors, raw_event};
use blip_common::test_utils::property_testing::{instant_strategy, raw_events_strategy};
use blip_common::test_utils::{init_test_logging, mock_timestamp};
use blip_common::{ApiKey, EventQuery, EventSource, FlowId, InsightsError, RawEvent, Result};
use blip_graphs::{
    deduplicate, table_view, AnalysisRequest, BusinessHours, ChartRenderer, ChartSeries, EventNormalizer,
    FilterConfig, InsightsPipeline, Period, ReportContext, SplitCount, TemporalAggregator, TimeWindow,
    TABLE_ROW_LIMIT,
};
use blip_i18n::{Locale, Localizer};
use chrono::{NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use proptest::prelude::*;

fn business(start: u32, end: u32) -> BusinessHours {
    BusinessHours::new(
        NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
    )
}

fn january_filter(tz: Tz) -> (FilterConfig, TimeWindow) {
    let filter = FilterConfig::new(
        Period::Range {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        },
        tz,
        business(8, 18),
    )
    .unwrap();
    let window = filter.window(Utc::now());
    (filter, window)
}

#[test]
fn test_first_contact_example() {
    let (filter, window) = january_filter(Tz::UTC);
    let events = vec![
        raw_event("A", mock_timestamp(2024, 1, 10, 14, 0, 0)),
        raw_event("A", mock_timestamp(2024, 1, 10, 9, 0, 0)),
    ];

    let normalized = EventNormalizer::new(window, filter.timezone).normalize(&events);
    assert_eq!(normalized.rows.len(), 1);
    assert_eq!(normalized.rows[0].timestamp, mock_timestamp(2024, 1, 10, 9, 0, 0));

    let aggregates = TemporalAggregator::new(window).aggregate(&normalized.rows, &filter);
    assert_eq!(aggregates.business, SplitCount { in_hours: 1, out_hours: 0 });
}

#[test]
fn test_table_view_caps_at_limit_in_chronological_order() {
    let (filter, window) = january_filter(Tz::UTC);
    let mut events = distinct_visitors(5_200, mock_timestamp(2024, 1, 2, 0, 0, 0));
    events.reverse();

    let normalized = EventNormalizer::new(window, filter.timezone).normalize(&events);
    assert_eq!(normalized.rows.len(), 5_200);

    let table = table_view(&normalized.rows, &filter);
    assert_eq!(table.rows.len(), TABLE_ROW_LIMIT);
    assert_eq!(table.total_rows, 5_200);
    assert!(table.is_truncated());
    assert_eq!(table.rows[0].visitor_id, "visitor-0@wa.gw.msging.net");
    assert!(table
        .rows
        .windows(2)
        .all(|pair| pair[0].first_contact_utc <= pair[1].first_contact_utc));
}

#[test]
fn test_iso_week_boundary_placement() {
    let filter = FilterConfig::new(
        Period::Range {
            start: NaiveDate::from_ymd_opt(2018, 12, 24).unwrap(),
            end: NaiveDate::from_ymd_opt(2019, 1, 6).unwrap(),
        },
        Tz::UTC,
        business(8, 18),
    )
    .unwrap();
    let window = filter.window(Utc::now());
    // Sun 2018-12-30 is 2018-W52; Mon 2018-12-31 and Tue 2019-01-01 are 2019-W01
    let events = vec![
        raw_event("sun", mock_timestamp(2018, 12, 30, 10, 0, 0)),
        raw_event("mon", mock_timestamp(2018, 12, 31, 10, 0, 0)),
        raw_event("tue", mock_timestamp(2019, 1, 1, 10, 0, 0)),
    ];

    let normalized = EventNormalizer::new(window, filter.timezone).normalize(&events);
    let aggregates = TemporalAggregator::new(window).aggregate(&normalized.rows, &filter);
    let weeks: Vec<(i32, u32, u64)> = aggregates
        .weekly
        .iter()
        .map(|w| (w.iso_year, w.week, w.counts.total()))
        .collect();
    assert_eq!(weeks, vec![(2018, 52, 1), (2019, 1, 2)]);
}

#[test]
fn test_empty_input_gives_zero_aggregates() {
    let (filter, window) = january_filter(Tz::America__Sao_Paulo);
    let normalized = EventNormalizer::new(window, filter.timezone).normalize(&[]);
    let aggregates = TemporalAggregator::new(window).aggregate(&normalized.rows, &filter);

    assert_eq!(aggregates.total, 0);
    assert_eq!(aggregates.view_totals(), [0, 0, 0, 0]);
    assert_eq!(aggregates.weekday.len(), 7);
    assert_eq!(aggregates.hourly.len(), 24);
    assert!(!aggregates.weekly.is_empty());
}

proptest! {
    #[test]
    fn prop_views_sum_to_unique_visitors(events in raw_events_strategy(200), tz_index in 0usize..3) {
        let tz = [Tz::UTC, Tz::America__Sao_Paulo, Tz::Asia__Kolkata][tz_index];
        let (filter, window) = january_filter(tz);
        let normalized = EventNormalizer::new(window, filter.timezone).normalize(&events);
        let aggregates = TemporalAggregator::new(window).aggregate(&normalized.rows, &filter);

        let unique = normalized.rows.len() as u64;
        prop_assert_eq!(aggregates.total, unique);
        prop_assert_eq!(aggregates.view_totals(), [unique; 4]);
    }

    #[test]
    fn prop_deduplicate_is_idempotent(events in raw_events_strategy(200)) {
        let (filter, window) = january_filter(Tz::UTC);
        let once = EventNormalizer::new(window, filter.timezone).normalize(&events).rows;
        let twice = deduplicate(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_timezone_round_trip_preserves_instant(instant in instant_strategy(), tz_index in 0usize..4) {
        let tz = [Tz::UTC, Tz::America__Sao_Paulo, Tz::Australia__Lord_Howe, Tz::Asia__Kathmandu][tz_index];
        let local = instant.with_timezone(&tz);
        prop_assert_eq!(local.with_timezone(&Utc), instant);
    }
}

/// Event source returning canned events
struct FakeSource {
    events: Vec<RawEvent>,
    fail_with_auth: bool,
}

impl FakeSource {
    fn new(events: Vec<RawEvent>) -> Self {
        Self {
            events,
            fail_with_auth: false,
        }
    }
}

#[async_trait]
impl EventSource for FakeSource {
    async fn fetch_events(&self, _key: &ApiKey, query: &EventQuery) -> Result<Vec<RawEvent>> {
        assert!(query.start <= query.end);
        if self.fail_with_auth {
            return Err(InsightsError::authentication_with_status("key rejected", 401));
        }
        Ok(self.events.clone())
    }
}

/// Renderer that always fails, to check failures stay non-fatal
struct BrokenRenderer;

impl ChartRenderer for BrokenRenderer {
    fn render(&self, _chart: &ChartSeries) -> Result<String> {
        Err(InsightsError::render("backend unavailable"))
    }

    fn extension(&self) -> &'static str {
        "svg"
    }
}

fn request() -> AnalysisRequest {
    january_request(Tz::UTC)
}

fn january_request(tz: Tz) -> AnalysisRequest {
    AnalysisRequest {
        flow: FlowId::parse("Início").unwrap(),
        filter: january_filter(tz).0,
    }
}

fn context() -> ReportContext {
    ReportContext {
        flow: "Início".to_string(),
        generated_at: mock_timestamp(2024, 2, 1, 12, 0, 0),
    }
}

#[tokio::test]
async fn test_pipeline_end_to_end() {
    init_test_logging();
    let events = vec![
        raw_event("a", mock_timestamp(2024, 1, 2, 9, 0, 0)),
        raw_event("a", mock_timestamp(2024, 1, 3, 21, 0, 0)),
        raw_event("b", mock_timestamp(2024, 1, 4, 21, 0, 0)),
        raw_event("c", mock_timestamp(2024, 3, 1, 9, 0, 0)),
    ];
    let pipeline = InsightsPipeline::new(FakeSource::new(events), Localizer::new(Locale::English).unwrap());
    let key = ApiKey::parse("Key secret").unwrap();

    let outcome = pipeline.run(&key, &request(), Utc::now()).await.unwrap();
    assert_eq!(outcome.fetched_events, 4);
    assert_eq!(outcome.aggregates.total, 2);
    assert_eq!(outcome.aggregates.business, SplitCount { in_hours: 1, out_hours: 1 });
    assert_eq!(outcome.normalized.skipped.duplicate, 1);
    assert_eq!(outcome.normalized.skipped.out_of_window, 1);
    assert_eq!(outcome.table.rows.len(), 2);

    let artifacts = pipeline.render_artifacts(&outcome, &context()).unwrap();
    assert_eq!(artifacts.charts.len(), 4);
    assert!(artifacts.charts.iter().any(|c| c.file_name == "hours.svg"));
    assert!(!artifacts.pdf.placeholder);
    assert!(artifacts.csv.is_some());
    assert!(artifacts.notices.is_empty());
}

#[tokio::test]
async fn test_pipeline_queries_resolved_window() {
    let source = FakeSource::new(vec![]);
    let pipeline = InsightsPipeline::new(source, Localizer::new(Locale::English).unwrap());
    let key = ApiKey::parse("secret").unwrap();

    let outcome = pipeline.run(&key, &request(), Utc::now()).await.unwrap();
    assert_eq!(outcome.window.start, mock_timestamp(2024, 1, 1, 0, 0, 0));
    assert!(outcome.window.contains(mock_timestamp(2024, 1, 31, 23, 59, 59)));
    assert_eq!(outcome.fetched_events, 0);
}

#[tokio::test]
async fn test_empty_period_yields_no_data_pdf() {
    let pipeline = InsightsPipeline::new(FakeSource::new(vec![]), Localizer::new(Locale::Portuguese).unwrap());
    let key = ApiKey::parse("secret").unwrap();

    let outcome = pipeline.run(&key, &january_request(Tz::America__Sao_Paulo), Utc::now()).await.unwrap();
    assert!(outcome.report.is_empty());

    let artifacts = pipeline.render_artifacts(&outcome, &context()).unwrap();
    assert!(artifacts.pdf.placeholder);
    assert!(artifacts.pdf.bytes.starts_with(b"%PDF"));
    assert_eq!(artifacts.charts.len(), 4);
}

#[tokio::test]
async fn test_authentication_error_propagates() {
    let mut source = FakeSource::new(vec![]);
    source.fail_with_auth = true;
    let pipeline = InsightsPipeline::new(source, Localizer::new(Locale::English).unwrap());
    let key = ApiKey::parse("secret").unwrap();

    let err = pipeline.run(&key, &request(), Utc::now()).await.unwrap_err();
    assert!(matches!(err, InsightsError::Authentication { .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_render_failure_is_a_notice() {
    let events = vec![raw_event("a", mock_timestamp(2024, 1, 2, 9, 0, 0))];
    let pipeline = InsightsPipeline::new(FakeSource::new(events), Localizer::new(Locale::English).unwrap())
        .with_chart_renderer(Box::new(BrokenRenderer));
    let key = ApiKey::parse("secret").unwrap();

    let outcome = pipeline.run(&key, &request(), Utc::now()).await.unwrap();
    let artifacts = pipeline.render_artifacts(&outcome, &context()).unwrap();

    assert!(artifacts.charts.is_empty());
    assert_eq!(artifacts.notices.len(), 4);
    assert!(artifacts.notices[0].starts_with("Some charts could not be drawn"));
    assert!(!artifacts.pdf.placeholder);
    assert!(artifacts.csv.is_some());
}

#[tokio::test]
async fn test_fetched_events_table_keeps_every_event() {
    let mut events: Vec<RawEvent> = (0..TABLE_ROW_LIMIT + 2)
        .map(|i| raw_event("same", mock_timestamp(2024, 1, 2, 9, 0, 0) + chrono::Duration::seconds(i as i64)))
        .collect();
    events.insert(0, raw_event("outside", mock_timestamp(2024, 3, 1, 9, 0, 0)));
    let pipeline = InsightsPipeline::new(FakeSource::new(events), Localizer::new(Locale::English).unwrap());
    let key = ApiKey::parse("secret").unwrap();

    let outcome = pipeline.run(&key, &request(), Utc::now()).await.unwrap();
    assert_eq!(outcome.table.rows.len(), 1);
    assert_eq!(outcome.events.total_rows, TABLE_ROW_LIMIT + 3);
    assert_eq!(outcome.events.rows.len(), TABLE_ROW_LIMIT);
    assert_eq!(outcome.events.rows[0].visitor_id.as_deref(), Some("outside"));

    let artifacts = pipeline.render_artifacts(&outcome, &context()).unwrap();
    let csv = String::from_utf8(artifacts.events_csv.unwrap()).unwrap();
    assert_eq!(csv.lines().count(), TABLE_ROW_LIMIT + 1);
    assert_eq!(
        artifacts.notices,
        vec![format!("Fetched events: showing {TABLE_ROW_LIMIT} of {} rows.", TABLE_ROW_LIMIT + 3)]
    );
}
