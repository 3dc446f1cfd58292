//! Temporal aggregation of first-contact rows.
//!
//! Every view classifies each row as in or out of business hours after
//! converting its UTC instant to the analysis timezone, so all views sum to
//! the number of rows.

use crate::filter::{FilterConfig, TimeWindow};
use crate::types::{HourBucket, IsoWeekBucket, NormalizedRow, SplitCount, TemporalAggregates, WeekdayBucket};
use chrono::{Datelike, Timelike, Weekday};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Weekdays in display order
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Trait for aggregating rows into one view
pub trait DataAggregator<T> {
    /// Aggregate `rows` under `filter`
    fn aggregate(&self, rows: &[NormalizedRow], filter: &FilterConfig) -> T;
}

/// In/out business hours split
#[derive(Debug, Clone, Copy, Default)]
pub struct BusinessHoursAggregator;

impl DataAggregator<SplitCount> for BusinessHoursAggregator {
    #[instrument(skip_all, fields(rows = rows.len()))]
    fn aggregate(&self, rows: &[NormalizedRow], filter: &FilterConfig) -> SplitCount {
        let mut split = SplitCount::default();
        for row in rows {
            split.record(filter.is_business(row.timestamp));
        }
        debug!("Aggregated {} visitors into business hours split", split.total());
        split
    }
}

/// Per ISO week, zero-filled across the window when one is given
#[derive(Debug, Clone, Copy, Default)]
pub struct IsoWeekAggregator {
    window: Option<TimeWindow>,
}

impl IsoWeekAggregator {
    /// Aggregator that only emits weeks containing rows
    pub const fn new() -> Self {
        Self { window: None }
    }

    /// Aggregator that emits every week overlapping `window`
    pub const fn with_window(window: TimeWindow) -> Self {
        Self { window: Some(window) }
    }
}

impl DataAggregator<Vec<IsoWeekBucket>> for IsoWeekAggregator {
    #[instrument(skip_all, fields(rows = rows.len()))]
    fn aggregate(&self, rows: &[NormalizedRow], filter: &FilterConfig) -> Vec<IsoWeekBucket> {
        let mut weeks: BTreeMap<(i32, u32), SplitCount> = BTreeMap::new();

        if let Some(window) = &self.window {
            for date in window.local_dates(&filter.timezone) {
                let iso = date.iso_week();
                weeks.entry((iso.year(), iso.week())).or_default();
            }
        }

        for row in rows {
            let iso = row.local_time(&filter.timezone).iso_week();
            weeks
                .entry((iso.year(), iso.week()))
                .or_default()
                .record(filter.is_business(row.timestamp));
        }

        let result: Vec<IsoWeekBucket> = weeks
            .into_iter()
            .map(|((iso_year, week), counts)| IsoWeekBucket {
                iso_year,
                week,
                counts,
            })
            .collect();

        debug!("Aggregated {} ISO week buckets", result.len());
        result
    }
}

/// Per weekday, Monday first
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekdayAggregator;

impl DataAggregator<Vec<WeekdayBucket>> for WeekdayAggregator {
    #[instrument(skip_all, fields(rows = rows.len()))]
    fn aggregate(&self, rows: &[NormalizedRow], filter: &FilterConfig) -> Vec<WeekdayBucket> {
        let mut counts = [SplitCount::default(); 7];
        for row in rows {
            let index = row.local_time(&filter.timezone).weekday().num_days_from_monday() as usize;
            counts[index].record(filter.is_business(row.timestamp));
        }

        WEEKDAYS
            .iter()
            .zip(counts)
            .map(|(&weekday, counts)| WeekdayBucket { weekday, counts })
            .collect()
    }
}

/// Per hour of the day, 0 to 23
#[derive(Debug, Clone, Copy, Default)]
pub struct HourOfDayAggregator;

impl DataAggregator<Vec<HourBucket>> for HourOfDayAggregator {
    #[instrument(skip_all, fields(rows = rows.len()))]
    fn aggregate(&self, rows: &[NormalizedRow], filter: &FilterConfig) -> Vec<HourBucket> {
        let mut counts = [SplitCount::default(); 24];
        for row in rows {
            let hour = row.local_time(&filter.timezone).hour() as usize;
            counts[hour].record(filter.is_business(row.timestamp));
        }

        (0u32..)
            .zip(counts)
            .map(|(hour, counts)| HourBucket { hour, counts })
            .collect()
    }
}

/// Runs all four views
#[derive(Debug, Clone, Copy)]
pub struct TemporalAggregator {
    window: TimeWindow,
}

impl TemporalAggregator {
    /// Aggregator for rows of `window`
    pub const fn new(window: TimeWindow) -> Self {
        Self { window }
    }

    /// Compute the business, weekly, weekday and hourly views
    #[instrument(skip_all, fields(rows = rows.len()))]
    pub fn aggregate(&self, rows: &[NormalizedRow], filter: &FilterConfig) -> TemporalAggregates {
        let aggregates = TemporalAggregates {
            total: rows.len() as u64,
            business: BusinessHoursAggregator.aggregate(rows, filter),
            weekly: IsoWeekAggregator::with_window(self.window).aggregate(rows, filter),
            weekday: WeekdayAggregator.aggregate(rows, filter),
            hourly: HourOfDayAggregator.aggregate(rows, filter),
        };
        debug!(
            total = aggregates.total,
            in_hours = aggregates.business.in_hours,
            weeks = aggregates.weekly.len(),
            "Temporal aggregation complete"
        );
        aggregates
    }
}
