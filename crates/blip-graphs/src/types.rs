//! Data types shared by normalization, aggregation and export.

use blip_common::VisitorId;
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;

/// Optional event metadata carried through to the table view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowMetadata {
    /// Event category.
    pub category: Option<String>,
    /// Event action (the flow block).
    pub action: Option<String>,
}

/// One unique visitor's first contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRow {
    /// Visitor identity.
    pub visitor_id: VisitorId,
    /// First-contact instant.
    pub timestamp: DateTime<Utc>,
    /// Calendar date in the analysis timezone.
    pub date: NaiveDate,
    /// Event metadata.
    pub metadata: RowMetadata,
}

impl NormalizedRow {
    /// Build a row, deriving `date` in `timezone`
    pub fn new(visitor_id: VisitorId, timestamp: DateTime<Utc>, timezone: &Tz, metadata: RowMetadata) -> Self {
        Self {
            visitor_id,
            timestamp,
            date: timestamp.with_timezone(timezone).date_naive(),
            metadata,
        }
    }

    /// The first-contact instant in `timezone`
    pub fn local_time(&self, timezone: &Tz) -> DateTime<Tz> {
        self.timestamp.with_timezone(timezone)
    }
}

/// Why raw events did not become rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    /// No parseable `storageDate` or `eventDate`.
    pub unparseable_timestamp: usize,
    /// No identity in `contact` and no `from`.
    pub missing_visitor: usize,
    /// Timestamp outside the analysis window.
    pub out_of_window: usize,
    /// Later contact of an already counted visitor.
    pub duplicate: usize,
}

impl SkipCounts {
    /// Total skipped events
    pub const fn total(&self) -> usize {
        self.unparseable_timestamp + self.missing_visitor + self.out_of_window + self.duplicate
    }
}

/// Visitors inside and outside business hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SplitCount {
    /// In business hours.
    pub in_hours: u64,
    /// Outside business hours.
    pub out_hours: u64,
}

impl SplitCount {
    /// Count one visitor
    pub fn record(&mut self, in_business_hours: bool) {
        if in_business_hours {
            self.in_hours += 1;
        } else {
            self.out_hours += 1;
        }
    }

    /// Sum of both sides
    pub const fn total(&self) -> u64 {
        self.in_hours + self.out_hours
    }
}

/// Visitors of one ISO week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IsoWeekBucket {
    /// ISO week-numbering year.
    pub iso_year: i32,
    /// ISO week, 1..=53.
    pub week: u32,
    /// Counts.
    pub counts: SplitCount,
}

/// Visitors of one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekdayBucket {
    /// Weekday.
    pub weekday: Weekday,
    /// Counts.
    pub counts: SplitCount,
}

/// Visitors of one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourBucket {
    /// Hour, 0..=23.
    pub hour: u32,
    /// Counts.
    pub counts: SplitCount,
}

/// The four temporal views over the same set of rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemporalAggregates {
    /// Unique visitors.
    pub total: u64,
    /// In/out business hours.
    pub business: SplitCount,
    /// Per ISO week, chronological.
    pub weekly: Vec<IsoWeekBucket>,
    /// Monday first, always 7 buckets.
    pub weekday: Vec<WeekdayBucket>,
    /// Hours 0..=23, always 24 buckets.
    pub hourly: Vec<HourBucket>,
}

impl TemporalAggregates {
    /// Totals of the business, weekly, weekday and hourly views
    pub fn view_totals(&self) -> [u64; 4] {
        [
            self.business.total(),
            self.weekly.iter().map(|b| b.counts.total()).sum(),
            self.weekday.iter().map(|b| b.counts.total()).sum(),
            self.hourly.iter().map(|b| b.counts.total()).sum(),
        ]
    }

    /// Whether there is nothing to show
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blip_common::test_utils::mock_timestamp;

    #[test]
    fn test_row_date_follows_timezone() {
        let row = NormalizedRow::new(
            VisitorId::new("a").unwrap(),
            mock_timestamp(2024, 1, 1, 1, 0, 0),
            &Tz::America__Sao_Paulo,
            RowMetadata::default(),
        );
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_split_count() {
        let mut split = SplitCount::default();
        split.record(true);
        split.record(false);
        split.record(false);
        assert_eq!(split, SplitCount { in_hours: 1, out_hours: 2 });
        assert_eq!(split.total(), 3);
    }

    #[test]
    fn test_skip_counts_total() {
        let skipped = SkipCounts {
            unparseable_timestamp: 1,
            missing_visitor: 2,
            out_of_window: 3,
            duplicate: 4,
        };
        assert_eq!(skipped.total(), 10);
    }
}
