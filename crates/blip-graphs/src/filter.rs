//! Analysis period, timezone and business hours of one interaction.

use blip_common::{InsightsError, Result};
use blip_config::{parse_hhmm, parse_timezone, AnalysisConfig, MAX_DAYS};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;

/// Period to analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// The trailing `n` days up to now.
    LastDays(u32),
    /// UTC calendar dates, both inclusive.
    Range {
        /// First day.
        start: NaiveDate,
        /// Last day, included up to 23:59:59.
        end: NaiveDate,
    },
}

/// Local time-of-day window counted as "in business hours".
///
/// Half-open: `start` is in, `end` is out. When `start > end` the window
/// wraps past midnight; `start == end` is an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusinessHours {
    /// Opening time.
    pub start: NaiveTime,
    /// Closing time.
    pub end: NaiveTime,
}

impl BusinessHours {
    /// Create a window from two times
    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse `HH:MM` bounds
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            start: parse_hhmm("business_start", start)?,
            end: parse_hhmm("business_end", end)?,
        })
    }

    /// Whether a local time of day falls inside the window
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start == self.end {
            false
        } else if self.start < self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl fmt::Display for BusinessHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Resolved UTC bounds of a period, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    /// First instant.
    pub start: DateTime<Utc>,
    /// Last instant.
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Whether `instant` lies in the window
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// Local calendar dates touched by the window, in order
    pub fn local_dates(&self, timezone: &Tz) -> Vec<NaiveDate> {
        let first = self.start.with_timezone(timezone).date_naive();
        let last = self.end.with_timezone(timezone).date_naive();
        first.iter_days().take_while(|d| *d <= last).collect()
    }
}

/// Last calendar year a range may reach
pub const MAX_YEAR: i32 = 9999;

fn last_instant_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

/// Filter configuration of one interaction. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Period to analyze.
    pub period: Period,
    /// Analysis timezone.
    pub timezone: Tz,
    /// Business hours in the analysis timezone.
    pub business_hours: BusinessHours,
}

impl FilterConfig {
    /// Create a filter, rejecting empty, inverted or over-long periods
    pub fn new(period: Period, timezone: Tz, business_hours: BusinessHours) -> Result<Self> {
        match period {
            Period::LastDays(0) => {
                return Err(InsightsError::validation_field("the period must cover at least one day", "days"));
            }
            Period::LastDays(days) if days > MAX_DAYS => {
                return Err(InsightsError::validation_field(
                    format!("the period may cover at most {MAX_DAYS} days, got {days}"),
                    "days",
                ));
            }
            Period::Range { start, end } if start.year() < 1 || end.year() > MAX_YEAR => {
                return Err(InsightsError::validation_field(
                    format!("{start} to {end} is outside the supported calendar (years 1 to {MAX_YEAR})"),
                    "period",
                ));
            }
            Period::Range { start, end } if start > end => {
                return Err(InsightsError::validation_field(
                    format!("start date {start} is after end date {end}"),
                    "period",
                ));
            }
            Period::Range { start, end } if end.signed_duration_since(start).num_days() >= i64::from(MAX_DAYS) => {
                return Err(InsightsError::validation_field(
                    format!("{start} to {end} spans more than {MAX_DAYS} days"),
                    "period",
                ));
            }
            _ => {}
        }
        Ok(Self {
            period,
            timezone,
            business_hours,
        })
    }

    /// Filter from configured analysis defaults, with an explicit period
    pub fn from_analysis(analysis: &AnalysisConfig, period: Period) -> Result<Self> {
        Self::new(
            period,
            parse_timezone(&analysis.timezone)?,
            BusinessHours::parse(&analysis.business_start, &analysis.business_end)?,
        )
    }

    /// Resolve the period against `now`
    pub fn window(&self, now: DateTime<Utc>) -> TimeWindow {
        match self.period {
            Period::LastDays(days) => TimeWindow {
                start: now
                    .checked_sub_signed(Duration::days(i64::from(days)))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
                end: now,
            },
            Period::Range { start, end } => TimeWindow {
                start: start.and_time(NaiveTime::MIN).and_utc(),
                end: end.and_time(last_instant_of_day()).and_utc(),
            },
        }
    }

    /// Whether a UTC instant is in business hours once converted to local time
    pub fn is_business(&self, instant: DateTime<Utc>) -> bool {
        self.business_hours
            .contains(instant.with_timezone(&self.timezone).time())
    }
}
