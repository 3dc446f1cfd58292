//! Message identifiers and typed accessors.

use crate::loader::Localizer;
use chrono::Weekday;

/// Fluent message identifiers.
#[allow(missing_docs)]
pub mod ids {
    pub const REPORT_TITLE: &str = "report-title";
    pub const REPORT_FLOW: &str = "report-flow";
    pub const REPORT_GENERATED: &str = "report-generated";
    pub const REPORT_NO_DATA: &str = "report-no-data";
    pub const REPORT_NO_DATA_HINT: &str = "report-no-data-hint";
    pub const REPORT_RENDER_NOTICE: &str = "report-render-notice";
    pub const REPORT_PDF_NOTICE: &str = "report-pdf-notice";
    pub const REPORT_CSV_NOTICE: &str = "report-csv-notice";

    pub const SUMMARY_TITLE: &str = "summary-title";
    pub const SUMMARY_TOTAL: &str = "summary-total";
    pub const SUMMARY_IN_HOURS: &str = "summary-in-hours";
    pub const SUMMARY_OUT_HOURS: &str = "summary-out-hours";
    pub const SUMMARY_PEAK_HOUR: &str = "summary-peak-hour";
    pub const SUMMARY_PEAK_WEEKDAY: &str = "summary-peak-weekday";
    pub const SUMMARY_NO_PEAK: &str = "summary-no-peak";
    pub const SUMMARY_WINDOW: &str = "summary-window";
    pub const SUMMARY_BUSINESS_HOURS: &str = "summary-business-hours";
    pub const SUMMARY_SKIPPED: &str = "summary-skipped";

    pub const CHART_BUSINESS_TITLE: &str = "chart-business-title";
    pub const CHART_WEEKLY_TITLE: &str = "chart-weekly-title";
    pub const CHART_WEEKDAY_TITLE: &str = "chart-weekday-title";
    pub const CHART_HOURLY_TITLE: &str = "chart-hourly-title";
    pub const AXIS_VISITORS: &str = "axis-visitors";
    pub const AXIS_BUSINESS: &str = "axis-business";
    pub const AXIS_WEEK: &str = "axis-week";
    pub const AXIS_WEEKDAY: &str = "axis-weekday";
    pub const AXIS_HOUR: &str = "axis-hour";
    pub const SERIES_IN_HOURS: &str = "series-in-hours";
    pub const SERIES_OUT_HOURS: &str = "series-out-hours";
    pub const WEEK_LABEL: &str = "week-label";

    pub const TABLE_TITLE: &str = "table-title";
    pub const EVENTS_TABLE_TITLE: &str = "events-table-title";
    pub const TABLE_TRUNCATED: &str = "table-truncated";

    pub const WEEKDAY_MON: &str = "weekday-mon";
    pub const WEEKDAY_TUE: &str = "weekday-tue";
    pub const WEEKDAY_WED: &str = "weekday-wed";
    pub const WEEKDAY_THU: &str = "weekday-thu";
    pub const WEEKDAY_FRI: &str = "weekday-fri";
    pub const WEEKDAY_SAT: &str = "weekday-sat";
    pub const WEEKDAY_SUN: &str = "weekday-sun";

    /// Every identifier, for completeness checks.
    pub const ALL: &[&str] = &[
        REPORT_TITLE,
        REPORT_FLOW,
        REPORT_GENERATED,
        REPORT_NO_DATA,
        REPORT_NO_DATA_HINT,
        REPORT_RENDER_NOTICE,
        REPORT_PDF_NOTICE,
        REPORT_CSV_NOTICE,
        SUMMARY_TITLE,
        SUMMARY_TOTAL,
        SUMMARY_IN_HOURS,
        SUMMARY_OUT_HOURS,
        SUMMARY_PEAK_HOUR,
        SUMMARY_PEAK_WEEKDAY,
        SUMMARY_NO_PEAK,
        SUMMARY_WINDOW,
        SUMMARY_BUSINESS_HOURS,
        SUMMARY_SKIPPED,
        CHART_BUSINESS_TITLE,
        CHART_WEEKLY_TITLE,
        CHART_WEEKDAY_TITLE,
        CHART_HOURLY_TITLE,
        AXIS_VISITORS,
        AXIS_BUSINESS,
        AXIS_WEEK,
        AXIS_WEEKDAY,
        AXIS_HOUR,
        SERIES_IN_HOURS,
        SERIES_OUT_HOURS,
        WEEK_LABEL,
        TABLE_TITLE,
        EVENTS_TABLE_TITLE,
        TABLE_TRUNCATED,
        WEEKDAY_MON,
        WEEKDAY_TUE,
        WEEKDAY_WED,
        WEEKDAY_THU,
        WEEKDAY_FRI,
        WEEKDAY_SAT,
        WEEKDAY_SUN,
    ];
}

/// Message id of a weekday's short name
pub const fn weekday_id(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => ids::WEEKDAY_MON,
        Weekday::Tue => ids::WEEKDAY_TUE,
        Weekday::Wed => ids::WEEKDAY_WED,
        Weekday::Thu => ids::WEEKDAY_THU,
        Weekday::Fri => ids::WEEKDAY_FRI,
        Weekday::Sat => ids::WEEKDAY_SAT,
        Weekday::Sun => ids::WEEKDAY_SUN,
    }
}

impl Localizer {
    /// Short weekday name
    pub fn weekday(&self, day: Weekday) -> String {
        self.text(weekday_id(day))
    }

    /// ISO week label, e.g. `2024-W01`
    pub fn week(&self, iso_year: i32, week: u32) -> String {
        self.text_with(
            ids::WEEK_LABEL,
            &[("year", iso_year.to_string()), ("week", format!("{week:02}"))],
        )
    }

    /// "In business hours: N (P%)"
    pub fn in_hours_line(&self, count: u64, percent: f64) -> String {
        self.text_with(
            ids::SUMMARY_IN_HOURS,
            &[("count", count.to_string()), ("percent", format!("{percent:.1}"))],
        )
    }

    /// "Outside business hours: N (P%)"
    pub fn out_hours_line(&self, count: u64, percent: f64) -> String {
        self.text_with(
            ids::SUMMARY_OUT_HOURS,
            &[("count", count.to_string()), ("percent", format!("{percent:.1}"))],
        )
    }

    /// Total line of the summary
    pub fn total_line(&self, count: u64) -> String {
        self.text_with(ids::SUMMARY_TOTAL, &[("count", count.to_string())])
    }

    /// Peak hour line, `None` when there is no data
    pub fn peak_hour_line(&self, hour: Option<u32>) -> String {
        match hour {
            Some(h) => self.text_with(ids::SUMMARY_PEAK_HOUR, &[("hour", format!("{h:02}:00"))]),
            None => self.text(ids::SUMMARY_NO_PEAK),
        }
    }

    /// Peak weekday line, `None` when there is no data
    pub fn peak_weekday_line(&self, day: Option<Weekday>) -> String {
        match day {
            Some(d) => self.text_with(ids::SUMMARY_PEAK_WEEKDAY, &[("weekday", self.weekday(d))]),
            None => self.text(ids::SUMMARY_NO_PEAK),
        }
    }

    /// Truncation notice of a table, named by its title message id
    pub fn table_truncated(&self, table_id: &str, shown: usize, total: usize) -> String {
        self.text_with(
            ids::TABLE_TRUNCATED,
            &[
                ("table", self.text(table_id)),
                ("shown", shown.to_string()),
                ("total", total.to_string()),
            ],
        )
    }

    /// A CSV table that could not be serialized
    pub fn csv_notice(&self, table_id: &str, reason: &str) -> String {
        self.text_with(
            ids::REPORT_CSV_NOTICE,
            &[("table", self.text(table_id)), ("reason", reason.to_string())],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;

    #[test]
    fn test_every_id_exists_in_every_locale() {
        for locale in Locale::all() {
            let localizer = Localizer::new(locale).unwrap();
            for id in ids::ALL {
                assert!(localizer.has_message(id), "{id} missing in {locale}");
            }
        }
    }

    #[test]
    fn test_weekday_names() {
        let en = Localizer::new(Locale::English).unwrap();
        let pt = Localizer::new(Locale::Portuguese).unwrap();
        assert_eq!(en.weekday(Weekday::Mon), "Mon");
        assert_eq!(pt.weekday(Weekday::Sat), "Sáb");
    }

    #[test]
    fn test_week_label_zero_pads() {
        let en = Localizer::new(Locale::English).unwrap();
        assert_eq!(en.week(2025, 1), "2025-W01");
        assert_eq!(en.week(2024, 52), "2024-W52");
    }

    #[test]
    fn test_summary_lines() {
        let en = Localizer::new(Locale::English).unwrap();
        assert_eq!(en.in_hours_line(3, 75.0), "In business hours: 3 (75.0%)");
        assert_eq!(en.peak_hour_line(Some(9)), "Peak hour: 09:00");
        assert_eq!(en.peak_hour_line(None), "Peak: not available");
        assert_eq!(
            en.table_truncated(ids::TABLE_TITLE, 5000, 5200),
            "First contacts: showing 5000 of 5200 rows."
        );
    }

    #[test]
    fn test_export_notices_name_what_failed() {
        let en = Localizer::new(Locale::English).unwrap();
        assert_eq!(
            en.csv_notice(ids::EVENTS_TABLE_TITLE, "disk full"),
            "The \"Fetched events\" CSV could not be written: disk full"
        );
        let pdf = en.text_with(ids::REPORT_PDF_NOTICE, &[("reason", "layout".to_string())]);
        assert!(pdf.starts_with("The full PDF report could not be drawn"));
        assert!(!pdf.contains("charts"));
    }
}
