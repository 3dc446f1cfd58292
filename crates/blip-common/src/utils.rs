//! Shared utility functions.

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats a timestamp for display.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// ISO-8601 with a `Z` suffix at second precision, as the BLiP analytics
/// endpoint expects (`2024-01-01T00:00:00Z`).
pub fn to_iso_z(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Normalizes an API key as operators paste it: surrounding whitespace and
/// quotes are removed, as is a leading `Key ` scheme prefix.
pub fn sanitize_api_key(raw: &str) -> String {
    let mut key = raw.trim();
    if key.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("key ")) {
        key = key[4..].trim_start();
    }
    key.trim_matches(|c| c == '"' || c == '\'').trim().to_string()
}

/// Truncates a string to a maximum number of characters with ellipsis.
pub fn truncate_string(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        input.to_string()
    } else {
        let kept: String = input.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Percentage of `part` in `total`, `0.0` when `total` is zero.
#[allow(clippy::cast_precision_loss)]
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(timestamp), "2024-01-01 12:00:00 UTC");
    }

    #[test]
    fn test_to_iso_z() {
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 5, 23, 59, 59).unwrap();
        assert_eq!(to_iso_z(timestamp), "2024-03-05T23:59:59Z");
    }

    #[test]
    fn test_sanitize_api_key() {
        assert_eq!(sanitize_api_key("  abc123  "), "abc123");
        assert_eq!(sanitize_api_key("Key abc123"), "abc123");
        assert_eq!(sanitize_api_key("key   abc123"), "abc123");
        assert_eq!(sanitize_api_key("\"abc123\""), "abc123");
        assert_eq!(sanitize_api_key("'Key' "), "Key");
        assert_eq!(sanitize_api_key("Keyboard"), "Keyboard");
    }

    #[test]
    fn test_truncate_string() {
        let input = "This is a very long string that should be truncated";
        assert_eq!(truncate_string(input, 20), "This is a very lo...");
        assert_eq!(truncate_string("Short", 20), "Short");
        assert_eq!(truncate_string("ação ação ação", 8), "ação ...");
    }

    #[test]
    fn test_percentage() {
        assert!((percentage(1, 4) - 25.0).abs() < f64::EPSILON);
        assert!(percentage(3, 0).abs() < f64::EPSILON);
    }
}
