//! Test utilities and shared test helpers for BLiP Insights.
//!
//! Fixtures for raw events and configuration, plus proptest strategies used
//! by the invariant tests of the analysis crates.

use crate::blip::RawEvent;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialize logging for tests.
/// Safe to call multiple times; only the first call installs a subscriber.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(filter)
            .try_init();
    });
}

/// Test fixture for creating a UTC timestamp.
pub fn mock_timestamp(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .single()
        .expect("valid fixture timestamp")
}

/// Raw event fixtures in the shapes the platform actually sends.
pub mod event_fixtures {
    use super::*;

    /// Event with a contact object and a storage date.
    pub fn raw_event(identity: &str, storage_date: DateTime<Utc>) -> RawEvent {
        RawEvent {
            storage_date: Some(storage_date.to_rfc3339()),
            contact: Some(json!({ "identity": identity })),
            category: Some("flow".to_string()),
            action: Some("Início".to_string()),
            ..RawEvent::default()
        }
    }

    /// Event whose contact arrives as a single-quoted JSON-ish string.
    pub fn raw_event_with_string_contact(identity: &str, storage_date: &str) -> RawEvent {
        RawEvent {
            storage_date: Some(storage_date.to_string()),
            contact: Some(json!(format!("{{'Identity': '{identity}', 'name': 'Visitor'}}"))),
            ..RawEvent::default()
        }
    }

    /// Event carrying only `eventDate` and `from`.
    pub fn raw_event_from_sender(from: &str, event_date: &str) -> RawEvent {
        RawEvent {
            event_date: Some(event_date.to_string()),
            from: Some(from.to_string()),
            ..RawEvent::default()
        }
    }

    /// `count` distinct visitors, one event each, one minute apart.
    pub fn distinct_visitors(count: usize, start: DateTime<Utc>) -> Vec<RawEvent> {
        (0..count)
            .map(|i| {
                let minutes = i64::try_from(i).unwrap_or(i64::MAX);
                raw_event(
                    &format!("visitor-{i}@wa.gw.msging.net"),
                    start + chrono::Duration::minutes(minutes),
                )
            })
            .collect()
    }
}

/// Configuration-related test utilities.
pub mod config_fixtures {
    /// Create a minimal valid configuration as YAML string.
    pub fn minimal_config_yaml() -> &'static str {
        r#"
api:
  base_url: "https://http.msging.net"

analysis:
  flow: "Início"
  timezone: "America/Sao_Paulo"
"#
    }

    /// Create a full configuration as YAML string.
    pub fn full_config_yaml() -> &'static str {
        concat!(
            "api:\n",
            "  base_url: \"http://localhost:8080\"\n",
            "  timeout_secs: 20\n",
            "  page_size: 250\n",
            "  max_events: 5000\n",
            "  rate_limit_per_sec: 2\n",
            "\n",
            "analysis:\n",
            "  flow: \"Boas-vindas\"\n",
            "  days: 14\n",
            "  timezone: \"Europe/Lisbon\"\n",
            "  business_start: \"08:30\"\n",
            "  business_end: \"17:30\"\n",
            "\n",
            "export:\n",
            "  output_dir: \"reports\"\n",
            "  language: \"pt-BR\"\n",
            "  chart_width: 1000\n",
            "  chart_height: 500\n",
            "\n",
            "logging:\n",
            "  level: \"debug\"\n",
            "  format: \"compact\"\n"
        )
    }
}

/// Property-based testing utilities using proptest.
#[cfg(feature = "proptest")]
pub mod property_testing {
    use super::*;
    use proptest::prelude::*;

    /// Visitors drawn from a small pool so duplicates are frequent.
    pub fn identity_strategy() -> impl Strategy<Value = String> {
        (0u8..24).prop_map(|n| format!("visitor-{n}@wa.gw.msging.net"))
    }

    /// Timestamps spread over January 2024.
    pub fn january_timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
        (0i64..31 * 24 * 3600).prop_map(|secs| mock_timestamp(2024, 1, 1, 0, 0, 0) + chrono::Duration::seconds(secs))
    }

    /// Any instant between 1970 and 2100.
    pub fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
        (0i64..4_102_444_800).prop_map(|secs| {
            DateTime::from_timestamp(secs, 0).unwrap_or_else(|| mock_timestamp(2024, 1, 1, 0, 0, 0))
        })
    }

    /// Batches of raw events with repeated visitors.
    pub fn raw_events_strategy(max_len: usize) -> impl Strategy<Value = Vec<RawEvent>> {
        prop::collection::vec((identity_strategy(), january_timestamp_strategy()), 0..max_len).prop_map(
            |pairs| {
                pairs
                    .into_iter()
                    .map(|(identity, ts)| event_fixtures::raw_event(&identity, ts))
                    .collect()
            },
        )
    }
}
