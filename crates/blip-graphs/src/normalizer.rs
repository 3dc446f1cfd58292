//! Raw events to one first-contact row per visitor.

use crate::filter::TimeWindow;
use crate::types::{NormalizedRow, RowMetadata, SkipCounts};
use blip_common::{RawEvent, VisitorId};
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Last resort for contact strings that are neither JSON nor single-quoted JSON
static IDENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)["']identity["']\s*:\s*["']([^"']+)["']"#).expect("Invalid identity regex pattern")
});

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Rows and skip metrics of one normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedEvents {
    /// One row per visitor, chronological.
    pub rows: Vec<NormalizedRow>,
    /// Events that did not become rows.
    pub skipped: SkipCounts,
    /// Raw events seen.
    pub input_events: usize,
}

/// Turns raw events into first-contact rows for one window and timezone.
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    window: TimeWindow,
    timezone: Tz,
}

impl EventNormalizer {
    /// Create a normalizer
    pub const fn new(window: TimeWindow, timezone: Tz) -> Self {
        Self { window, timezone }
    }

    /// Normalize a batch of events.
    ///
    /// Events with no usable timestamp or visitor, or outside the window, are
    /// counted and dropped. Among the rest, each visitor keeps its earliest
    /// event; equal timestamps keep the event that came first in `events`.
    #[instrument(skip_all, fields(events = events.len()))]
    pub fn normalize(&self, events: &[RawEvent]) -> NormalizedEvents {
        let mut skipped = SkipCounts::default();
        let mut candidates = Vec::with_capacity(events.len());

        for event in events {
            let Some(timestamp) = event_timestamp(event) else {
                skipped.unparseable_timestamp += 1;
                continue;
            };
            let Some(visitor_id) = event_visitor(event) else {
                skipped.missing_visitor += 1;
                continue;
            };
            if !self.window.contains(timestamp) {
                skipped.out_of_window += 1;
                continue;
            }
            let metadata = RowMetadata {
                category: event.category.clone(),
                action: event.action.clone(),
            };
            candidates.push(NormalizedRow::new(visitor_id, timestamp, &self.timezone, metadata));
        }

        let before = candidates.len();
        let rows = deduplicate(candidates);
        skipped.duplicate = before - rows.len();

        debug!(
            rows = rows.len(),
            skipped = skipped.total(),
            "Normalized {} events into {} unique visitors",
            events.len(),
            rows.len()
        );
        NormalizedEvents {
            rows,
            skipped,
            input_events: events.len(),
        }
    }
}

/// Keep each visitor's earliest row, in chronological order.
///
/// The sort is stable, so equal timestamps keep their input order. Applying
/// this twice gives the same result as applying it once.
pub fn deduplicate(mut rows: Vec<NormalizedRow>) -> Vec<NormalizedRow> {
    rows.sort_by_key(|row| row.timestamp);
    let mut seen = HashSet::with_capacity(rows.len());
    rows.retain(|row| seen.insert(row.visitor_id.clone()));
    rows
}

/// Contact instant: `storageDate`, falling back to `eventDate`
pub fn event_timestamp(event: &RawEvent) -> Option<DateTime<Utc>> {
    event
        .storage_date
        .as_deref()
        .and_then(parse_timestamp)
        .or_else(|| event.event_date.as_deref().and_then(parse_timestamp))
}

/// Parse an ISO-8601 timestamp. Forms without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Visitor identity: `contact.identity`, falling back to `from`
pub fn event_visitor(event: &RawEvent) -> Option<VisitorId> {
    event
        .contact
        .as_ref()
        .and_then(extract_identity)
        .or_else(|| event.from.as_deref().and_then(VisitorId::new))
}

/// Identity from a contact object or a serialized contact string
pub fn extract_identity(contact: &Value) -> Option<VisitorId> {
    match contact {
        Value::Object(_) => identity_field(contact),
        Value::String(text) => serde_json::from_str::<Value>(text)
            .ok()
            .or_else(|| serde_json::from_str::<Value>(&text.replace('\'', "\"")).ok())
            .and_then(|parsed| identity_field(&parsed))
            .or_else(|| {
                IDENTITY_REGEX
                    .captures(text)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| VisitorId::new(m.as_str()))
            }),
        _ => None,
    }
}

fn identity_field(value: &Value) -> Option<VisitorId> {
    let object = value.as_object()?;
    ["identity", "Identity"]
        .iter()
        .find_map(|key| object.get(*key))
        .and_then(Value::as_str)
        .and_then(VisitorId::new)
}
