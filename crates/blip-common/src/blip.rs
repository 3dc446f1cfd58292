//! BLiP command API client with rate limiting
//!
//! Fetches event-track records of a bot flow through the analytics
//! postmaster, following `$skip`/`$take` pagination. Failures are surfaced
//! to the caller as-is; nothing is retried and partial pages are discarded.

use crate::error::{InsightsError, Result};
use crate::types::{ApiKey, FlowId};
use crate::utils::to_iso_z;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use tracing::{debug, info, instrument, warn};

/// Default command endpoint host
pub const DEFAULT_BASE_URL: &str = "https://http.msging.net";

/// Recipient of event-track queries
pub const ANALYTICS_POSTMASTER: &str = "postmaster@analytics.msging.net";

/// Configuration for the BLiP API client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlipConfig {
    /// Base URL of the command API (e.g. "https://http.msging.net")
    pub base_url: String,
    /// Request timeout in seconds (default: 45)
    pub timeout_secs: u64,
    /// Events requested per page (`$take`, default: 500)
    pub page_size: u32,
    /// Stop paginating once this many events were collected (default: 10 000)
    pub max_events: usize,
    /// Rate limit: requests per second (default: 5)
    pub rate_limit_per_sec: u32,
    /// Connection pool max idle connections per host (default: 4)
    pub max_idle_per_host: usize,
}

impl Default for BlipConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 45,
            page_size: 500,
            max_events: 10_000,
            rate_limit_per_sec: 5,
            max_idle_per_host: 4,
        }
    }
}

impl BlipConfig {
    /// Create a configuration pointing at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the collection cap
    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    /// Set the rate limit
    pub fn with_rate_limit(mut self, rate_limit_per_sec: u32) -> Self {
        self.rate_limit_per_sec = rate_limit_per_sec;
        self
    }

    /// Set the connection pool size
    pub fn with_pool_size(mut self, max_idle_per_host: usize) -> Self {
        self.max_idle_per_host = max_idle_per_host;
        self
    }
}

/// What to fetch: a flow action over an inclusive UTC window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Tracked flow action
    pub flow: FlowId,
    /// Window start (inclusive)
    pub start: DateTime<Utc>,
    /// Window end (inclusive)
    pub end: DateTime<Utc>,
}

impl EventQuery {
    /// Build a query, rejecting inverted windows.
    pub fn new(flow: FlowId, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(InsightsError::validation_field(
                format!("start {start} is after end {end}"),
                "period",
            ));
        }
        Ok(Self { flow, start, end })
    }
}

/// Source of raw flow events.
///
/// The pipeline depends on this trait rather than on [`BlipClient`] so it can
/// be driven by fixtures in tests.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch every event of `query`, or fail without partial results.
    async fn fetch_events(&self, key: &ApiKey, query: &EventQuery) -> Result<Vec<RawEvent>>;
}

/// BLiP API client with connection pooling and rate limiting
#[derive(Debug, Clone)]
pub struct BlipClient {
    client: Client,
    config: BlipConfig,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl BlipClient {
    /// Create a new client with the given configuration
    pub fn new(config: BlipConfig) -> Result<Self> {
        url::Url::parse(&config.base_url).map_err(|e| {
            InsightsError::config_with_source(format!("Invalid API base URL '{}'", config.base_url), e)
        })?;
        if config.page_size == 0 {
            return Err(InsightsError::config("Page size must be greater than 0"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()
            .map_err(|e| InsightsError::network_with_source("Failed to create HTTP client", e))?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.rate_limit_per_sec)
                .ok_or_else(|| InsightsError::config("Rate limit must be greater than 0"))?,
        );
        let rate_limiter = Arc::new(DefaultDirectRateLimiter::direct(quota));

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Create a new client against the public endpoint
    pub fn with_defaults() -> Result<Self> {
        Self::new(BlipConfig::default())
    }

    fn commands_url(&self) -> String {
        format!("{}/commands", self.config.base_url.trim_end_matches('/'))
    }

    /// Build the event-track command for one page
    fn page_command(&self, query: &EventQuery, skip: usize) -> Command {
        let uri = format!(
            "/event-track/flow/{}?$take={}&$skip={}&startDate={}&endDate={}",
            urlencoding::encode(query.flow.as_str()),
            self.config.page_size,
            skip,
            to_iso_z(query.start),
            to_iso_z(query.end),
        );
        Command {
            id: format!("get-events-{}-{}", query.flow, skip),
            to: ANALYTICS_POSTMASTER.to_string(),
            method: "get".to_string(),
            uri,
        }
    }

    /// Send one command and decode its envelope
    #[instrument(skip(self, key, command), fields(id = %command.id))]
    async fn send_command(&self, key: &ApiKey, command: &Command) -> Result<CommandResponse> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .post(self.commands_url())
            .header(reqwest::header::AUTHORIZATION, format!("Key {}", key.expose()))
            .json(command)
            .send()
            .await?;

        let status = response.status();
        debug!(%status, "Command answered");

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(InsightsError::authentication_with_status(
                format!("API returned {status}"),
                status.as_u16(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InsightsError::api_with_status(
                format!("API returned {status}: {}", crate::utils::truncate_string(body.trim(), 200)),
                status.as_u16(),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| InsightsError::network_with_source("Failed to read response body", e))?;
        let envelope: CommandResponse = serde_json::from_str(&text)?;
        envelope.into_result()
    }

    /// Fetch every event of a flow within a window.
    ///
    /// Pages are requested until one comes back empty or `max_events` is
    /// reached. Any failure aborts the whole fetch.
    #[instrument(skip(self, key), fields(flow = %query.flow, start = %query.start, end = %query.end))]
    pub async fn fetch_flow_events(&self, key: &ApiKey, query: &EventQuery) -> Result<Vec<RawEvent>> {
        let mut collected: Vec<RawEvent> = Vec::new();
        let mut skip = 0usize;

        loop {
            let command = self.page_command(query, skip);
            let page = self.send_command(key, &command).await?;
            let items = page.resource.map(|r| r.items).unwrap_or_default();
            debug!(received = items.len(), total = collected.len() + items.len(), skip, "Fetched page");

            if items.is_empty() {
                break;
            }
            collected.extend(items);

            if collected.len() >= self.config.max_events {
                warn!(
                    max_events = self.config.max_events,
                    "Event cap reached, remaining pages are not fetched"
                );
                collected.truncate(self.config.max_events);
                break;
            }
            skip += self.config.page_size as usize;
        }

        info!(events = collected.len(), "Fetched flow events");
        Ok(collected)
    }

    /// Get metrics about the client configuration and state
    pub fn get_client_metrics(&self) -> ClientMetrics {
        ClientMetrics {
            base_url: self.config.base_url.clone(),
            timeout_secs: self.config.timeout_secs,
            page_size: self.config.page_size,
            max_events: self.config.max_events,
            rate_limit_per_sec: self.config.rate_limit_per_sec,
            has_rate_limit_capacity: self.rate_limiter.check().is_ok(),
        }
    }
}

#[async_trait]
impl EventSource for BlipClient {
    async fn fetch_events(&self, key: &ApiKey, query: &EventQuery) -> Result<Vec<RawEvent>> {
        self.fetch_flow_events(key, query).await
    }
}

/// Client metrics for debugging
#[derive(Debug, Clone, Serialize)]
pub struct ClientMetrics {
    /// Base URL being used
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Page size
    pub page_size: u32,
    /// Collection cap
    pub max_events: usize,
    /// Rate limit requests per second
    pub rate_limit_per_sec: u32,
    /// Whether we currently have rate limit capacity
    pub has_rate_limit_capacity: bool,
}

// ============================================================================
// Wire models
// ============================================================================

/// Command envelope posted to `/commands`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Request id, echoed back by the platform
    pub id: String,
    /// Recipient node
    pub to: String,
    /// Command method
    pub method: String,
    /// Resource URI including the query string
    pub uri: String,
}

/// Reason attached to failed commands
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Reason {
    /// Platform reason code
    #[serde(default)]
    pub code: Option<i64>,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
}

/// Response envelope of a command
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommandResponse {
    /// "success" or "failure"
    #[serde(default)]
    pub status: Option<String>,
    /// Page of events
    #[serde(default)]
    pub resource: Option<EventTrackPage>,
    /// Present on failures
    #[serde(default)]
    pub reason: Option<Reason>,
}

impl CommandResponse {
    /// Check if the response indicates success
    pub fn is_success(&self) -> bool {
        !matches!(self.status.as_deref(), Some(s) if s.eq_ignore_ascii_case("failure"))
    }

    fn into_result(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let reason = self.reason.unwrap_or_default();
        let description = reason
            .description
            .unwrap_or_else(|| "command failed without a reason".to_string());
        if description.to_ascii_lowercase().contains("unauthorized") {
            return Err(InsightsError::authentication(description));
        }
        match reason.code {
            Some(code) => Err(InsightsError::api(format!("{description} (code {code})"))),
            None => Err(InsightsError::api(description)),
        }
    }
}

/// One page of event-track records
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventTrackPage {
    /// Total reported by the platform, if any
    #[serde(default)]
    pub total: Option<u64>,
    /// The records
    #[serde(default, deserialize_with = "lenient_items")]
    pub items: Vec<RawEvent>,
}

/// Records that are not JSON objects become empty events, so the normalizer
/// counts them as skipped instead of the whole page failing to decode.
fn lenient_items<'de, D>(deserializer: D) -> std::result::Result<Vec<RawEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).unwrap_or_else(|err| {
                debug!(error = %err, "Undecodable event record kept as empty");
                RawEvent::default()
            })
        })
        .collect())
}

/// Strings pass through, numbers and booleans keep their JSON text and
/// anything else reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Some(text),
        serde_json::Value::Number(number) => Some(number.to_string()),
        serde_json::Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    })
}

/// A raw event-track record, kept as loose as the platform sends it
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// When the platform stored the event
    #[serde(default, deserialize_with = "lenient_string")]
    pub storage_date: Option<String>,
    /// When the event happened, on some payloads only
    #[serde(default, deserialize_with = "lenient_string")]
    pub event_date: Option<String>,
    /// Contact object, or its JSON-ish string rendering
    #[serde(default)]
    pub contact: Option<serde_json::Value>,
    /// Sender node
    #[serde(default, deserialize_with = "lenient_string")]
    pub from: Option<String>,
    /// Event category
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    /// Event action
    #[serde(default, deserialize_with = "lenient_string")]
    pub action: Option<String>,
    /// Free-form extras
    #[serde(default)]
    pub extras: Option<serde_json::Value>,
    /// Everything else
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}
