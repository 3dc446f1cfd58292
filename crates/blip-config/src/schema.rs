//! Configuration schema definitions.

use blip_common::{BlipConfig, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for BLiP Insights.
///
/// The API key is deliberately absent: it is supplied per run and never
/// written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// BLiP command API settings.
    pub api: ApiConfig,
    /// Analysis defaults (flow, period, timezone, business hours).
    pub analysis: AnalysisConfig,
    /// Output settings.
    pub export: ExportConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// BLiP command API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the command API.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Events requested per page.
    pub page_size: u32,
    /// Collection cap per run.
    pub max_events: usize,
    /// Client-side request rate limit.
    pub rate_limit_per_sec: u32,
}

impl ApiConfig {
    /// Client configuration for [`blip_common::BlipClient`].
    pub fn client_config(&self) -> BlipConfig {
        BlipConfig::new(self.base_url.clone())
            .with_timeout(self.timeout_secs)
            .with_page_size(self.page_size)
            .with_max_events(self.max_events)
            .with_rate_limit(self.rate_limit_per_sec)
    }
}

/// Analysis defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Flow action whose events count as a first contact.
    pub flow: String,
    /// Length of the trailing period in days.
    pub days: u32,
    /// IANA timezone name used for hour/weekday bucketing.
    pub timezone: String,
    /// Business hours start, HH:MM.
    pub business_start: String,
    /// Business hours end, HH:MM.
    pub business_end: String,
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving the PDF, CSV and SVG files.
    pub output_dir: PathBuf,
    /// Language tag for labels (e.g. "en-US", "pt-BR").
    pub language: String,
    /// SVG chart width in pixels.
    pub chart_width: u32,
    /// SVG chart height in pixels.
    pub chart_height: u32,
}
