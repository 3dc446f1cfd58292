//! Default values.

use crate::schema::{AnalysisConfig, ApiConfig, Config, ExportConfig};
use blip_common::{blip::DEFAULT_BASE_URL, LoggingConfig};
use std::path::PathBuf;

/// Default analysis timezone.
pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";
/// Default tracked flow action.
pub const DEFAULT_FLOW: &str = "Início";
/// Default trailing period in days.
pub const DEFAULT_DAYS: u32 = 30;
/// Longest accepted trailing period.
pub const MAX_DAYS: u32 = 365;
/// Default business hours start.
pub const DEFAULT_BUSINESS_START: &str = "09:00";
/// Default business hours end.
pub const DEFAULT_BUSINESS_END: &str = "18:00";
/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "blip-insights-output";
/// Default label language.
pub const DEFAULT_LANGUAGE: &str = "en-US";

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            analysis: AnalysisConfig::default(),
            export: ExportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 45,
            page_size: 500,
            max_events: 10_000,
            rate_limit_per_sec: 5,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            flow: DEFAULT_FLOW.to_string(),
            days: DEFAULT_DAYS,
            timezone: DEFAULT_TIMEZONE.to_string(),
            business_start: DEFAULT_BUSINESS_START.to_string(),
            business_end: DEFAULT_BUSINESS_END.to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            language: DEFAULT_LANGUAGE.to_string(),
            chart_width: 1024,
            chart_height: 480,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_defaults_match_client_defaults() {
        let api = ApiConfig::default();
        assert_eq!(api.client_config(), blip_common::BlipConfig::default());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }
}
