//! Validation utilities and regex patterns

use crate::loader::ConfigError;
use crate::schema::Config;
use chrono::NaiveTime;
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

/// HH:MM on a 24-hour clock
pub static HHMM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("Invalid HH:MM regex pattern"));

/// Language tags of the form `ll-CC`
pub static LANGUAGE_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2}-[A-Z]{2}$").expect("Invalid language tag regex pattern"));

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(invalid("timezone", "timezone is empty"));
    }
    trimmed
        .parse::<Tz>()
        .map_err(|_| invalid("timezone", format!("unknown timezone '{trimmed}'")))
}

/// Parse a HH:MM time of day
pub fn parse_hhmm(field: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    let trimmed = value.trim();
    if !HHMM_REGEX.is_match(trimmed) {
        return Err(invalid(field, format!("'{trimmed}' is not a HH:MM time")));
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .map_err(|e| invalid(field, format!("'{trimmed}' is not a valid time: {e}")))
}

/// Validate an http(s) URL
pub fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| invalid(field, format!("'{value}' is not a URL: {e}")))?;
    if matches!(parsed.scheme(), "http" | "https") {
        Ok(())
    } else {
        Err(invalid(field, format!("unsupported scheme '{}'", parsed.scheme())))
    }
}

/// Validate a language tag such as `pt-BR`
pub fn validate_language(value: &str) -> Result<(), ConfigError> {
    if LANGUAGE_TAG_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(invalid("export.language", format!("'{value}' is not a language tag like en-US")))
    }
}

impl Config {
    /// Validate every section, reporting the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("api.base_url", &self.api.base_url)?;
        if self.api.timeout_secs == 0 {
            return Err(invalid("api.timeout_secs", "must be greater than 0"));
        }
        if !(1..=1000).contains(&self.api.page_size) {
            return Err(invalid("api.page_size", "must be between 1 and 1000"));
        }
        if self.api.max_events == 0 {
            return Err(invalid("api.max_events", "must be greater than 0"));
        }
        if self.api.rate_limit_per_sec == 0 {
            return Err(invalid("api.rate_limit_per_sec", "must be greater than 0"));
        }

        if self.analysis.flow.trim().is_empty() {
            return Err(invalid("analysis.flow", "flow is empty"));
        }
        if !(1..=crate::defaults::MAX_DAYS).contains(&self.analysis.days) {
            return Err(invalid(
                "analysis.days",
                format!("must be between 1 and {}", crate::defaults::MAX_DAYS),
            ));
        }
        parse_timezone(&self.analysis.timezone)?;
        parse_hhmm("analysis.business_start", &self.analysis.business_start)?;
        parse_hhmm("analysis.business_end", &self.analysis.business_end)?;

        validate_language(&self.export.language)?;
        if self.export.chart_width < 200 || self.export.chart_height < 150 {
            return Err(invalid("export.chart_width", "charts must be at least 200x150"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hhmm_regex() {
        assert!(HHMM_REGEX.is_match("00:00"));
        assert!(HHMM_REGEX.is_match("09:30"));
        assert!(HHMM_REGEX.is_match("23:59"));

        assert!(!HHMM_REGEX.is_match("24:00"));
        assert!(!HHMM_REGEX.is_match("9:30"));
        assert!(!HHMM_REGEX.is_match("09:60"));
        assert!(!HHMM_REGEX.is_match("0930"));
        assert!(!HHMM_REGEX.is_match(""));
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(
            parse_hhmm("start", "08:15").unwrap(),
            NaiveTime::from_hms_opt(8, 15, 0).unwrap()
        );
        let err = parse_hhmm("start", "8h").unwrap_err();
        assert!(err.to_string().contains("start"));
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("UTC").unwrap(), Tz::UTC);
        assert_eq!(parse_timezone(" America/Sao_Paulo ").unwrap(), Tz::America__Sao_Paulo);
        assert!(parse_timezone("Mars/Olympus").is_err());
        assert!(parse_timezone("").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("u", "https://http.msging.net").is_ok());
        assert!(validate_url("u", "http://localhost:8080").is_ok());
        assert!(validate_url("u", "ftp://example.com").is_err());
        assert!(validate_url("u", "example.com").is_err());
    }

    #[test]
    fn test_validate_language() {
        assert!(validate_language("pt-BR").is_ok());
        assert!(validate_language("en-US").is_ok());
        assert!(validate_language("english").is_err());
    }

    #[test]
    fn test_config_validation_reports_field() {
        let mut config = Config::default();
        config.api.page_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("api.page_size"));

        let mut config = Config::default();
        config.analysis.business_end = "25:00".to_string();
        assert!(config.validate().is_err());
    }
}
