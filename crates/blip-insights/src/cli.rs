//! Command line interface.

use crate::error::{AppError, AppResult};
use blip_common::ApiKey;
use blip_config::Config;
use blip_graphs::Period;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Environment variable read when `--api-key` and `BLIP_API_KEY` are absent
pub const FALLBACK_API_KEY_ENV: &str = "API_KEY";

/// Unique visitors of a BLiP chatbot flow, by first contact.
#[derive(Debug, Clone, Parser)]
#[command(name = "blip-insights", version, about)]
pub struct Cli {
    /// BLiP API key, with or without the `Key ` prefix
    #[arg(long, env = "BLIP_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Flow action marking a first contact (the flow's first block)
    #[arg(long)]
    pub flow: Option<String>,

    /// Analyze the trailing N days
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub days: Option<u32>,

    /// First day of an explicit period (YYYY-MM-DD, UTC)
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    /// Last day of an explicit period, inclusive (YYYY-MM-DD, UTC)
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,

    /// IANA timezone for hour and weekday bucketing
    #[arg(long)]
    pub timezone: Option<String>,

    /// Business hours start
    #[arg(long, value_name = "HH:MM")]
    pub business_start: Option<String>,

    /// Business hours end
    #[arg(long, value_name = "HH:MM")]
    pub business_end: Option<String>,

    /// YAML configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Directory for report.pdf, the CSV tables and charts/
    #[arg(long, short)]
    pub output_dir: Option<PathBuf>,

    /// Label language (en-US or pt-BR)
    #[arg(long)]
    pub language: Option<String>,

    /// Events requested per page
    #[arg(long)]
    pub take: Option<u32>,

    /// Stop collecting after this many events
    #[arg(long)]
    pub max_events: Option<usize>,

    /// Log filter, e.g. `debug` or `blip_common=trace`
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Layer flags over a loaded configuration and validate the result
    pub fn apply_to(&self, config: &mut Config) -> AppResult<()> {
        if let Some(flow) = &self.flow {
            config.analysis.flow.clone_from(flow);
        }
        if let Some(days) = self.days {
            config.analysis.days = days;
        }
        if let Some(timezone) = &self.timezone {
            config.analysis.timezone.clone_from(timezone);
        }
        if let Some(start) = &self.business_start {
            config.analysis.business_start.clone_from(start);
        }
        if let Some(end) = &self.business_end {
            config.analysis.business_end.clone_from(end);
        }
        if let Some(dir) = &self.output_dir {
            config.export.output_dir.clone_from(dir);
        }
        if let Some(language) = &self.language {
            config.export.language.clone_from(language);
        }
        if let Some(take) = self.take {
            config.api.page_size = take;
        }
        if let Some(max) = self.max_events {
            config.api.max_events = max;
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
        config.validate()?;
        Ok(())
    }

    /// The requested period; `--from/--to` win over the configured days
    pub fn period(&self, config: &Config) -> Period {
        match (self.from, self.to) {
            (Some(start), Some(end)) => Period::Range { start, end },
            _ => Period::LastDays(self.days.unwrap_or(config.analysis.days)),
        }
    }

    /// Resolve the API key from the flag, `BLIP_API_KEY` or `API_KEY`
    pub fn api_key<F>(&self, lookup: F) -> AppResult<ApiKey>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = self
            .api_key
            .clone()
            .or_else(|| lookup(FALLBACK_API_KEY_ENV))
            .filter(|key| !key.trim().is_empty())
            .ok_or(AppError::MissingApiKey)?;
        Ok(ApiKey::parse(&raw)?)
    }
}
