//! One analysis run: configuration in, report files out.

use crate::cli::Cli;
use crate::error::{AppError, AppResult};
use blip_common::{ApiKey, BlipClient, EventSource, FlowId, InsightsError, LoggingConfig};
use blip_config::{Config, ConfigLoader};
use blip_graphs::{AnalysisRequest, ChartStyle, FilterConfig, InsightsPipeline, Period, ReportContext, ReportRenderer};
use blip_i18n::{ids, Localizer};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// PDF report file name inside the output directory
pub const REPORT_FILE: &str = "report.pdf";
/// Visitor table file name inside the output directory
pub const TABLE_FILE: &str = "unique_visitors.csv";
/// Fetched-events table file name inside the output directory
pub const EVENTS_FILE: &str = "events.csv";
/// Chart subdirectory inside the output directory
pub const CHARTS_DIR: &str = "charts";

/// The credential held for the lifetime of one interaction.
///
/// It is never written to configuration or logs.
pub struct Session {
    api_key: ApiKey,
}

impl Session {
    /// Session for an already parsed key
    pub const fn new(api_key: ApiKey) -> Self {
        Self { api_key }
    }

    /// Session from the command line or its environment fallbacks
    pub fn from_cli(cli: &Cli) -> AppResult<Self> {
        cli.api_key(|var| std::env::var(var).ok()).map(Self::new)
    }

    /// The session key
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Directory the files were written to
    pub output_dir: PathBuf,
    /// Every file written, in write order
    pub files: Vec<PathBuf>,
    /// Non-fatal problems worth showing
    pub notices: Vec<String>,
    /// Unique visitors counted
    pub visitors: u64,
    /// Localized executive summary
    pub summary_lines: Vec<String>,
}

/// Resolved configuration and period for one run
pub struct InsightsApp {
    config: Config,
    period: Period,
}

impl InsightsApp {
    /// Build from an explicit configuration
    pub const fn new(config: Config, period: Period) -> Self {
        Self { config, period }
    }

    /// Load configuration (file, environment, flags) and resolve the period
    pub fn from_cli(cli: &Cli) -> AppResult<Self> {
        let mut config = ConfigLoader::load_from(cli.config.as_deref())?;
        cli.apply_to(&mut config)?;
        let period = cli.period(&config);
        Ok(Self::new(config, period))
    }

    /// Logging settings for the binary
    pub const fn logging(&self) -> &LoggingConfig {
        &self.config.logging
    }

    /// The effective configuration
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Run against the BLiP API
    pub async fn run(&self, session: &Session) -> AppResult<RunSummary> {
        let client = BlipClient::new(self.config.api.client_config())?;
        self.run_with(client, session, Utc::now()).await
    }

    /// Run against any event source
    #[instrument(skip_all, fields(flow = %self.config.analysis.flow))]
    pub async fn run_with<S: EventSource>(
        &self,
        source: S,
        session: &Session,
        now: DateTime<Utc>,
    ) -> AppResult<RunSummary> {
        let localizer = Localizer::for_language(&self.config.export.language).map_err(InsightsError::from)?;
        let request = AnalysisRequest {
            flow: FlowId::parse(&self.config.analysis.flow)?,
            filter: FilterConfig::from_analysis(&self.config.analysis, self.period)?,
        };
        let style = ChartStyle::with_size(self.config.export.chart_width, self.config.export.chart_height);
        let pipeline = InsightsPipeline::new(source, localizer).with_chart_style(style);

        let outcome = pipeline.run(session.api_key(), &request, now).await?;
        let summary = ReportRenderer::new(pipeline.localizer()).summary_lines(&outcome.report.summary);

        let context = ReportContext {
            flow: self.config.analysis.flow.clone(),
            generated_at: now,
        };
        let artifacts = pipeline.render_artifacts(&outcome, &context)?;

        let mut notices = Vec::new();
        if outcome.report.is_empty() {
            notices.push(pipeline.localizer().text(ids::REPORT_NO_DATA));
        }
        notices.extend(artifacts.notices);

        let output_dir = self.config.export.output_dir.clone();
        let charts_dir = output_dir.join(CHARTS_DIR);
        create_dir(&charts_dir)?;

        let mut files = Vec::new();
        files.push(write_file(&output_dir.join(REPORT_FILE), &artifacts.pdf.bytes)?);
        if let Some(csv) = &artifacts.csv {
            files.push(write_file(&output_dir.join(TABLE_FILE), csv)?);
        }
        if let Some(csv) = &artifacts.events_csv {
            files.push(write_file(&output_dir.join(EVENTS_FILE), csv)?);
        }
        for chart in &artifacts.charts {
            files.push(write_file(&charts_dir.join(&chart.file_name), chart.document.as_bytes())?);
        }

        if !notices.is_empty() {
            warn!(notices = notices.len(), "Run finished with notices");
        }
        info!(
            visitors = outcome.aggregates.total,
            files = files.len(),
            output_dir = %output_dir.display(),
            "Report written"
        );

        Ok(RunSummary {
            output_dir,
            files,
            notices,
            visitors: outcome.aggregates.total,
            summary_lines: summary,
        })
    }
}

fn create_dir(path: &Path) -> AppResult<()> {
    fs::create_dir_all(path).map_err(|source| AppError::Output {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> AppResult<PathBuf> {
    fs::write(path, bytes).map_err(|source| AppError::Output {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use blip_common::test_utils::event_fixtures::raw_event;
    use blip_common::test_utils::mock_timestamp;
    use blip_common::{EventQuery, RawEvent, Result};
    use chrono::NaiveDate;
    use clap::Parser;

    struct CannedSource(Vec<RawEvent>);

    #[async_trait]
    impl EventSource for CannedSource {
        async fn fetch_events(&self, _key: &ApiKey, _query: &EventQuery) -> Result<Vec<RawEvent>> {
            Ok(self.0.clone())
        }
    }

    fn app(dir: &Path) -> InsightsApp {
        let mut config = Config::default();
        config.export.output_dir = dir.to_path_buf();
        config.analysis.flow = "Início".to_string();
        let period = Period::Range {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        };
        InsightsApp::new(config, period)
    }

    fn session() -> Session {
        Session::new(ApiKey::parse("Key secret").unwrap())
    }

    #[tokio::test]
    async fn test_run_writes_report_table_and_charts() {
        let dir = tempfile::tempdir().unwrap();
        let source = CannedSource(vec![
            raw_event("a", mock_timestamp(2024, 1, 2, 10, 0, 0)),
            raw_event("b", mock_timestamp(2024, 1, 2, 22, 0, 0)),
        ]);

        let summary = app(dir.path())
            .run_with(source, &session(), mock_timestamp(2024, 2, 1, 0, 0, 0))
            .await
            .unwrap();

        assert_eq!(summary.visitors, 2);
        assert_eq!(summary.files.len(), 7);
        assert!(dir.path().join(REPORT_FILE).exists());
        assert!(dir.path().join(TABLE_FILE).exists());
        let events = fs::read_to_string(dir.path().join(EVENTS_FILE)).unwrap();
        assert_eq!(events.lines().count(), 3);
        assert!(dir.path().join(CHARTS_DIR).join("weekdays.svg").exists());
        assert!(summary.notices.is_empty());
        assert_eq!(summary.summary_lines.len(), 8);
    }

    #[tokio::test]
    async fn test_empty_run_still_writes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let summary = app(dir.path())
            .run_with(CannedSource(vec![]), &session(), mock_timestamp(2024, 2, 1, 0, 0, 0))
            .await
            .unwrap();

        assert_eq!(summary.visitors, 0);
        assert_eq!(summary.notices.len(), 1);
        let pdf = fs::read(dir.path().join(REPORT_FILE)).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_unwritable_output_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        fs::write(&blocker, b"file").unwrap();

        let err = app(&blocker)
            .run_with(CannedSource(vec![]), &session(), mock_timestamp(2024, 2, 1, 0, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Output { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_out_of_calendar_range_is_a_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from(["blip-insights", "--from", "2024-01-01", "--to", "+262142-12-31"]).unwrap();
        let mut config = Config::default();
        config.export.output_dir = dir.path().to_path_buf();
        let app = InsightsApp::new(config.clone(), cli.period(&config));

        let err = app
            .run_with(CannedSource(vec![]), &session(), mock_timestamp(2024, 2, 1, 0, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Insights(InsightsError::Validation { .. })));
        assert_eq!(err.exit_code(), 2);
        assert!(!dir.path().join(REPORT_FILE).exists());
    }
}
