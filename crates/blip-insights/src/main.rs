//! Main entry point for BLiP Insights.

use blip_common::init_logging;
use blip_insights::{AppError, Cli, InsightsApp, Session};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let app = match InsightsApp::from_cli(&cli) {
        Ok(app) => app,
        Err(err) => return Ok(fail(&err)),
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = init_logging(app.logging())?;
    info!("Starting BLiP Insights");

    let session = match Session::from_cli(&cli) {
        Ok(session) => session,
        Err(err) => return Ok(fail(&err)),
    };

    match app.run(&session).await {
        Ok(summary) => {
            for line in &summary.summary_lines {
                println!("{line}");
            }
            println!();
            for file in &summary.files {
                println!("  {}", file.display());
            }
            for notice in &summary.notices {
                eprintln!("note: {notice}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(error = %err, "Run failed");
            Ok(fail(&err))
        }
    }
}

fn fail(err: &AppError) -> ExitCode {
    eprintln!("{}", err.user_message());
    u8::try_from(err.exit_code()).map_or(ExitCode::FAILURE, ExitCode::from)
}
