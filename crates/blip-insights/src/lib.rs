//! # BLiP Insights
//!
//! Command line front end for unique-visitor analytics of a BLiP chatbot
//! flow. It resolves configuration and the API key, runs the analysis
//! pipeline and writes the PDF report, the visitor CSV and the SVG charts.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod cli;
pub mod error;

pub use app::{InsightsApp, RunSummary, Session, CHARTS_DIR, EVENTS_FILE, REPORT_FILE, TABLE_FILE};
pub use cli::{Cli, FALLBACK_API_KEY_ENV};
pub use error::{AppError, AppResult};
