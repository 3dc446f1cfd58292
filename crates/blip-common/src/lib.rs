//! # BLiP Common
//!
//! Shared types, errors, logging and the BLiP API client for BLiP Insights.
//!
//! This crate provides the foundational pieces used across all other crates
//! in the workspace: the [`InsightsError`] taxonomy, tracing setup, the
//! redacted [`ApiKey`] and the paginating [`BlipClient`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod blip;
pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use blip::{BlipClient, BlipConfig, EventQuery, EventSource, RawEvent};
pub use error::{ErrorKind, InsightsError, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use types::*;
pub use utils::*;
