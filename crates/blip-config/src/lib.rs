//! # BLiP Config
//!
//! Configuration management for BLiP Insights.
//!
//! This crate provides the YAML schema, defaults, loading with environment
//! variable overrides and validation. CLI flags are layered on top by the
//! binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use defaults::*;
pub use loader::*;
pub use schema::*;
pub use validator::*;
