//! # BLiP I18n
//!
//! Localized labels for BLiP Insights using the Fluent localization system.
//!
//! English and Brazilian Portuguese resources are compiled into the crate;
//! [`Localizer`] formats chart titles, axis labels, summary lines and PDF
//! text for one of them.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod loader;
pub mod locale;
pub mod messages;

pub use error::{I18nError, I18nResult};
pub use loader::Localizer;
pub use locale::Locale;
pub use messages::{ids, weekday_id};
