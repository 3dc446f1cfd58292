//! Error types for internationalization operations

use thiserror::Error;

/// Errors that can occur during internationalization operations
#[derive(Error, Debug)]
pub enum I18nError {
    /// The language tag is not one of the shipped locales
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Failed to parse a language identifier
    #[error("Invalid language identifier: {0}")]
    InvalidLanguageId(String),

    /// Failed to parse a Fluent resource
    #[error("Failed to parse Fluent resource for {locale}: {errors:?}")]
    FluentParseError { locale: String, errors: Vec<String> },

    /// Message not found in the bundle
    #[error("Message not found: {key}")]
    MessageNotFound { key: String },

    /// Failed to format a message
    #[error("Failed to format message '{key}': {errors:?}")]
    MessageFormatError { key: String, errors: Vec<String> },
}

/// Result type for i18n operations
pub type I18nResult<T> = Result<T, I18nError>;

impl From<I18nError> for blip_common::InsightsError {
    fn from(err: I18nError) -> Self {
        match err {
            I18nError::UnsupportedLanguage(tag) => {
                Self::validation_field(format!("'{tag}' is not a supported language"), "language")
            }
            other => Self::config_with_source("Localization failed", other),
        }
    }
}
