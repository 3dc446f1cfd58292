//! Error types and utilities for BLiP Insights

use thiserror::Error;

/// Result type alias for BLiP Insights operations
pub type Result<T> = std::result::Result<T, InsightsError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for BLiP Insights operations
#[derive(Error, Debug)]
pub enum InsightsError {
    /// The platform rejected the credential (bad or expired key)
    #[error("Authentication error: {message}")]
    Authentication {
        /// What was rejected
        message: String,
        /// HTTP status, when the rejection came from a response
        status_code: Option<u16>,
    },

    /// Transport failures, including timeouts
    #[error("Network error: {message}")]
    Network {
        /// What failed
        message: String,
        /// Underlying transport error
        #[source]
        source: Option<BoxedSource>,
    },

    /// The platform answered, but with an error status or a failed command
    #[error("BLiP API error: {message}")]
    Api {
        /// Status or command failure description
        message: String,
        /// HTTP status, when known
        status_code: Option<u16>,
    },

    /// Unusable data: unparseable timestamps, empty result sets
    #[error("Data error: {message}")]
    Data {
        /// What was wrong with the data
        message: String,
    },

    /// Chart or PDF export failures
    #[error("Render error: {message}")]
    Render {
        /// What could not be drawn or written
        message: String,
        /// Backend error
        #[source]
        source: Option<BoxedSource>,
    },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        /// What is misconfigured
        message: String,
        /// Loader or parser error
        #[source]
        source: Option<BoxedSource>,
    },

    /// Validation errors for operator input
    #[error("Validation error: {message}")]
    Validation {
        /// Why the input was refused
        message: String,
        /// Offending field, e.g. `period`
        field: Option<String>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification used when converting errors into operator notices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// [`InsightsError::Authentication`]
    Authentication,
    /// [`InsightsError::Network`]
    Network,
    /// [`InsightsError::Api`]
    Api,
    /// [`InsightsError::Data`]
    Data,
    /// [`InsightsError::Render`]
    Render,
    /// [`InsightsError::Config`]
    Config,
    /// [`InsightsError::Validation`]
    Validation,
    /// [`InsightsError::Io`]
    Io,
    /// [`InsightsError::Serialization`]
    Serialization,
}

impl InsightsError {
    /// Create a new authentication error
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication {
            message: msg.into(),
            status_code: None,
        }
    }

    /// Create a new authentication error carrying the HTTP status
    pub fn authentication_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::Authentication {
            message: msg.into(),
            status_code: Some(status),
        }
    }

    /// Create a new network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new network error with source
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new API error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api {
            message: msg.into(),
            status_code: None,
        }
    }

    /// Create a new API error with status code
    pub fn api_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::Api {
            message: msg.into(),
            status_code: Some(status),
        }
    }

    /// Create a new data error
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data {
            message: msg.into(),
        }
    }

    /// Create a new render error
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new render error with source
    pub fn render_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Render {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Network { .. } => ErrorKind::Network,
            Self::Api { .. } => ErrorKind::Api,
            Self::Data { .. } => ErrorKind::Data,
            Self::Render { .. } => ErrorKind::Render,
            Self::Config { .. } => ErrorKind::Config,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Io(_) => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Whether the analysis has to stop.
    ///
    /// Data and render errors degrade to empty-state artifacts and notices;
    /// everything else aborts the current interaction.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Data | ErrorKind::Render)
    }

    /// Message shown to the operator at the pipeline boundary
    pub fn user_message(&self) -> String {
        match self {
            Self::Authentication { .. } => {
                "The API key was rejected. Check that it belongs to the right bot (without the 'Key ' prefix) and enter it again.".to_string()
            }
            Self::Network { message, .. } => {
                format!("Could not reach the BLiP API ({message}). Try again when the connection is back.")
            }
            Self::Api {
                message,
                status_code: Some(status),
            } => format!("The BLiP API returned {status}: {message}"),
            Self::Api { message, .. } => format!("The BLiP API reported a failure: {message}"),
            Self::Data { message } => format!("No usable data: {message}"),
            Self::Render { message, .. } => {
                format!("Export failed ({message}); the remaining results are still available.")
            }
            Self::Config { message, .. } => format!("Invalid configuration: {message}"),
            Self::Validation {
                message,
                field: Some(field),
            } => format!("Invalid value for {field}: {message}"),
            Self::Validation { message, .. } => format!("Invalid input: {message}"),
            Self::Io(err) => format!("File error: {err}"),
            Self::Serialization(err) => format!("Unexpected response format: {err}"),
        }
    }
}

/// Convert from reqwest::Error to InsightsError
impl From<reqwest::Error> for InsightsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("Request timeout", err)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err)
        } else if err.is_decode() {
            Self::api(format!("Malformed response body: {err}"))
        } else {
            Self::network_with_source("Network request failed", err)
        }
    }
}

#[cfg(feature = "plotters")]
/// Convert from plotters drawing errors to InsightsError
impl<T> From<plotters::drawing::DrawingAreaErrorKind<T>> for InsightsError
where
    T: std::error::Error + Send + Sync + 'static,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<T>) -> Self {
        Self::render_with_source("Chart rendering failed", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{error::Error, io};

    #[test]
    fn test_error_creation() {
        let auth_error = InsightsError::authentication_with_status("key rejected", 401);
        assert!(auth_error.to_string().contains("Authentication error"));
        assert!(auth_error.to_string().contains("key rejected"));

        let api_error = InsightsError::api_with_status("Server error", 500);
        assert!(api_error.to_string().contains("BLiP API error"));

        let validation_error = InsightsError::validation_field("Invalid input", "timezone");
        assert!(validation_error.to_string().contains("Validation error"));
        assert!(validation_error.to_string().contains("Invalid input"));
    }

    #[test]
    fn test_error_with_source() {
        let io_error = io::Error::new(io::ErrorKind::TimedOut, "timed out");
        let wrapped = InsightsError::network_with_source("Request timeout", io_error);

        assert!(wrapped.to_string().contains("Request timeout"));
        assert!(wrapped.source().is_some());
        assert_eq!(wrapped.kind(), ErrorKind::Network);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: InsightsError = io_error.into();

        assert!(error.to_string().contains("I/O error"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_serde_error_conversion() {
        let serde_error = serde_json::from_str::<serde_json::Value>(r#"{"invalid": json}"#).unwrap_err();
        let error: InsightsError = serde_error.into();

        assert!(error.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_fatality_policy() {
        assert!(InsightsError::authentication("nope").is_fatal());
        assert!(InsightsError::network("down").is_fatal());
        assert!(InsightsError::api("failure").is_fatal());
        assert!(!InsightsError::data("empty").is_fatal());
        assert!(!InsightsError::render("pdf").is_fatal());
    }

    #[test]
    fn test_user_messages() {
        let auth = InsightsError::authentication("401");
        assert!(auth.user_message().contains("enter it again"));

        let network = InsightsError::network("connection refused");
        assert!(network.user_message().contains("connection refused"));

        let api = InsightsError::api_with_status("Bad Gateway", 502);
        assert_eq!(api.user_message(), "The BLiP API returned 502: Bad Gateway");

        let render = InsightsError::render("font missing");
        assert!(render.user_message().contains("remaining results"));
    }

    #[test]
    fn test_error_display_formatting() {
        let config_error = InsightsError::config("missing field");
        assert_eq!(config_error.to_string(), "Configuration error: missing field");

        let data_error = InsightsError::data("no events");
        assert_eq!(data_error.to_string(), "Data error: no events");
    }
}
