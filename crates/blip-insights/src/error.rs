//! Application-wide error types using thiserror.

use blip_common::InsightsError;
use blip_config::ConfigError;
use std::path::PathBuf;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Pipeline error.
    #[error(transparent)]
    Insights(#[from] InsightsError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No API key on the command line or in the environment.
    #[error("No API key provided")]
    MissingApiKey,

    /// An output file could not be written.
    #[error("Failed to write '{path}': {source}")]
    Output {
        /// File being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    /// Message shown to the operator
    pub fn user_message(&self) -> String {
        match self {
            Self::Insights(err) => err.user_message(),
            Self::Config(err) => format!("Invalid configuration: {err}"),
            Self::MissingApiKey => {
                "No API key given. Pass --api-key or set BLIP_API_KEY (or API_KEY) and run again.".to_string()
            }
            Self::Output { path, source } => format!("Could not write {}: {source}", path.display()),
        }
    }

    /// Process exit code
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::MissingApiKey => 2,
            Self::Insights(InsightsError::Validation { .. } | InsightsError::Config { .. }) => 2,
            Self::Insights(InsightsError::Authentication { .. }) => 3,
            _ => 1,
        }
    }
}

/// Result type for the application.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_asks_to_reenter_key() {
        let err: AppError = InsightsError::authentication_with_status("key rejected", 401).into();
        assert!(err.user_message().contains("enter it again"));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_input_errors_exit_with_usage_code() {
        assert_eq!(AppError::MissingApiKey.exit_code(), 2);
        let err: AppError = InsightsError::validation_field("bad", "timezone").into();
        assert_eq!(err.exit_code(), 2);
        let err: AppError = InsightsError::network("offline").into();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_output_error_names_path() {
        let err = AppError::Output {
            path: PathBuf::from("out/report.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.user_message().contains("out/report.pdf"));
    }
}
