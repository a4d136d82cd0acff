//! CLI error types.

use dcmanager_client::ClientError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Missing or invalid global configuration (credentials, URLs).
    #[error("{0}")]
    Config(String),

    /// Command execution failed.
    #[error("command error: {0}")]
    Command(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// Invalid or conflicting arguments; raised before any request is sent.
    #[error("{0}")]
    InvalidArgument(String),

    /// The command was removed; the message names its replacement.
    #[error("{0}")]
    Deprecated(String),

    /// The user declined or did not answer a confirmation prompt.
    #[error("{0}")]
    Confirmation(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The API or transport failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl CliError {
    /// Shorthand for [`CliError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_passes_messages_through() {
        let err = CliError::invalid("The cloud_name and group options are mutually exclusive");
        assert_eq!(
            err.to_string(),
            "The cloud_name and group options are mutually exclusive"
        );
    }

    #[test]
    fn client_errors_are_transparent() {
        let err = CliError::from(ClientError::Api {
            code: 404,
            message: "Subcloud not found".into(),
        });
        assert_eq!(err.to_string(), "Subcloud not found (HTTP 404)");
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        assert!(matches!(CliError::from(io_err), CliError::Io(_)));
    }
}
