//! Error types for the bulk dispatch engine.
//!
//! This module defines custom error types using `thiserror` for precise error handling.
//! Per-contact failures never appear here: they are captured as outcomes in the
//! run summary. Only job rejection and session-level faults surface as errors.

use std::time::Duration;
use thiserror::Error;

/// Errors that end (or prevent) a dispatch run.
#[derive(Error, Debug, Clone)]
pub enum DispatchError {
    /// The job was rejected before any session was opened
    #[error("Job rejected: {0}")]
    JobRejected(String),

    /// The transport session could not be opened
    #[error("Could not open transport session: {0}")]
    SessionUnavailable(#[source] TransportError),

    /// The session never reported ready within the watchdog bound
    #[error("Session not ready after {waited:?}")]
    ReadyTimeout { waited: Duration },

    /// The session became unusable (driver gone, browser closed)
    #[error("Session fault: {0}")]
    SessionFault(#[source] TransportError),
}

/// Errors reported by a transport session.
///
/// Only [`TransportError::SessionLost`] is fatal to a run; everything else is
/// recorded against the contact being processed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The session is gone and cannot be driven any further
    #[error("Session lost: {0}")]
    SessionLost(String),

    /// Navigation to a recipient did not land on a usable page
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// A UI affordance could not be located
    #[error("UI element not found: {0}")]
    ElementNotFound(String),

    /// A post-condition did not become true in time
    #[error("Timed out waiting for {0}")]
    Timeout(String),

    /// The strategy cannot handle the given content
    #[error("Unsupported content: {0}")]
    Unsupported(String),

    /// Generic transport error with context
    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Whether this error means the session itself is unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::SessionLost(_))
    }
}

/// Errors that can occur when talking to a WebDriver endpoint.
#[derive(Error, Debug)]
pub enum WebDriverError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Could not connect to the driver at all
    #[error("Connection to WebDriver failed")]
    ConnectionFailed,

    /// The driver returned a protocol error
    #[error("WebDriver error ({error}): {message}")]
    Protocol { error: String, message: String },

    /// Failed to parse JSON response
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Network timeout
    #[error("Request timeout")]
    Timeout,
}

impl From<WebDriverError> for TransportError {
    fn from(err: WebDriverError) -> Self {
        match err {
            WebDriverError::ConnectionFailed => TransportError::SessionLost(err.to_string()),
            WebDriverError::Protocol { ref error, .. } => match error.as_str() {
                "invalid session id" | "no such window" | "session not created" => {
                    TransportError::SessionLost(err.to_string())
                }
                "no such element" | "stale element reference" | "element not interactable" => {
                    TransportError::ElementNotFound(err.to_string())
                }
                "timeout" | "script timeout" => TransportError::Timeout(err.to_string()),
                _ => TransportError::Other(err.to_string()),
            },
            WebDriverError::Timeout => TransportError::Timeout("WebDriver response".to_string()),
            other => TransportError::Other(other.to_string()),
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    /// Environment variable has invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Convenience type alias for Results with DispatchError
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Convenience type alias for Results with TransportError
pub type TransportResult<T> = Result<T, TransportError>;

/// Convenience type alias for Results with WebDriverError
pub type WebDriverResult<T> = Result<T, WebDriverError>;

/// Convenience type alias for Results with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DispatchError::JobRejected("no content source".to_string());
        assert_eq!(err.to_string(), "Job rejected: no content source");

        let err = ConfigError::MissingVar("WEBDRIVER_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: WEBDRIVER_URL"
        );

        let err = TransportError::Timeout("preview".to_string());
        assert_eq!(err.to_string(), "Timed out waiting for preview");
    }

    #[test]
    fn test_only_session_lost_is_fatal() {
        assert!(TransportError::SessionLost("gone".into()).is_fatal());
        assert!(!TransportError::Navigation("blank".into()).is_fatal());
        assert!(!TransportError::ElementNotFound("send".into()).is_fatal());
        assert!(!TransportError::Timeout("preview".into()).is_fatal());
    }

    #[test]
    fn test_webdriver_error_mapping() {
        let lost: TransportError = WebDriverError::Protocol {
            error: "invalid session id".to_string(),
            message: "session deleted".to_string(),
        }
        .into();
        assert!(lost.is_fatal());

        let missing: TransportError = WebDriverError::Protocol {
            error: "no such element".to_string(),
            message: "//footer".to_string(),
        }
        .into();
        assert!(matches!(missing, TransportError::ElementNotFound(_)));

        let refused: TransportError = WebDriverError::ConnectionFailed.into();
        assert!(refused.is_fatal());
    }
}
