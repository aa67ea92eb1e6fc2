//! Error types for Ci service operations

use std::io;
use thiserror::Error;

/// Result type alias for Ci operations
pub type Result<T> = std::result::Result<T, CiError>;

/// Errors that can occur while talking to the Ci service
#[derive(Error, Debug)]
pub enum CiError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Authentication failed or token rejected
    #[error("Authentication error ({code}): {message}")]
    Auth { code: String, message: String },

    /// The service refused to create an upload session
    #[error("Upload session could not be created for '{name}': {message}")]
    SessionInit { name: String, message: String },

    /// I/O error reading local files
    #[error("I/O error: {0}")]
    Io(String),

    /// Transient network failure (timeout, connection reset) - eligible for retry
    #[error("Network error: {0}")]
    TransientNetwork(String),

    /// The service rejected the request with a business error
    #[error("Server rejected request ({status}): {message}")]
    ServerRejected { status: u16, message: String },

    /// One or more parts could not be transferred after retries
    #[error("Upload of asset {asset_id} incomplete: parts {failed:?} failed")]
    PartsFailed { asset_id: String, failed: Vec<u64> },

    /// The completion call for a multipart session failed
    #[error("Upload of asset {asset_id} did not finalize: {message}")]
    Completion { asset_id: String, message: String },

    /// Generic API error from a management operation
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The service returned a response the schema does not account for
    #[error("Unexpected response from service: {0}")]
    UnexpectedResponse(String),
}

impl CiError {
    /// Check if this error is transient (safe to retry)
    pub fn is_transient(&self) -> bool {
        matches!(self, CiError::TransientNetwork(_))
    }

    /// Check if this error is fatal (aborts the whole operation, no retry)
    pub fn is_fatal(&self) -> bool {
        match self {
            CiError::Config(_)
            | CiError::Auth { .. }
            | CiError::SessionInit { .. }
            | CiError::Io(_)
            | CiError::PartsFailed { .. }
            | CiError::Completion { .. } => true,

            CiError::TransientNetwork(_)
            | CiError::ServerRejected { .. }
            | CiError::Api { .. }
            | CiError::UnexpectedResponse(_) => false,
        }
    }
}

impl From<io::Error> for CiError {
    fn from(err: io::Error) -> Self {
        CiError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for CiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            CiError::TransientNetwork(err.to_string())
        } else if err.is_decode() {
            CiError::UnexpectedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            CiError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            CiError::TransientNetwork(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(CiError::TransientNetwork("connection reset".to_string()).is_transient());
        assert!(!CiError::ServerRejected {
            status: 400,
            message: "bad part".to_string()
        }
        .is_transient());
        assert!(!CiError::Auth {
            code: "invalid_grant".to_string(),
            message: "expired".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_fatal_errors() {
        assert!(CiError::Config("missing client_id".to_string()).is_fatal());
        assert!(CiError::Io("read failed".to_string()).is_fatal());
        assert!(CiError::SessionInit {
            name: "clip.mp4".to_string(),
            message: "quota exceeded".to_string()
        }
        .is_fatal());
        assert!(CiError::Completion {
            asset_id: "a1".to_string(),
            message: "500".to_string()
        }
        .is_fatal());
        assert!(!CiError::TransientNetwork("timeout".to_string()).is_fatal());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: CiError = io_err.into();
        assert!(matches!(err, CiError::Io(_)));
    }

    #[test]
    fn test_error_display_formats() {
        let err = CiError::PartsFailed {
            asset_id: "abc123".to_string(),
            failed: vec![2, 5],
        };
        assert_eq!(
            format!("{}", err),
            "Upload of asset abc123 incomplete: parts [2, 5] failed"
        );

        let err = CiError::ServerRejected {
            status: 413,
            message: "part too large".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Server rejected request (413): part too large"
        );

        let err = CiError::Auth {
            code: "invalid_client".to_string(),
            message: "unknown client".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Authentication error (invalid_client): unknown client"
        );
    }
}
