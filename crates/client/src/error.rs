//! Error types for the client crate.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Result alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by explicit client actions.
///
/// The `Display` text is meant to be shown to the user as-is.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The backend could not be reached
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Input rejected before anything was sent
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Sign-in was accepted but the follow-up identity check found no session
    #[error("Signed in, but no session could be established")]
    SessionNotEstablished,

    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] envy::Error),
}

impl ClientError {
    /// HTTP status for `Api` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_displays_backend_message() {
        let err = ClientError::Api {
            status: 401,
            message: "Invalid email or password".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid email or password");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_status_only_for_api_errors() {
        assert_eq!(ClientError::SessionNotEstablished.status(), None);
        assert_eq!(ClientError::Decode("bad json".to_string()).status(), None);
    }
}
