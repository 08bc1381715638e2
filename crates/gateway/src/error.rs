//! Error types for the edge gate.
//!
//! `TokenError` classifies why a session credential was rejected; it never
//! reaches the browser, the gate turns every variant into a redirect.
//! `GatewayError` covers failures after a request was allowed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Reasons a session credential failed verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// `exp` is in the past
    #[error("Token has expired")]
    Expired,

    /// `nbf` is in the future
    #[error("Token is not yet valid")]
    NotYetValid,

    /// Signature does not match the configured secret
    #[error("Invalid signature")]
    InvalidSignature,

    /// A claim the gate relies on is absent
    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    /// Anything else: bad encoding, wrong algorithm, undecodable claims
    #[error("Malformed token: {0}")]
    Malformed(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::MissingRequiredClaim(claim) => Self::MissingClaim(claim.clone()),
            _ => Self::Malformed(err.to_string()),
        }
    }
}

/// Errors raised while serving an allowed request.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The page renderer could not be reached or answered garbage
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Request could not be read or rebuilt
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream error");
                StatusCode::BAD_GATEWAY
            }
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Config(msg) => {
                tracing::error!(error = %msg, "Configuration error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
