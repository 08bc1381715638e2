//! Client configuration loaded from environment variables.

use serde::Deserialize;

/// Backend connection settings.
///
/// Environment variables are prefixed with `SUBTRACKER_`:
/// - `SUBTRACKER_BACKEND_URL`: API base URL (default: "http://localhost:5000/api/v1")
/// - `SUBTRACKER_TIMEOUT_SECS`: per-request timeout (default: 30)
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Backend API base URL
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Request timeout in seconds. Bounds how long a session check can keep
    /// the store in its loading state.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:5000/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl ClientConfig {
    /// Load configuration from environment variables prefixed with `SUBTRACKER_`.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("SUBTRACKER_").from_env::<ClientConfig>()
    }

    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
