//! Gateway configuration module.
//!
//! Supports loading configuration from:
//! 1. Config file (TOML, JSON, or YAML) named by `GATEWAY_CONFIG`
//! 2. Environment variables
//!
//! Environment variables take precedence over config file values.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Page renderer that allowed requests are forwarded to
    pub upstream: UpstreamConfig,
    /// Session cookie verification and route scopes
    pub auth: AuthConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server port (default: 3000)
    pub port: u16,
    /// Bind address (default: "0.0.0.0")
    pub bind: String,
}

/// Upstream page renderer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the page renderer (default: "http://localhost:3001")
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

/// Session cookie and route scope configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret shared with the backend that signs session tokens
    pub jwt_secret: String,
    /// Name of the cookie carrying the session token (default: "subtracker_jwt")
    pub cookie_name: String,
    /// Prefix of routes that need any valid session (default: "/dashboard")
    pub dashboard_prefix: String,
    /// Prefix of routes that need an admin session (default: "/admin")
    pub admin_prefix: String,
    /// Role claim value granting admin scope (default: "admin")
    pub admin_role: String,
    /// Redirect target for missing or invalid sessions (default: "/sign-in")
    pub sign_in_path: String,
    /// Redirect target for sessions lacking admin scope (default: "/")
    pub home_path: String,
    /// Clock skew tolerance applied to `exp` in seconds (default: 0)
    pub leeway_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins (comma-separated or array)
    pub allowed_origins: Vec<String>,
    /// Allow credentials (default: true)
    pub allow_credentials: bool,
}

// Default implementations

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            bind: "0.0.0.0".to_string(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            cookie_name: "subtracker_jwt".to_string(),
            dashboard_prefix: "/dashboard".to_string(),
            admin_prefix: "/admin".to_string(),
            admin_role: "admin".to_string(),
            sign_in_path: "/sign-in".to_string(),
            home_path: "/".to_string(),
            leeway_secs: 0,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("cookie_name", &self.cookie_name)
            .field("dashboard_prefix", &self.dashboard_prefix)
            .field("admin_prefix", &self.admin_prefix)
            .field("admin_role", &self.admin_role)
            .field("sign_in_path", &self.sign_in_path)
            .field("home_path", &self.home_path)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
            ],
            allow_credentials: true,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from file and environment variables.
    /// Environment variables override file values.
    pub fn load() -> anyhow::Result<Self> {
        // Start with defaults
        let mut config = Self::default();

        // Try to load from config file if specified
        if let Ok(config_path) = std::env::var("GATEWAY_CONFIG") {
            config = Self::from_file(&config_path)?;
            tracing::info!("Loaded configuration from: {}", config_path);
        }

        // Override with environment variables
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a file (supports TOML, JSON, YAML)
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config: GatewayConfig = match extension {
            "toml" => toml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            _ => {
                // Try to detect format
                if content.trim().starts_with('{') {
                    serde_json::from_str(&content)?
                } else if content.contains("---") || content.contains(": ") {
                    serde_yaml::from_str(&content)?
                } else {
                    toml::from_str(&content)?
                }
            }
        };

        Ok(config)
    }

    /// Reject configurations the gate cannot run safely with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("JWT secret is not configured (set JWT_SECRET or auth.jwt_secret)");
        }
        for (name, prefix) in [
            ("dashboard_prefix", &self.auth.dashboard_prefix),
            ("admin_prefix", &self.auth.admin_prefix),
        ] {
            if !prefix.starts_with('/') || prefix.len() < 2 {
                anyhow::bail!("auth.{} must be an absolute path prefix, got {:?}", name, prefix);
            }
        }
        url::Url::parse(&self.upstream.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid upstream.base_url {:?}: {}", self.upstream.base_url, e))?;
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Server config
        if let Ok(val) = std::env::var("GATEWAY_PORT").or_else(|_| std::env::var("PORT")) {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("GATEWAY_BIND") {
            self.server.bind = val;
        }

        // Upstream config
        if let Ok(val) = std::env::var("UPSTREAM_BASE_URL") {
            self.upstream.base_url = val;
        }
        if let Ok(val) = std::env::var("UPSTREAM_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.upstream.timeout_secs = secs;
            }
        }

        // Auth config
        if let Ok(val) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = val;
        }
        if let Ok(val) = std::env::var("AUTH_COOKIE_NAME") {
            self.auth.cookie_name = val;
        }
        if let Ok(val) = std::env::var("AUTH_SIGN_IN_PATH") {
            self.auth.sign_in_path = val;
        }
        if let Ok(val) = std::env::var("AUTH_HOME_PATH") {
            self.auth.home_path = val;
        }
        if let Ok(val) = std::env::var("AUTH_LEEWAY_SECS") {
            if let Ok(secs) = val.parse() {
                self.auth.leeway_secs = secs;
            }
        }

        // CORS config
        if let Ok(val) = std::env::var("CORS_ALLOWED_ORIGINS") {
            self.cors.allowed_origins = val.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(val) = std::env::var("CORS_ALLOW_CREDENTIALS") {
            self.cors.allow_credentials = val.parse().unwrap_or(true);
        }
    }

    /// Socket address string for `TcpListener::bind`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.cookie_name, "subtracker_jwt");
        assert_eq!(config.auth.sign_in_path, "/sign-in");
        assert_eq!(config.auth.home_path, "/");
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_toml_parsing() {
        let toml_content = r#"
[server]
port = 9090
bind = "127.0.0.1"

[upstream]
base_url = "http://web:3001"

[auth]
jwt_secret = "s3cret"
sign_in_path = "/login"
"#;
        let config: GatewayConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.upstream.base_url, "http://web:3001");
        assert_eq!(config.auth.sign_in_path, "/login");
        // Defaults should still be applied for missing fields
        assert_eq!(config.auth.admin_prefix, "/admin");
        assert_eq!(config.upstream.timeout_secs, 30);
        tokio_test::assert_ok!(config.validate());
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml_content = "auth:\n  jwt_secret: abc\n  cookie_name: other_jwt\n";
        let config: GatewayConfig = serde_yaml::from_str(yaml_content).unwrap();
        assert_eq!(config.auth.cookie_name, "other_jwt");
        assert_eq!(config.auth.dashboard_prefix, "/dashboard");
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        let config = GatewayConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("JWT secret"));
    }

    #[test]
    fn test_validate_rejects_bad_prefix() {
        let mut config = GatewayConfig::default();
        config.auth.jwt_secret = "abc".to_string();
        config.auth.admin_prefix = "admin".to_string();
        tokio_test::assert_err!(config.validate());

        config.auth.admin_prefix = "/".to_string();
        tokio_test::assert_err!(config.validate());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let mut config = AuthConfig::default();
        config.jwt_secret = "super-secret-value".to_string();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
