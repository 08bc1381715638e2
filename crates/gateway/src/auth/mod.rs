//! Route authorization for protected pages.
//!
//! The gate classifies each path by prefix, and for scoped paths checks the
//! session cookie before anything is forwarded to the page renderer. Every
//! outcome is one [`Decision`]; verification failures always end in a
//! redirect that also expires the cookie.

pub mod claims;
pub mod middleware;
pub mod types;

use crate::config::AuthConfig;
use claims::{SessionClaims, TokenVerifier};

/// Which protection a path falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteScope {
    /// Needs any valid session
    Dashboard,
    /// Needs a valid session with the admin role
    Admin,
    /// Not checked at all
    Public,
}

/// Outcome of the gate for a single request. Never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Forward the request. Carries the claims when the path was scoped.
    Allow(Option<SessionClaims>),
    /// No session: send the browser to the sign-in page
    RedirectSignIn,
    /// Valid session but not allowed on this scope: send it home
    RedirectHome,
    /// Session failed verification: sign-in page and expire the cookie
    RedirectSignInAndPurgeCookie,
}

/// Shared state for the gate middleware
#[derive(Clone)]
pub struct GateState {
    pub config: AuthConfig,
    verifier: TokenVerifier,
}

/// `/dashboard` matches `/dashboard`, `/dashboard/` and `/dashboard/x` but not `/dashboards`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl GateState {
    pub fn new(config: AuthConfig) -> Self {
        let verifier = TokenVerifier::new(&config.jwt_secret, config.leeway_secs);
        Self { config, verifier }
    }

    pub fn classify(&self, path: &str) -> RouteScope {
        if matches_prefix(path, &self.config.admin_prefix) {
            RouteScope::Admin
        } else if matches_prefix(path, &self.config.dashboard_prefix) {
            RouteScope::Dashboard
        } else {
            RouteScope::Public
        }
    }

    /// Decide what happens to a request for `path` carrying `token`.
    ///
    /// Public paths are allowed without looking at the token.
    pub fn decide(&self, path: &str, token: Option<&str>) -> Decision {
        let scope = self.classify(path);
        if scope == RouteScope::Public {
            return Decision::Allow(None);
        }

        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => {
                tracing::debug!(path, ?scope, "No session cookie on protected route");
                return Decision::RedirectSignIn;
            }
        };

        let claims = match self.verifier.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!(
                    path,
                    token = %token.get(..8).unwrap_or(token),
                    error = %e,
                    "Invalid or tampered session token"
                );
                return Decision::RedirectSignInAndPurgeCookie;
            }
        };

        if scope == RouteScope::Admin && !claims.has_role(&self.config.admin_role) {
            tracing::debug!(path, role = ?claims.role, "Session lacks admin role");
            return Decision::RedirectHome;
        }

        Decision::Allow(Some(claims))
    }
}
