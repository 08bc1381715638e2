//! SubTracker Edge Gate
//!
//! An axum server that sits in front of the SubTracker page renderer and
//! decides, before any protected page is generated, whether the request may
//! proceed:
//!
//! - **Route scopes**: `/dashboard/*` needs a valid session, `/admin/*` also
//!   needs the `admin` role; everything else is public and never checked
//! - **Session credential**: an HMAC-signed JWT in the `subtracker_jwt`
//!   cookie, issued by the backend and only ever verified or deleted here
//! - **Outcomes**: forward upstream, redirect to `/sign-in`, redirect home,
//!   or redirect to `/sign-in` while expiring the cookie
//!
//! ## Modules
//!
//! - [`auth`]: route classification, token verification and the middleware
//! - [`config`]: layered configuration (file + environment)
//! - [`error`]: token and gateway error types
//! - [`proxy`]: forwarding allowed requests to the page renderer

pub mod auth;
pub mod config;
pub mod error;
pub mod proxy;
pub mod result_ext;

use std::sync::Arc;

use axum::{
    http::header::{ACCEPT, CONTENT_TYPE},
    http::Method,
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::GateState;
use crate::config::{CorsConfig, GatewayConfig};
use crate::proxy::ProxyState;

pub use error::{GatewayError, TokenError};
pub use result_ext::ResultExt;

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let allowed_origins: Vec<axum::http::HeaderValue> = config
        .allowed_origins
        .iter()
        .map(|s| s.trim())
        .filter(|s| *s != "*")
        .filter_map(|s| s.parse().ok())
        .collect();

    tracing::info!("CORS allowed origins: {:?}", config.allowed_origins);

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::PATCH, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT])
        .allow_credentials(config.allow_credentials)
}

/// Build the gateway router: health check, then the gate in front of the proxy.
pub fn build_router(config: &GatewayConfig) -> Result<Router, GatewayError> {
    let gate_state = Arc::new(GateState::new(config.auth.clone()));
    let proxy_state = Arc::new(ProxyState::new(&config.upstream)?);

    // Every path except /health goes through the gate to the page renderer.
    let gated = Router::new()
        .fallback(proxy::forward)
        .layer(middleware::from_fn_with_state(gate_state, auth::middleware::edge_gate))
        .with_state(proxy_state);

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(gated)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors));

    Ok(app)
}

async fn health_check() -> &'static str {
    "ok"
}
