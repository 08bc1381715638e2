//! Transparent proxy to the page renderer.
//!
//! Every request the gate lets through (scoped or public) is forwarded to the
//! upstream with its method, path, query, body and end-to-end headers. The
//! upstream's redirects are passed back to the browser untouched.
//!
//! Usage:
//! - `/*path` - Forwards to `{UPSTREAM_BASE_URL}/*path`

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, Response},
};
use std::sync::Arc;
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::error::GatewayError;

/// Largest request body forwarded upstream
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Headers that describe a single hop and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
];

/// Shared state for the proxy handler.
#[derive(Clone)]
pub struct ProxyState {
    pub upstream_base_url: String,
    pub http_client: reqwest::Client,
}

impl ProxyState {
    pub fn new(config: &UpstreamConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to build upstream client: {}", e)))?;

        Ok(Self {
            upstream_base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Upstream URL for a path and optional query string.
    pub fn target_url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.upstream_base_url, path_and_query)
    }
}

fn is_forwardable(name: &HeaderName) -> bool {
    !HOP_BY_HOP.contains(name) && *name != header::CONTENT_LENGTH && name.as_str() != "keep-alive"
}

fn copy_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from {
        if is_forwardable(name) {
            to.append(name.clone(), value.clone());
        }
    }
}

/// Fallback handler that forwards the request to the page renderer.
pub async fn forward(
    State(state): State<Arc<ProxyState>>,
    req: Request,
) -> Result<Response<Body>, GatewayError> {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let full_url = state.target_url(&path_and_query);
    let method = req.method().clone();

    tracing::debug!(target_url = %full_url, method = %method, "Forwarding request upstream");

    let (parts, body) = req.into_parts();
    let body_bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| GatewayError::BadRequest(format!("Failed to read request body: {}", e)))?;

    let mut upstream_headers = HeaderMap::new();
    copy_headers(&parts.headers, &mut upstream_headers);

    let mut proxy_req = state
        .http_client
        .request(method, &full_url)
        .headers(upstream_headers);
    if !body_bytes.is_empty() {
        proxy_req = proxy_req.body(body_bytes);
    }

    let proxy_response = proxy_req
        .send()
        .await
        .map_err(|e| GatewayError::Upstream(format!("Upstream request failed: {}", e)))?;

    let status = proxy_response.status();
    let mut response_headers = HeaderMap::new();
    copy_headers(proxy_response.headers(), &mut response_headers);

    let bytes = proxy_response
        .bytes()
        .await
        .map_err(|e| GatewayError::Upstream(format!("Failed to read upstream response: {}", e)))?;

    let mut response = Response::builder()
        .status(status)
        .body(Body::from(bytes))
        .map_err(|e| GatewayError::Internal(format!("Failed to build response: {}", e)))?;
    *response.headers_mut() = response_headers;

    Ok(response)
}
