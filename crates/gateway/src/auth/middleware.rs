use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use super::types::{UserContext, USER_ID_HEADER, USER_ROLE_HEADER};
use super::{Decision, GateState};

/// Middleware that runs the gate before the request reaches the proxy.
///
/// Only scoped paths are checked; everything else passes straight through.
/// Identity headers sent by the client are always stripped so the page
/// renderer can trust them.
pub async fn edge_gate(
    State(state): State<Arc<GateState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let headers = request.headers_mut();
    headers.remove(USER_ID_HEADER);
    headers.remove(USER_ROLE_HEADER);

    let path = request.uri().path().to_string();
    let token = extract_session_token(request.headers(), &state.config.cookie_name);
    let decision = state.decide(&path, token.as_deref());

    match decision {
        Decision::Allow(claims) => {
            if let Some(claims) = claims {
                let user_context = UserContext::from(&claims);
                tracing::debug!(
                    path = %path,
                    user_id = ?user_context.user_id,
                    role = ?user_context.role,
                    expires_at = ?user_context.expires_at,
                    "Session accepted"
                );
                insert_identity_headers(request.headers_mut(), &user_context);
                request.extensions_mut().insert(claims);
                request.extensions_mut().insert(user_context);
            }
            next.run(request).await
        }
        Decision::RedirectSignIn => Redirect::temporary(&state.config.sign_in_path).into_response(),
        Decision::RedirectHome => Redirect::temporary(&state.config.home_path).into_response(),
        Decision::RedirectSignInAndPurgeCookie => {
            let mut response = Redirect::temporary(&state.config.sign_in_path).into_response();
            match HeaderValue::from_str(&purge_cookie(&state.config.cookie_name)) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::error!("Cannot build cookie purge header: {}", e),
            }
            response
        }
    }
}

fn insert_identity_headers(headers: &mut HeaderMap, user: &UserContext) {
    if let Some(value) = user.user_id.as_deref().and_then(|v| HeaderValue::from_str(v).ok()) {
        headers.insert(USER_ID_HEADER, value);
    }
    if let Some(value) = user.role.as_deref().and_then(|v| HeaderValue::from_str(v).ok()) {
        headers.insert(USER_ROLE_HEADER, value);
    }
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn purge_cookie(cookie_name: &str) -> String {
    format!(
        "{}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax",
        cookie_name
    )
}

/// Extract the session token from the `Cookie` header(s).
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    for cookie_header in headers.get_all(header::COOKIE) {
        // Non-ASCII bytes still yield a value, so a garbled token is purged
        // instead of being treated as absent.
        let cookie_str = String::from_utf8_lossy(cookie_header.as_bytes());
        for cookie in cookie_str.split(';') {
            let parts: Vec<&str> = cookie.trim().splitn(2, '=').collect();
            if parts.len() == 2 && parts[0] == cookie_name {
                let value = parts[1].trim().trim_matches('"');
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    None
}
