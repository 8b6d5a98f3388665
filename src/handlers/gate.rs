//! Request gates: the session check for protected routes and the per-client
//! rate limit for the generation endpoints.

use super::AppState;
use crate::errors::ApiError;
use crate::services::auth::SESSION_COOKIE;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::net::SocketAddr;
use tower_cookies::{Cookie, Cookies};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Whether the request carries a valid session. Always true when the
/// deployment runs without authentication.
pub fn is_authenticated(state: &AppState, cookies: &Cookies) -> bool {
    let Some(sessions) = state.sessions.as_deref() else {
        return true;
    };

    cookies
        .get(SESSION_COOKIE)
        .map(|cookie| sessions.verify_token(cookie.value()).is_ok())
        .unwrap_or(false)
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Sends anonymous clients to the login page.
pub async fn require_session(
    State(state): State<AppState>,
    cookies: Cookies,
    request: Request,
    next: Next,
) -> Response {
    if is_authenticated(&state, &cookies) {
        return next.run(request).await;
    }

    // Drop an expired or forged cookie so the browser stops sending it
    if cookies.get(SESSION_COOKIE).is_some() {
        cookies.remove(removal_cookie());
    }
    Redirect::to("/login").into_response()
}

/// Rejects a client once it exceeds its request budget for the window.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let server = &state.config.server;
    let hops = if server.trust_proxy { server.proxy_hops } else { 0 };
    let key = client_key(request.headers(), peer, hops);

    match state.limiter.check(&key) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => ApiError::RateLimited { retry_after }.into_response(),
    }
}

/// Client identity for rate limiting.
///
/// Each proxy appends the address it received the request from, so only the
/// rightmost `trusted_hops` entries of `X-Forwarded-For` were written by
/// infrastructure we control. The client is the entry added by the outermost
/// trusted proxy; anything further left is client-supplied and ignored. With
/// no trusted hops, or a header shorter than the hop count, the socket peer
/// is used.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trusted_hops: usize) -> String {
    if trusted_hops > 0 {
        let entries: Vec<&str> = headers
            .get_all(FORWARDED_FOR)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();

        if let Some(index) = entries.len().checked_sub(trusted_hops) {
            return entries[index].to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn single_trusted_proxy_uses_rightmost_entry() {
        let peer: SocketAddr = "10.0.0.2:5555".parse().unwrap();
        let headers = forwarded("198.51.100.9, 203.0.113.7");
        assert_eq!(client_key(&headers, Some(peer), 1), "203.0.113.7");
    }

    #[test]
    fn spoofed_leftmost_entries_do_not_change_identity() {
        let keys: Vec<String> = (0..5)
            .map(|i| client_key(&forwarded(&format!("198.51.100.{i}, 203.0.113.7")), None, 1))
            .collect();
        assert!(keys.iter().all(|k| k == "203.0.113.7"));
    }

    #[test]
    fn two_trusted_hops_skip_the_inner_proxy() {
        let headers = forwarded("1.2.3.4, 203.0.113.7, 10.0.0.5");
        assert_eq!(client_key(&headers, None, 2), "203.0.113.7");
    }

    #[test]
    fn short_header_falls_back_to_peer() {
        let peer: SocketAddr = "10.0.0.2:5555".parse().unwrap();
        let headers = forwarded("203.0.113.7");
        assert_eq!(client_key(&headers, Some(peer), 2), "10.0.0.2");
    }

    #[test]
    fn proxy_header_ignored_when_untrusted() {
        let peer: SocketAddr = "10.0.0.2:5555".parse().unwrap();
        let headers = forwarded("203.0.113.7");
        assert_eq!(client_key(&headers, Some(peer), 0), "10.0.0.2");
    }

    #[test]
    fn falls_back_to_unknown() {
        assert_eq!(client_key(&HeaderMap::new(), None, 1), "unknown");
        assert_eq!(client_key(&forwarded("  "), None, 1), "unknown");
    }
}
