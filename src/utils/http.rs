//! HTTP helpers for reading request metadata.

use actix_web::{HttpRequest, http::header::HeaderMap};

/// Value of a header that must appear exactly once.
///
/// Header names are case-insensitive. Returns `None` when the header is
/// missing, repeated, or not visible ASCII.
pub fn single_header(headers: &HeaderMap, name: &str) -> Option<String> {
    let mut values = headers.get_all(name);
    let value = values.next()?;
    if values.next().is_some() {
        return None;
    }
    value.to_str().ok().map(str::to_string)
}

/// Extract client IP address from request headers
///
/// Uses the first address of `X-Forwarded-For` or `X-Real-IP` when present,
/// otherwise the connection peer address.
pub fn extract_client_ip(req: &HttpRequest) -> String {
    for header_name in ["X-Forwarded-For", "X-Real-IP"] {
        if let Some(header_str) = req.headers().get(header_name).and_then(|h| h.to_str().ok()) {
            let ip = header_str.split(',').next().unwrap_or(header_str).trim();
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
    }

    req.connection_info()
        .peer_addr()
        .unwrap_or("unknown")
        .to_string()
}

/// Extract user agent from request headers
pub fn extract_user_agent(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("User-Agent")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}
