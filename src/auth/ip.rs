//! Client IP extraction.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};

/// Extract the client IP address for a request.
///
/// With `ip_header` set, the first comma-separated entry of that header is
/// used and a missing or unreadable header is an error (no fallback to the
/// socket address). Otherwise the peer address from `ConnectInfo` is used.
pub fn extract_client_ip(
    request: &Request,
    ip_header: Option<&str>,
) -> Result<String, &'static str> {
    match ip_header {
        Some(name) => {
            let value = request
                .headers()
                .get(name)
                .ok_or("IP header not present")?
                .to_str()
                .map_err(|_| "IP header contains invalid characters")?;
            let ip = value.split(',').next().unwrap_or_default().trim();
            if ip.is_empty() {
                return Err("IP header is empty");
            }
            Ok(ip.to_string())
        }
        None => request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .ok_or("No client IP available"),
    }
}
