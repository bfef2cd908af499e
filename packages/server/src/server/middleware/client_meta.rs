//! Client metadata capture for the purchase ledger.
//!
//! Purchases record who clicked: an IP string for `purchases.user_ip` and
//! the user agent. Behind a reverse proxy the socket peer is the proxy, so
//! forwarded headers take precedence: `X-Forwarded-For` (first hop), then
//! `X-Real-IP`, then the socket address.

use axum::{
    extract::{ConnectInfo, Request},
    http::header::USER_AGENT,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, SocketAddr};

/// Caller identity, stored as a request extension.
#[derive(Clone, Debug)]
pub struct ClientMeta {
    /// Client IP rendered to a string, the form the purchase row stores.
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Middleware: resolve the client address and user agent once per request.
pub async fn capture_client_meta(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut request: Request,
    next: Next,
) -> Response {
    let meta = ClientMeta {
        ip: forwarded_ip(request.headers())
            .or_else(|| Some(addr.ip()))
            .map(|ip| ip.to_string()),
        user_agent: request
            .headers()
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    };

    request.extensions_mut().insert(meta);
    next.run(request).await
}

/// Proxy-forwarded client address, if a header carries a parseable one.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        return forwarded
            .to_str()
            .ok()
            .and_then(|value| value.split(',').next())
            .and_then(|first| first.trim().parse().ok());
    }

    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn forwarded_for_first_hop_wins() {
        let headers = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(forwarded_ip(&headers), Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn real_ip_used_without_forwarded_for() {
        let headers = headers(&[("x-real-ip", "198.51.100.2")]);
        assert_eq!(forwarded_ip(&headers), Some("198.51.100.2".parse().unwrap()));
    }

    #[test]
    fn garbage_headers_yield_none() {
        let headers = headers(&[("x-forwarded-for", "not-an-address")]);
        assert_eq!(forwarded_ip(&headers), None);
    }

    #[test]
    fn no_headers_yield_none() {
        assert_eq!(forwarded_ip(&HeaderMap::new()), None);
    }
}
