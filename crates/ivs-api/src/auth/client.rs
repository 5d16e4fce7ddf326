//! Client details recorded with refresh tokens.

use std::{convert::Infallible, net::SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};

use super::refresh_token::DeviceInfo;

const MAX_USER_AGENT_LEN: usize = 255;

/// User agent and client IP of the current request. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo(pub DeviceInfo);

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(Self(DeviceInfo {
            user_agent: user_agent(&parts.headers),
            ip_address: forwarded_ip(&parts.headers).or(peer),
        }))
    }
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::USER_AGENT)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.chars().take(MAX_USER_AGENT_LEN).collect())
}

/// First hop of `X-Forwarded-For`, then `X-Real-IP`
fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next());
    let real_ip = headers.get("x-real-ip").and_then(|v| v.to_str().ok());

    forwarded
        .or(real_ip)
        .map(str::trim)
        .filter(|ip| ip.parse::<std::net::IpAddr>().is_ok())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> DeviceInfo {
        let (mut parts, _) = request.into_parts();
        let ClientInfo(info) = ClientInfo::from_request_parts(&mut parts, &())
            .await
            .expect("infallible");
        info
    }

    #[tokio::test]
    async fn test_prefers_forwarded_header() {
        let request = Request::builder()
            .header("user-agent", "curl/8.0")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .header("x-real-ip", "198.51.100.2")
            .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
            .body(())
            .expect("valid request");

        let info = extract(request).await;
        assert_eq!(info.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(info.ip_address.as_deref(), Some("203.0.113.9"));
    }

    #[tokio::test]
    async fn test_falls_back_to_peer_address() {
        let request = Request::builder()
            .header("x-forwarded-for", "not-an-ip")
            .extension(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))))
            .body(())
            .expect("valid request");

        let info = extract(request).await;
        assert_eq!(info.user_agent, None);
        assert_eq!(info.ip_address.as_deref(), Some("192.0.2.1"));
    }

    #[tokio::test]
    async fn test_empty_request() {
        let info = extract(Request::new(())).await;
        assert!(info.user_agent.is_none());
        assert!(info.ip_address.is_none());
    }
}
