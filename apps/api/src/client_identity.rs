//! Derives the gate identity from request metadata.
//!
//! Forwarded headers are only honored when the socket peer is a trusted
//! proxy. An empty trust list trusts every peer, which is the deployment
//! default behind a CDN.

use std::net::SocketAddr;

use axum::http::HeaderMap;
use ipnet::IpNet;
use quotagate_core::{AppError, AppResult};
use quotagate_domain::{ClientAddress, Identity, UserId};

const CF_CONNECTING_IP: &str = "cf-connecting-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_USER_ID: &str = "x-user-id";

/// Resolves the caller address and optional user id.
pub fn resolve_identity(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_proxies: &[IpNet],
) -> AppResult<Identity> {
    let address = resolve_address(headers, peer, trusted_proxies)?;
    let user_id = header_value(headers, X_USER_ID)?
        .map(UserId::parse)
        .transpose()?;

    Ok(Identity::new(address, user_id))
}

/// Resolves the caller address: `CF-Connecting-IP`, then the first
/// `X-Forwarded-For` entry, then the socket peer.
pub fn resolve_address(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_proxies: &[IpNet],
) -> AppResult<ClientAddress> {
    if forwarded_headers_trusted(peer, trusted_proxies) {
        if let Some(value) = header_value(headers, CF_CONNECTING_IP)? {
            return ClientAddress::parse(value);
        }

        let forwarded = header_value(headers, X_FORWARDED_FOR)?
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        if let Some(value) = forwarded {
            return ClientAddress::parse(value);
        }
    }

    peer.map(|peer| ClientAddress::from(peer.ip().to_canonical()))
        .ok_or_else(|| AppError::Internal("client address is unavailable".to_owned()))
}

fn forwarded_headers_trusted(peer: Option<SocketAddr>, trusted_proxies: &[IpNet]) -> bool {
    if trusted_proxies.is_empty() {
        return true;
    }

    peer.is_some_and(|peer| {
        let ip = peer.ip().to_canonical();
        trusted_proxies.iter().any(|network| network.contains(&ip))
    })
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<Option<&'a str>> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AppError::Validation(format!("header '{name}' is not valid text")))?
        .trim();

    Ok((!value.is_empty()).then_some(value))
}
