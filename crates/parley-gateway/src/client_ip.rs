// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolution of the visitor's address and user agent.
//!
//! Two addresses are derived per request. The *remote* address keys rate
//! limits and bans: it is the socket peer, unless that peer is a trusted
//! proxy, in which case the forwarded client address is taken. The
//! *reported* address is recorded on the visitor row and may come from
//! forwarding headers regardless of who sent them.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRef, FromRequestParts};
use axum::http::{HeaderMap, request::Parts};
use parley_core::types::VisitorOrigin;

/// Proxy headers, in priority order.
const FORWARDING_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

/// Peers allowed to speak for the client through forwarding headers.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies(Arc<[IpAddr]>);

impl TrustedProxies {
    pub fn new(proxies: impl IntoIterator<Item = IpAddr>) -> Self {
        Self(proxies.into_iter().map(|ip| ip.to_canonical()).collect())
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.0.contains(&ip.to_canonical())
    }
}

/// Addresses derived for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddress {
    /// Key for rate limits and bans.
    pub remote: Option<IpAddr>,
    /// Visitor metadata only.
    pub reported: Option<IpAddr>,
}

/// The client address claimed by forwarding headers.
///
/// For `X-Forwarded-For` only the first entry is used. Values that are not
/// IP addresses are skipped.
pub fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    FORWARDING_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name)?.to_str().ok())
        .filter_map(|value| value.split(',').next())
        .find_map(|candidate| candidate.trim().parse::<IpAddr>().ok())
}

pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted: &TrustedProxies,
) -> ClientAddress {
    let peer = peer.map(|addr| addr.ip().to_canonical());
    let forwarded = forwarded_ip(headers);

    let remote = match peer {
        Some(ip) if trusted.contains(ip) => forwarded.or(Some(ip)),
        other => other,
    };

    ClientAddress {
        remote,
        reported: forwarded.or(peer),
    }
}

/// Extractor for the request's [`VisitorOrigin`] and rate-limit address.
#[derive(Debug, Clone)]
pub struct ClientOrigin {
    pub origin: VisitorOrigin,
    pub remote: Option<String>,
}

impl<S> FromRequestParts<S> for ClientOrigin
where
    S: Send + Sync,
    TrustedProxies: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let trusted = TrustedProxies::from_ref(state);
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let user_agent = parts
            .headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let address = resolve_client_ip(&parts.headers, peer, &trusted);
        Ok(Self {
            origin: VisitorOrigin {
                ip: address.reported.map(|ip| ip.to_string()),
                user_agent,
            },
            remote: address.remote.map(|ip| ip.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, value.parse().unwrap());
        }
        map
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.9:51234".parse().unwrap())
    }

    fn behind_proxy() -> TrustedProxies {
        TrustedProxies::new([ip("10.0.0.9")])
    }

    #[test]
    fn cloudflare_header_has_priority() {
        let h = headers(&[
            ("x-forwarded-for", "198.51.100.1"),
            ("cf-connecting-ip", "203.0.113.5"),
            ("x-real-ip", "192.0.2.1"),
        ]);
        assert_eq!(forwarded_ip(&h), Some(ip("203.0.113.5")));
    }

    #[test]
    fn first_forwarded_for_entry_is_used() {
        let h = headers(&[("x-forwarded-for", "198.51.100.1, 10.0.0.2, 10.0.0.3")]);
        assert_eq!(forwarded_ip(&h), Some(ip("198.51.100.1")));
    }

    #[test]
    fn garbage_headers_fall_through() {
        let h = headers(&[("cf-connecting-ip", "not-an-ip"), ("x-real-ip", "2001:db8::1")]);
        assert_eq!(forwarded_ip(&h), Some(ip("2001:db8::1")));

        let h = headers(&[("x-forwarded-for", "unknown")]);
        assert_eq!(forwarded_ip(&h), None);
    }

    #[test]
    fn untrusted_peer_is_rate_limited_on_its_socket_address() {
        let h = headers(&[("x-forwarded-for", "198.51.100.1")]);
        let address = resolve_client_ip(&h, peer(), &TrustedProxies::default());
        assert_eq!(address.remote, Some(ip("10.0.0.9")));
        assert_eq!(address.reported, Some(ip("198.51.100.1")));
    }

    #[test]
    fn trusted_proxy_forwards_the_client_address() {
        let h = headers(&[("x-forwarded-for", "198.51.100.1, 10.0.0.9")]);
        let address = resolve_client_ip(&h, peer(), &behind_proxy());
        assert_eq!(address.remote, Some(ip("198.51.100.1")));
        assert_eq!(address.reported, Some(ip("198.51.100.1")));

        // A proxy that forwards nothing is its own client.
        let address = resolve_client_ip(&HeaderMap::new(), peer(), &behind_proxy());
        assert_eq!(address.remote, Some(ip("10.0.0.9")));
    }

    #[test]
    fn mapped_ipv4_peer_matches_a_v4_proxy_entry() {
        let h = headers(&[("x-real-ip", "192.0.2.1")]);
        let mapped = Some("[::ffff:10.0.0.9]:443".parse().unwrap());
        let address = resolve_client_ip(&h, mapped, &behind_proxy());
        assert_eq!(address.remote, Some(ip("192.0.2.1")));
    }

    #[test]
    fn nothing_known_yields_none() {
        let address = resolve_client_ip(&HeaderMap::new(), None, &TrustedProxies::default());
        assert_eq!(
            address,
            ClientAddress {
                remote: None,
                reported: None,
            }
        );
    }
}
