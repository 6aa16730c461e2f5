use std::net::IpAddr;

use axum::http::HeaderMap;
use ipnet::IpNet;

/// Address of the visitor, forwarded to the CAPTCHA service as `remoteip`.
///
/// Forwarding headers are only honoured when the direct peer is a trusted proxy.
pub fn client_ip(headers: &HeaderMap, peer: IpAddr, trusted_proxies: &[IpNet]) -> IpAddr {
    let trusted = |ip: &IpAddr| trusted_proxies.iter().any(|net| net.contains(ip));

    if !trusted(&peer) {
        return peer;
    }

    if let Some(ip) = headers
        .get("cf-connecting-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return ip;
    }

    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        // Take the first (leftmost) IP that isn't a trusted proxy
        for ip_str in xff.split(',').map(|s| s.trim()) {
            if let Ok(ip) = ip_str.parse::<IpAddr>() {
                if !trusted(&ip) {
                    return ip;
                }
            }
        }
    }

    peer
}
