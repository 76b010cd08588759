use crate::error::ScanError;
use if_addrs::{get_if_addrs, IfAddr};
use ipnet::Ipv4Net;
use std::net::{Ipv4Addr, UdpSocket};
use tracing::debug;

/// Detect the local IPv4 subnet to scan, assuming a /24.
///
/// Asks the routing table which local address would reach the internet (a connected UDP
/// socket sends nothing), then falls back to the first non-loopback interface.
pub fn detect_local_subnet() -> Result<Ipv4Net, ScanError> {
    match route_local_ipv4() {
        Ok(ip) => return Ok(ipv4_to_default_cidr(ip)),
        Err(e) => debug!(error = %e, "route lookup failed, falling back to interface list"),
    }
    detect_local_cidrs()?
        .into_iter()
        .next()
        .ok_or_else(|| ScanError::NoLocalNetwork("no non-loopback IPv4 interface found".into()))
}

fn route_local_ipv4() -> std::io::Result<Ipv4Addr> {
    let sock = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    sock.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
    match sock.local_addr()?.ip() {
        std::net::IpAddr::V4(ip) if !ip.is_unspecified() && !ip.is_loopback() => Ok(ip),
        other => Err(std::io::Error::other(format!("unusable local address {other}"))),
    }
}

/// Detect local non-loopback IPv4 addresses and convert each to a default /24 CIDR network.
///
/// For example, an interface IP `192.168.1.42` becomes `192.168.1.0/24`.
/// Duplicates are removed and the result is sorted.
pub fn detect_local_cidrs() -> Result<Vec<Ipv4Net>, ScanError> {
    let mut cidrs: Vec<Ipv4Net> = Vec::new();
    for iface in get_if_addrs()? {
        if let IfAddr::V4(v4) = iface.addr {
            if v4.ip.is_loopback() {
                continue;
            }
            cidrs.push(ipv4_to_default_cidr(v4.ip));
        }
    }
    cidrs.sort_by_key(|n| (u32::from(n.network()), n.prefix_len()));
    cidrs.dedup();
    Ok(cidrs)
}

/// Parse a `--subnet` argument.
///
/// Accepts CIDR notation (host bits are dropped, `10.0.0.7/24` means `10.0.0.0/24`) or a
/// bare address, which stands for its /24.
pub fn parse_subnet(input: &str) -> Result<Ipv4Net, ScanError> {
    let s = input.trim();
    let invalid = |reason: String| ScanError::InvalidSubnet {
        input: input.to_string(),
        reason,
    };
    if s.contains('/') {
        s.parse::<Ipv4Net>()
            .map(|n| n.trunc())
            .map_err(|e| invalid(e.to_string()))
    } else {
        s.parse::<Ipv4Addr>()
            .map(ipv4_to_default_cidr)
            .map_err(|e| invalid(e.to_string()))
    }
}

/// Helper: convert an IPv4 address into its default /24 network.
pub fn ipv4_to_default_cidr(ip: Ipv4Addr) -> Ipv4Net {
    let o = ip.octets();
    let net = Ipv4Addr::new(o[0], o[1], o[2], 0);
    Ipv4Net::new(net, 24).expect("/24 is always valid")
}

/// Host addresses of a subnet in ascending order, excluding network and broadcast.
///
/// /31 and /32 have no such addresses and yield an empty list.
pub fn expand_hosts(net: Ipv4Net) -> Vec<Ipv4Addr> {
    if net.prefix_len() >= 31 {
        return Vec::new();
    }
    // Numeric range strictly between network and broadcast.
    let start = u32::from(net.network());
    let end = u32::from(net.broadcast());
    (start + 1..end).map(Ipv4Addr::from).collect()
}
