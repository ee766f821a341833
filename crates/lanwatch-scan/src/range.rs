//! CIDR range enumeration and local-range auto-detection.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use tokio::process::Command;

use crate::error::{Result, ScanError};

/// Enumerate the host addresses of `cidr` in ascending order.
///
/// Network and broadcast addresses are excluded, except for the
/// degenerate prefixes: /31 yields both addresses and /32 the single
/// address. Pure, no I/O.
pub fn enumerate_hosts(cidr: &str) -> Result<Vec<Ipv4Addr>> {
    let net: Ipv4Net = cidr.parse().map_err(|e: ipnet::AddrParseError| {
        ScanError::InvalidCidr {
            cidr: cidr.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(net.hosts().collect())
}

/// Detect the local segment's CIDR by asking `ip` for the first global
/// IPv4 address, scoped to `iface` when given.
///
/// Failure is fatal to the calling scan cycle only; callers cache a
/// successful detection for the process lifetime.
pub async fn detect_local_cidr(ip_path: &str, iface: Option<&str>) -> Result<String> {
    let mut cmd = Command::new(ip_path);
    cmd.args(["-o", "-4", "addr", "show"]);
    match iface {
        Some(name) => {
            cmd.arg(name);
        }
        None => {
            cmd.args(["scope", "global"]);
        }
    }

    let output = cmd
        .output()
        .await
        .map_err(|e| ScanError::RangeDetectionFailed(format!("{ip_path}: {e}")))?;

    if !output.status.success() {
        return Err(ScanError::RangeDetectionFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    parse_addr_show(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        ScanError::RangeDetectionFailed("no global IPv4 address found".to_string())
    })
}

/// Pull the first `addr/prefix` column out of `ip -o -4 addr show`
/// output. Lines look like:
/// `2: wlp2s0    inet 192.168.1.42/24 brd 192.168.1.255 scope global ...`
fn parse_addr_show(output: &str) -> Option<String> {
    for line in output.lines() {
        let mut tokens = line.split_whitespace();
        while let Some(tok) = tokens.next() {
            if tok == "inet" {
                if let Some(addr) = tokens.next() {
                    if addr.parse::<Ipv4Net>().is_ok() {
                        return Some(addr.to_string());
                    }
                }
                break;
            }
        }
    }
    None
}
