//! Hostname resolution: system reverse lookup and link-local (mDNS)
//! reverse resolution.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::sleep;

/// System reverse lookup. Blocking libc resolver, so it runs on the
/// blocking pool.
pub async fn reverse_dns(ip: Ipv4Addr) -> Option<String> {
    let addr = IpAddr::V4(ip);
    tokio::task::spawn_blocking(move || dns_lookup::lookup_addr(&addr).ok())
        .await
        .ok()
        .flatten()
        // The resolver echoes the address back when there is no PTR record.
        .filter(|name| name != &addr.to_string())
}

/// Link-local reverse resolution: race `avahi-resolve-address` against a
/// fixed timer. First completion wins; on timeout the child is killed and
/// the result is `None`. No shared flags across the branches.
pub async fn link_local(avahi_path: &str, ip: Ipv4Addr, timeout: Duration) -> Option<String> {
    let mut cmd = Command::new(avahi_path);
    cmd.arg(ip.to_string()).kill_on_drop(true);

    tokio::select! {
        result = cmd.output() => match result {
            Ok(output) if output.status.success() => {
                parse_resolve_output(&String::from_utf8_lossy(&output.stdout))
            }
            _ => None,
        },
        _ = sleep(timeout) => None,
    }
}

/// `avahi-resolve-address` prints `<address>\t<hostname>` on success.
fn parse_resolve_output(output: &str) -> Option<String> {
    let line = output.lines().next()?;
    let name = line.split_whitespace().nth(1)?;
    Some(name.trim_end_matches('.').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_resolve_output() {
        assert_eq!(
            parse_resolve_output("192.168.1.34\tlivingroom-tv.local\n").as_deref(),
            Some("livingroom-tv.local")
        );
    }

    #[test]
    fn strips_trailing_dot() {
        assert_eq!(
            parse_resolve_output("10.0.0.5 printer.local.\n").as_deref(),
            Some("printer.local")
        );
    }

    #[test]
    fn empty_or_partial_output_is_none() {
        assert_eq!(parse_resolve_output(""), None);
        assert_eq!(parse_resolve_output("192.168.1.34\n"), None);
    }

    #[tokio::test]
    async fn missing_tool_loses_the_race_gracefully() {
        let result = link_local(
            "/nonexistent/avahi-resolve-address",
            "192.0.2.1".parse().unwrap(),
            Duration::from_millis(100),
        )
        .await;
        assert!(result.is_none());
    }
}
