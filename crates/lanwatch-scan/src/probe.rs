//! Reachability prober: one liveness probe per address under a bounded
//! worker pool.
//!
//! Each probe is one `ping -c 1` invocation. The per-probe timeout is
//! enforced here with `tokio::time::timeout`, not delegated to ping's own
//! flag, and the child is killed when the timeout wins. A probe failure is
//! never fatal to the sweep; the address just records `None`.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::{sleep, timeout};

use crate::config::ProbeConfig;
use crate::pool;

pub struct Prober {
    ping_path: String,
    timeout: Duration,
    jitter: Duration,
    concurrency: usize,
}

impl Prober {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            ping_path: config.ping_path.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            jitter: Duration::from_millis(config.jitter_ms),
            concurrency: config.concurrency,
        }
    }

    /// Probe every address, at most `concurrency` in flight. Returns
    /// address → round-trip in milliseconds, `None` for unreachable.
    pub async fn sweep(&self, hosts: &[Ipv4Addr]) -> HashMap<Ipv4Addr, Option<f64>> {
        let results = pool::run(hosts.to_vec(), self.concurrency, |ip| async move {
            let rtt = self.probe_one(ip).await;
            if !self.jitter.is_zero() {
                sleep(self.jitter).await;
            }
            (ip, rtt)
        })
        .await;
        results.into_iter().collect()
    }

    async fn probe_one(&self, ip: Ipv4Addr) -> Option<f64> {
        let mut cmd = Command::new(&self.ping_path);
        cmd.args(["-c", "1", "-n"])
            .arg(ip.to_string())
            .kill_on_drop(true);

        match timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => {
                parse_ping_rtt(&String::from_utf8_lossy(&output.stdout))
            }
            // Non-zero exit, spawn failure, or timeout: unreachable.
            _ => None,
        }
    }
}

/// Extract the round-trip from ping output, e.g.
/// `64 bytes from 192.168.1.1: icmp_seq=1 ttl=64 time=1.23 ms`.
fn parse_ping_rtt(output: &str) -> Option<f64> {
    let idx = output.find("time=")?;
    let rest = &output[idx + 5..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gnu_ping_output() {
        let out = "PING 192.168.1.1 (192.168.1.1) 56(84) bytes of data.\n\
64 bytes from 192.168.1.1: icmp_seq=1 ttl=64 time=1.23 ms\n\n\
--- 192.168.1.1 ping statistics ---\n";
        assert_eq!(parse_ping_rtt(out), Some(1.23));
    }

    #[test]
    fn parses_integer_rtt() {
        assert_eq!(
            parse_ping_rtt("64 bytes from 10.0.0.1: icmp_seq=1 ttl=255 time=3 ms"),
            Some(3.0)
        );
    }

    #[test]
    fn missing_time_token_is_none() {
        assert_eq!(parse_ping_rtt("Request timeout for icmp_seq 0"), None);
        assert_eq!(parse_ping_rtt(""), None);
    }

    #[tokio::test]
    async fn unreachable_probe_records_none_without_failing() {
        // A ping binary that does not exist: the sweep must still
        // complete with every address mapped to None.
        let prober = Prober::new(&ProbeConfig {
            ping_path: "/nonexistent/ping".to_string(),
            concurrency: 4,
            timeout_ms: 50,
            jitter_ms: 0,
        });
        let hosts: Vec<Ipv4Addr> = vec![
            "192.0.2.1".parse().unwrap(),
            "192.0.2.2".parse().unwrap(),
        ];
        let results = prober.sweep(&hosts).await;
        assert_eq!(results.len(), 2);
        assert!(results.values().all(Option::is_none));
    }
}
