//! OS neighbor-table collection.
//!
//! One `ip neigh` query per cycle, parsed line by line. Unparseable lines
//! are skipped and total command failure yields an empty result; the
//! collector never errors to the orchestrator.

use std::net::Ipv4Addr;

use tokio::process::Command;

/// Neighbor states that imply the entry was recently seen. Entries in any
/// other state (FAILED, INCOMPLETE, ...) are excluded from enrichment.
pub const RECENT_STATES: [&str; 4] = ["REACHABLE", "STALE", "DELAY", "PROBE"];

/// One parsed neighbor-table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborEntry {
    pub ip: Ipv4Addr,
    /// Link-layer address, lower-cased, absent for FAILED/INCOMPLETE
    /// entries.
    pub mac: Option<String>,
    pub interface: Option<String>,
    pub state: String,
}

impl NeighborEntry {
    pub fn recently_seen(&self) -> bool {
        RECENT_STATES.contains(&self.state.as_str())
    }

    /// Parse one `ip neigh` line, e.g.
    /// `192.168.1.10 dev wlp2s0 lladdr aa:bb:cc:dd:ee:ff REACHABLE`.
    /// IPv6 entries and malformed lines yield `None`.
    fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 2 {
            return None;
        }
        let ip: Ipv4Addr = tokens[0].parse().ok()?;
        let state = tokens.last()?.to_string();
        let mac = field_after(&tokens, "lladdr").map(str::to_ascii_lowercase);
        let interface = field_after(&tokens, "dev").map(String::from);
        Some(Self {
            ip,
            mac,
            interface,
            state,
        })
    }
}

fn field_after<'a>(tokens: &[&'a str], key: &str) -> Option<&'a str> {
    tokens
        .iter()
        .position(|t| *t == key)
        .and_then(|i| tokens.get(i + 1))
        .copied()
}

/// Query the neighbor table once. Any failure degrades to an empty vec.
pub async fn collect(ip_path: &str) -> Vec<NeighborEntry> {
    let output = match Command::new(ip_path).arg("neigh").output().await {
        Ok(out) if out.status.success() => out,
        Ok(out) => {
            tracing::warn!(
                status = out.status.code(),
                "Neighbor table query failed, continuing with empty set"
            );
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Neighbor table query unavailable");
            return Vec::new();
        }
    };

    parse_table(&String::from_utf8_lossy(&output.stdout))
}

fn parse_table(output: &str) -> Vec<NeighborEntry> {
    output.lines().filter_map(NeighborEntry::parse).collect()
}
