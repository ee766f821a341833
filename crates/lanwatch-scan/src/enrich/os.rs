//! OS fingerprinting via `nmap -O`, scoped to one address.

use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

/// Fingerprint one address. Requires a privileged nmap; any failure
/// (tool missing, non-zero exit, timeout, no matching output line)
/// yields `None`.
pub async fn fingerprint(nmap_path: &str, ip: Ipv4Addr, tool_timeout: Duration) -> Option<String> {
    let mut cmd = Command::new(nmap_path);
    cmd.args(["-O", "--max-retries", "1", "-Pn"])
        .arg(ip.to_string())
        .kill_on_drop(true);

    match timeout(tool_timeout, cmd.output()).await {
        Ok(Ok(output)) if output.status.success() => {
            parse_os_line(&String::from_utf8_lossy(&output.stdout))
        }
        _ => None,
    }
}

/// Prefer the specific `OS details:` line, falling back to `Running:`.
fn parse_os_line(output: &str) -> Option<String> {
    let labeled = |label: &str| {
        output
            .lines()
            .find_map(|line| line.strip_prefix(label))
            .map(|rest| rest.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    labeled("OS details:").or_else(|| labeled("Running:"))
}
