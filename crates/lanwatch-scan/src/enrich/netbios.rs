//! Legacy NetBIOS name lookup via `nmblookup -A`.

use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

/// Query the NetBIOS node status of one address. Tool missing, non-zero
/// exit, timeout, or parse miss all yield `None`.
pub async fn lookup(nmblookup_path: &str, ip: Ipv4Addr, tool_timeout: Duration) -> Option<String> {
    let mut cmd = Command::new(nmblookup_path);
    cmd.arg("-A").arg(ip.to_string()).kill_on_drop(true);

    match timeout(tool_timeout, cmd.output()).await {
        Ok(Ok(output)) if output.status.success() => {
            parse_node_status(&String::from_utf8_lossy(&output.stdout))
        }
        _ => None,
    }
}

/// Take the first unique `<00>` workstation name from `nmblookup -A`
/// output:
///
/// ```text
/// Looking up status of 192.168.1.20
///         DESKTOP-A1B2C3  <00> -         B <ACTIVE>
///         WORKGROUP       <00> - <GROUP> B <ACTIVE>
/// ```
fn parse_node_status(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains("<00>") && !line.contains("<GROUP>"))
        .and_then(|line| line.split_whitespace().next())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Looking up status of 192.168.1.20\n\
\tDESKTOP-A1B2C3  <00> -         B <ACTIVE>\n\
\tDESKTOP-A1B2C3  <20> -         B <ACTIVE>\n\
\tWORKGROUP       <00> - <GROUP> B <ACTIVE>\n\n\
\tMAC Address = AA-BB-CC-DD-EE-FF\n";

    #[test]
    fn takes_unique_name_not_group() {
        assert_eq!(parse_node_status(SAMPLE).as_deref(), Some("DESKTOP-A1B2C3"));
    }

    #[test]
    fn no_name_table_is_none() {
        assert_eq!(
            parse_node_status("No reply from 192.168.1.20\n"),
            None
        );
        assert_eq!(parse_node_status(""), None);
    }

    #[tokio::test]
    async fn missing_tool_is_none() {
        let result = lookup(
            "/nonexistent/nmblookup",
            "192.0.2.1".parse().unwrap(),
            Duration::from_millis(100),
        )
        .await;
        assert!(result.is_none());
    }
}
