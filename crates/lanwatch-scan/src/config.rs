//! Configuration for the lanwatch network scanner.

use serde::Deserialize;

/// Top-level scan configuration.
///
/// Loaded from `lanwatch.toml` `[scan]` section or `LANWATCH_SCAN__`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Target CIDR (e.g., "192.168.1.0/24"). When unset the local range
    /// is auto-detected once and cached for the process lifetime.
    #[serde(default)]
    pub cidr: Option<String>,

    /// Network interface to auto-detect the range from.
    #[serde(default)]
    pub interface: Option<String>,

    /// Path to the `ip` binary used for range detection and the
    /// neighbor-table query.
    #[serde(default = "default_ip_path")]
    pub ip_path: String,

    /// Seconds between timer-driven scan cycles.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Seconds between registry reap passes.
    #[serde(default = "default_reap_interval")]
    pub reap_interval_secs: u64,

    /// An online device unseen for this long is reaped offline.
    #[serde(default = "default_offline_timeout")]
    pub offline_timeout_secs: u64,

    /// Whether the reap pass also closes sessions whose offer boundary
    /// has elapsed, independent of inactivity.
    #[serde(default = "default_true")]
    pub enforce_offer_expiry: bool,

    /// Offer code assigned to newly discovered devices.
    #[serde(default = "default_offer")]
    pub default_offer: String,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub enrich: EnrichConfig,
}

/// Reachability prober settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Path to the ping binary.
    #[serde(default = "default_ping_path")]
    pub ping_path: String,

    /// Maximum probes in flight.
    #[serde(default = "default_probe_concurrency")]
    pub concurrency: usize,

    /// Per-probe timeout, enforced by the caller.
    #[serde(default = "default_probe_timeout")]
    pub timeout_ms: u64,

    /// Sleep between probes on each worker, to avoid bursting.
    #[serde(default = "default_probe_jitter")]
    pub jitter_ms: u64,
}

/// Identity enricher settings. Each resolver is individually toggled.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichConfig {
    /// Maximum addresses enriched concurrently. Smaller than the probe
    /// pool because each enrichment can spawn external tools.
    #[serde(default = "default_enrich_concurrency")]
    pub concurrency: usize,

    /// System reverse lookup.
    #[serde(default = "default_true")]
    pub reverse_dns: bool,

    /// Link-local (mDNS) reverse resolution.
    #[serde(default = "default_true")]
    pub link_local: bool,

    /// Legacy NetBIOS name lookup via `nmblookup`.
    #[serde(default)]
    pub netbios: bool,

    /// OS fingerprint via `nmap -O` (requires privileges).
    #[serde(default)]
    pub os_fingerprint: bool,

    #[serde(default = "default_avahi_path")]
    pub avahi_path: String,

    #[serde(default = "default_nmblookup_path")]
    pub nmblookup_path: String,

    #[serde(default = "default_nmap_path")]
    pub nmap_path: String,

    /// Timeout for the link-local first-responder race.
    #[serde(default = "default_link_local_timeout")]
    pub link_local_timeout_ms: u64,

    /// Timeout for each external tool invocation.
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_ms: u64,
}

fn default_ip_path() -> String {
    "ip".to_string()
}

fn default_scan_interval() -> u64 {
    10
}

fn default_reap_interval() -> u64 {
    30
}

fn default_offline_timeout() -> u64 {
    30
}

fn default_offer() -> String {
    "1H".to_string()
}

fn default_ping_path() -> String {
    "ping".to_string()
}

fn default_probe_concurrency() -> usize {
    64
}

fn default_probe_timeout() -> u64 {
    1000
}

fn default_probe_jitter() -> u64 {
    5
}

fn default_enrich_concurrency() -> usize {
    16
}

fn default_avahi_path() -> String {
    "avahi-resolve-address".to_string()
}

fn default_nmblookup_path() -> String {
    "nmblookup".to_string()
}

fn default_nmap_path() -> String {
    "nmap".to_string()
}

fn default_link_local_timeout() -> u64 {
    1000
}

fn default_tool_timeout() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            cidr: None,
            interface: None,
            ip_path: default_ip_path(),
            scan_interval_secs: default_scan_interval(),
            reap_interval_secs: default_reap_interval(),
            offline_timeout_secs: default_offline_timeout(),
            enforce_offer_expiry: true,
            default_offer: default_offer(),
            probe: ProbeConfig::default(),
            enrich: EnrichConfig::default(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ping_path: default_ping_path(),
            concurrency: default_probe_concurrency(),
            timeout_ms: default_probe_timeout(),
            jitter_ms: default_probe_jitter(),
        }
    }
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            concurrency: default_enrich_concurrency(),
            reverse_dns: true,
            link_local: true,
            netbios: false,
            os_fingerprint: false,
            avahi_path: default_avahi_path(),
            nmblookup_path: default_nmblookup_path(),
            nmap_path: default_nmap_path(),
            link_local_timeout_ms: default_link_local_timeout(),
            tool_timeout_ms: default_tool_timeout(),
        }
    }
}
