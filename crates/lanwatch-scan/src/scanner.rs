//! Scan orchestrator: one full discovery cycle.
//!
//! enumerate → probe → collect neighbors → filter by recently-seen state
//! → enrich → emit sightings to the registry, streaming as each address
//! completes. Nothing inside a cycle aborts it; every external failure
//! degrades to an absent field or an empty set.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;
use uuid::Uuid;

use lanwatch_core::Sighting;

use crate::config::ScanConfig;
use crate::enrich::Enrichers;
use crate::error::Result;
use crate::neighbor;
use crate::pool;
use crate::probe::Prober;
use crate::range;
use crate::registry::DeviceRegistry;

/// Outcome of one scan cycle, for logging and the manual-trigger reply.
#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub scan_id: Uuid,
    pub cidr: String,
    pub probed: usize,
    pub reachable: usize,
    pub sightings: usize,
    pub duration_ms: u64,
}

pub struct ScanOrchestrator {
    config: ScanConfig,
    prober: Prober,
    enrichers: Enrichers,
    registry: Arc<DeviceRegistry>,
    /// Auto-detected range, resolved once per process on first need.
    detected_cidr: OnceCell<String>,
}

impl ScanOrchestrator {
    pub fn new(config: ScanConfig, registry: Arc<DeviceRegistry>) -> Self {
        let prober = Prober::new(&config.probe);
        let enrichers = Enrichers::new(config.enrich.clone());
        Self {
            config,
            prober,
            enrichers,
            registry,
            detected_cidr: OnceCell::new(),
        }
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    /// Run one full scan cycle. Errors here (`InvalidCidr`,
    /// `RangeDetectionFailed`) are fatal to this cycle only.
    pub async fn scan_once(&self) -> Result<CycleSummary> {
        let scan_id = Uuid::new_v4();
        let start = Instant::now();

        let cidr = self.resolve_cidr().await?;
        let hosts = range::enumerate_hosts(&cidr)?;

        tracing::info!(scan_id = %scan_id, cidr = %cidr, hosts = hosts.len(), "Starting scan cycle");

        // The sweep both measures latency and refreshes the kernel
        // neighbor table that the collector reads next.
        let latency = self.prober.sweep(&hosts).await;
        let reachable = latency.values().filter(|rtt| rtt.is_some()).count();

        let entries: Vec<_> = neighbor::collect(&self.config.ip_path)
            .await
            .into_iter()
            .filter(neighbor::NeighborEntry::recently_seen)
            .collect();
        let sightings = entries.len();

        // Enrich under the smaller pool and hand each sighting to the
        // registry as soon as it is ready; completion order is arbitrary
        // and the registry merge is order-independent.
        pool::run(entries, self.config.enrich.concurrency, |entry| {
            let rtt_ms = latency.get(&entry.ip).copied().flatten();
            async move {
                let enriched = self.enrichers.enrich(entry.ip, entry.mac.as_deref()).await;
                let sighting = Sighting {
                    ip: entry.ip,
                    mac: entry.mac,
                    rtt_ms,
                    hostname: enriched.hostname,
                    vendor: enriched.vendor,
                    netbios: enriched.netbios,
                    os_guess: enriched.os_guess,
                };
                self.registry.apply_sighting(sighting).await;
            }
        })
        .await;

        let summary = CycleSummary {
            scan_id,
            cidr,
            probed: hosts.len(),
            reachable,
            sightings,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            scan_id = %summary.scan_id,
            cidr = %summary.cidr,
            probed = summary.probed,
            reachable = summary.reachable,
            sightings = summary.sightings,
            duration_ms = summary.duration_ms,
            "Scan cycle complete"
        );

        Ok(summary)
    }

    /// The active CIDR: explicit config wins; otherwise auto-detect once
    /// and cache for the process lifetime. Detection failure fails this
    /// cycle only and is retried on the next.
    async fn resolve_cidr(&self) -> Result<String> {
        if let Some(cidr) = &self.config.cidr {
            return Ok(cidr.clone());
        }
        self.detected_cidr
            .get_or_try_init(|| async {
                range::detect_local_cidr(&self.config.ip_path, self.config.interface.as_deref())
                    .await
            })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanwatch_core::EventBus;

    use crate::error::ScanError;
    use crate::registry::RegistryPolicy;

    fn orchestrator(config: ScanConfig) -> ScanOrchestrator {
        let registry = Arc::new(DeviceRegistry::new(
            EventBus::new(8),
            RegistryPolicy::from_config(&config),
        ));
        ScanOrchestrator::new(config, registry)
    }

    #[tokio::test]
    async fn invalid_configured_cidr_fails_the_cycle_only() {
        let config = ScanConfig {
            cidr: Some("bogus/99".to_string()),
            ..ScanConfig::default()
        };
        let orch = orchestrator(config);
        assert!(matches!(
            orch.scan_once().await,
            Err(ScanError::InvalidCidr { .. })
        ));
        // The orchestrator stays usable for the next cycle.
        assert!(orch.registry().is_empty().await);
    }

    #[tokio::test]
    async fn detection_failure_is_reported_not_fatal() {
        let config = ScanConfig {
            cidr: None,
            ip_path: "/nonexistent/ip".to_string(),
            ..ScanConfig::default()
        };
        let orch = orchestrator(config);
        assert!(matches!(
            orch.scan_once().await,
            Err(ScanError::RangeDetectionFailed(_))
        ));
    }

    #[tokio::test]
    async fn cycle_with_no_neighbors_produces_no_devices() {
        // A /32 with unreachable tooling: sweep finds nothing, collector
        // degrades to empty, the cycle still completes.
        let mut config = ScanConfig {
            cidr: Some("192.0.2.1/32".to_string()),
            ip_path: "/nonexistent/ip".to_string(),
            ..ScanConfig::default()
        };
        config.probe.ping_path = "/nonexistent/ping".to_string();
        config.probe.timeout_ms = 50;
        config.probe.jitter_ms = 0;

        let orch = orchestrator(config);
        let summary = orch.scan_once().await.unwrap();
        assert_eq!(summary.probed, 1);
        assert_eq!(summary.reachable, 0);
        assert_eq!(summary.sightings, 0);
        assert!(orch.registry().is_empty().await);
    }
}
