//! Scan and reap scheduling.
//!
//! Drives the orchestrator on a fixed interval plus on-demand triggers,
//! and runs the registry reap pass on its own cadence. Cycle failures are
//! logged and swallowed; the timers never stop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::config::ScanConfig;
use crate::registry::DeviceRegistry;
use crate::scanner::ScanOrchestrator;

/// Handle for requesting an out-of-band scan cycle. A manual trigger
/// does not cancel an in-flight timer-driven cycle; it queues one more.
#[derive(Clone)]
pub struct ScanHandle {
    tx: mpsc::Sender<()>,
}

impl ScanHandle {
    /// Request one scan cycle. Returns `false` when the scheduler is
    /// gone or the trigger queue is full.
    pub fn request_scan(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

pub struct Scheduler {
    config: ScanConfig,
    orchestrator: Arc<ScanOrchestrator>,
    registry: Arc<DeviceRegistry>,
    trigger_rx: mpsc::Receiver<()>,
}

impl Scheduler {
    pub fn new(
        config: ScanConfig,
        orchestrator: Arc<ScanOrchestrator>,
        registry: Arc<DeviceRegistry>,
    ) -> (Self, ScanHandle) {
        let (tx, trigger_rx) = mpsc::channel(4);
        (
            Self {
                config,
                orchestrator,
                registry,
                trigger_rx,
            },
            ScanHandle { tx },
        )
    }

    /// Run forever: reap loop on its own task, scan loop in this one.
    pub async fn run(mut self) {
        let reap_registry = self.registry.clone();
        let reap_every = Duration::from_secs(self.config.reap_interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = interval(reap_every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let reaped = reap_registry.reap().await;
                if reaped > 0 {
                    tracing::info!(reaped, "Reap pass complete");
                }
            }
        });

        let mut ticker = interval(Duration::from_secs(self.config.scan_interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            scan_interval_secs = self.config.scan_interval_secs,
            reap_interval_secs = self.config.reap_interval_secs,
            "Scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => self.cycle("timer").await,
                Some(()) = self.trigger_rx.recv() => self.cycle("manual").await,
            }
        }
    }

    async fn cycle(&self, trigger: &str) {
        match self.orchestrator.scan_once().await {
            Ok(summary) => {
                tracing::debug!(scan_id = %summary.scan_id, trigger, "Cycle finished");
            }
            Err(e) => {
                // Fatal to this cycle only; the next tick retries.
                tracing::error!(trigger, error = %e, "Scan cycle failed");
            }
        }
    }
}
