//! CLI entry point for the lanwatch network scanner.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use lanwatch_core::EventBus;

use lanwatch_scan::config::ScanConfig;
use lanwatch_scan::registry::{DeviceRegistry, RegistryPolicy};
use lanwatch_scan::scanner::ScanOrchestrator;
use lanwatch_scan::scheduler::Scheduler;

#[derive(Parser)]
#[command(name = "lanwatch-scan")]
#[command(about = "LAN device discovery and session tracking")]
struct Cli {
    /// Target CIDR (e.g., 192.168.1.0/24). Overrides config and
    /// auto-detection.
    #[arg(short = 't', long)]
    cidr: Option<String>,

    /// Run a single scan cycle, print the device table as JSON, and exit.
    #[arg(long)]
    once: bool,

    /// Run as daemon with periodic scanning and reaping.
    #[arg(long)]
    daemon: bool,

    /// Config file prefix (default: lanwatch).
    #[arg(short, long, default_value = "lanwatch")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let mut scan_config = load_scan_config(&cli.config)?;
    if cli.cidr.is_some() {
        scan_config.cidr = cli.cidr.clone();
    }

    let bus = EventBus::default();
    let registry = Arc::new(DeviceRegistry::new(
        bus.clone(),
        RegistryPolicy::from_config(&scan_config),
    ));
    let orchestrator = Arc::new(ScanOrchestrator::new(scan_config.clone(), registry.clone()));

    if cli.once {
        let summary = orchestrator.scan_once().await?;
        registry.reap().await;
        let devices = registry.all().await;
        tracing::info!(
            scan_id = %summary.scan_id,
            devices = devices.len(),
            "One-shot scan complete"
        );
        println!("{}", serde_json::to_string_pretty(&devices)?);
    } else if cli.daemon {
        // Log every registry event; independent subscribers (SSE
        // bridges, billing hooks) attach the same way.
        let mut events = bus.subscribe();
        tokio::spawn(async move {
            while let Ok(ev) = events.recv().await {
                tracing::info!(
                    event = ?ev.kind,
                    id = %ev.device.id,
                    ip = %ev.device.ip,
                    online = ev.device.online,
                    "Device event"
                );
            }
        });

        let (scheduler, _handle) = Scheduler::new(scan_config, orchestrator, registry);
        scheduler.run().await;
    } else {
        anyhow::bail!("Specify --once (one-shot scan) or --daemon (periodic scanning)");
    }

    Ok(())
}

fn load_scan_config(file_prefix: &str) -> anyhow::Result<ScanConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("LANWATCH_SCAN")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<ScanConfig>("scan") {
        Ok(c) => Ok(c),
        Err(_) => Ok(ScanConfig::default()),
    }
}
