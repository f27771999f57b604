use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use field_unit::{FieldUnit, FieldUnitConfig, HttpCollector};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "field-unit", about = "Telemetry relay field unit")]
struct Args {
    /// UDP port to receive sensor datagrams on
    port: u16,
    /// Central server host, host:port or URL
    central_address: String,
    /// Receive timeout in milliseconds (ends a transmission)
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Moving-average window
    #[arg(long)]
    window: Option<usize>,
    /// Name sent to the central server with every relayed message
    #[arg(long)]
    id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "field_unit=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = FieldUnitConfig::new(args.port, &args.central_address)?;
    if let Some(ms) = args.timeout_ms {
        config = config.with_timeout_ms(ms)?;
    }
    if let Some(window) = args.window {
        config = config.with_window(window)?;
    }
    if let Some(id) = args.id {
        config = config.with_unit_id(id);
    }

    info!(
        "🛰  Field Unit '{}' starting on UDP :{}, timeout {}ms, window {}",
        config.unit_id,
        config.port,
        config.timeout.as_millis(),
        config.window
    );

    let collector =
        HttpCollector::connect(&config.central_url, &config.unit_id, config.relay_timeout)
            .await
            .context("building central server client")?;
    info!("[Field Unit] Relaying to {}", collector.base_url());

    let unit = FieldUnit::new(config, collector);
    if let Err(e) = unit.run().await {
        error!("[Field Unit] Socket error: {e}");
        return Err(e).context("receive loop stopped");
    }
    Ok(())
}
