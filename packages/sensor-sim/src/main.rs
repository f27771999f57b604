//! main.rs — Sensor entry point
//!
//! Sends one numbered transmission of random readings to a field unit over
//! UDP, then exits.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use sensor_sim::{Sensor, SensorConfig, UdpTransmitter};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sensor", about = "Telemetry relay measurement source")]
struct Args {
    /// Field unit address
    field_unit_address: String,
    /// Field unit UDP port
    port: u16,
    /// Number of measurements to send
    number_of_measures: u32,
    /// Config file path
    #[arg(short, long, default_value = "sensor.toml")]
    config: PathBuf,
    /// Pause between datagrams in milliseconds (overrides config)
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Withhold these sequence numbers (simulated loss)
    #[arg(long = "drop", value_delimiter = ',')]
    drop: Vec<u32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sensor=info,sensor_sim=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut cfg = SensorConfig::load(&args.config).context("loading sensor config")?;
    if let Some(ms) = args.interval_ms {
        cfg.transmission.interval_ms = ms;
    }

    let transmitter = UdpTransmitter::new(&args.field_unit_address, args.port)
        .context("building UDP transmitter")?;
    info!(
        "📡 Sensor sending {} measures to {}",
        args.number_of_measures,
        transmitter.dest()
    );

    let sensor = Sensor::new(transmitter, &cfg)?.with_dropped(args.drop);
    let summary = sensor.run(args.number_of_measures);

    info!(
        "Sensor done: {} sent, {} dropped, {} failed",
        summary.sent,
        summary.skipped.len(),
        summary.failed.len()
    );
    Ok(())
}
