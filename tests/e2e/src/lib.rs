//! End-to-end harness: a real central server on an ephemeral port, field
//! units built in-process, sensors talking loopback UDP.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use central_server::{server, CentralConfig, ReportLog, SenderReport};
use field_unit::{FieldUnit, FieldUnitConfig, HttpCollector};
use sensor_sim::{Sensor, SensorConfig, SendSummary, UdpTransmitter};
use tokio::net::{TcpListener, UdpSocket};
use tracing::debug;

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

pub struct CentralHarness {
    pub base_url: String,
    pub reports: ReportLog,
}

impl CentralHarness {
    pub async fn start() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let config = CentralConfig {
            port: addr.port(),
            report_history: 16,
            queue_depth: 256,
        };
        let (app, reports) = server::build(&config);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("central harness stopped: {e}");
            }
        });
        debug!("central harness on {addr}");
        Ok(Self {
            base_url: format!("http://{addr}"),
            reports,
        })
    }

    /// Poll until `n` reports exist or `deadline` passes.
    pub async fn wait_for_reports(&self, n: usize, deadline: Duration) -> Vec<SenderReport> {
        let started = tokio::time::Instant::now();
        loop {
            let snap = self.reports.snapshot().await;
            if snap.len() >= n || started.elapsed() >= deadline {
                return snap;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// A field unit wired to the harness, plus the UDP socket it will receive on.
pub async fn field_unit(
    central: &CentralHarness,
    unit_id: &str,
    window: usize,
    timeout_ms: u64,
) -> anyhow::Result<(FieldUnit<HttpCollector>, UdpSocket, SocketAddr)> {
    let socket = UdpSocket::bind("127.0.0.1:0").await?;
    let addr = socket.local_addr()?;

    let config = FieldUnitConfig::new(addr.port(), &central.base_url)?
        .with_window(window)?
        .with_timeout_ms(timeout_ms)?
        .with_unit_id(unit_id);
    let collector = HttpCollector::new(&central.base_url, unit_id, Duration::from_secs(2))?;
    Ok((FieldUnit::new(config, collector), socket, addr))
}

/// Run a sensor transmission on a blocking thread.
pub async fn run_sensor(
    addr: SocketAddr,
    count: u32,
    drop: Vec<u32>,
) -> anyhow::Result<SendSummary> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<SendSummary> {
        let tx = UdpTransmitter::new(&addr.ip().to_string(), addr.port())?;
        let sensor = Sensor::new(tx, &SensorConfig::default())?.with_dropped(drop);
        Ok(sensor.run(count))
    })
    .await
    .context("sensor thread panicked")?
}
