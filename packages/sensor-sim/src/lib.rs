//! # sensor-sim
//!
//! Data source for the telemetry relay. Generates `count` random readings and
//! sends them to a field unit as numbered datagrams `1..=count`, all declaring
//! the same total.
//!
//! Send failures are logged and skipped; the sensor never retries and never
//! panics on a network error.

pub mod config;
pub mod udp_tx;

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use relay_types::report::clock;
use relay_types::Message;
use thiserror::Error;
use tracing::{info, warn};

pub use config::{MeasurementConfig, SensorConfig, TransmissionConfig};
pub use udp_tx::UdpTransmitter;

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("could not resolve {address}: {source}")]
    Resolve {
        address: String,
        source: std::io::Error,
    },

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("message size {size} exceeds buffer size {max}")]
    Oversized { size: usize, max: usize },

    #[error("invalid measurement range [{min}, {max})")]
    InvalidRange { min: f32, max: f32 },

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}

/// Outcome of one transmission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendSummary {
    pub sent: u32,
    /// Deliberately withheld (simulated loss)
    pub skipped: Vec<u32>,
    /// Send attempted and failed
    pub failed: Vec<u32>,
}

pub struct Sensor {
    transmitter: UdpTransmitter,
    measurement: MeasurementConfig,
    interval: Duration,
    drop: BTreeSet<u32>,
}

impl Sensor {
    pub fn new(transmitter: UdpTransmitter, config: &SensorConfig) -> Result<Self, SensorError> {
        config.validate()?;
        Ok(Self {
            transmitter,
            measurement: config.measurement,
            interval: Duration::from_millis(config.transmission.interval_ms),
            drop: BTreeSet::new(),
        })
    }

    /// Withhold these sequence numbers to simulate datagram loss.
    pub fn with_dropped(mut self, seqs: impl IntoIterator<Item = u32>) -> Self {
        self.drop.extend(seqs);
        self
    }

    pub fn measurement(&self) -> f32 {
        let MeasurementConfig { min, max } = self.measurement;
        rand::thread_rng().gen_range(min..max)
    }

    /// Send `count` messages, blocking for the configured interval between sends.
    pub fn run(&self, count: u32) -> SendSummary {
        let mut summary = SendSummary::default();
        let mut first_sent = None;
        let mut last_sent = None;

        for seq in 1..=count {
            let value = self.measurement();
            if self.drop.contains(&seq) {
                info!("[Sensor] Dropping message {seq} out of {count}");
                summary.skipped.push(seq);
            } else {
                let msg = Message::new(count, seq, value);
                match self.transmitter.send_message(&msg) {
                    Ok(_) => {
                        let now = Utc::now();
                        first_sent.get_or_insert(now);
                        last_sent = Some(now);
                        summary.sent += 1;
                        info!(
                            "[Sensor] Sending message {seq} out of {count}. \
                             Measure = {value} | time={}",
                            clock(now)
                        );
                    }
                    Err(e) => {
                        warn!("[Sensor] Error sending message {seq}: {e}");
                        summary.failed.push(seq);
                    }
                }
            }

            if seq < count && !self.interval.is_zero() {
                std::thread::sleep(self.interval);
            }
        }

        if let (Some(first), Some(last)) = (first_sent, last_sent) {
            info!("[Sensor] First sent : {}", clock(first));
            info!("[Sensor] Last sent  : {}", clock(last));
            info!("[Sensor] Duration   : {} ms", (last - first).num_milliseconds());
        }
        summary
    }
}
