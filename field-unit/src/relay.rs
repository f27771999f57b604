//! # relay
//!
//! Pushes a smoothed series to the central server, one remote call per value.
//!
//! Each value travels as its own [`Message`] with `total_count = series.len()`
//! and `sequence_number = index + 1`. Delivery is best-effort and at most
//! once per element: a failed call is logged and the remaining elements are
//! still attempted. Nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use relay_types::rpc::{HEALTH_PATH, RECEIVE_PATH, SENDER_HEADER};
use relay_types::Message;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("remote call failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("central server rejected the call with status {status}")]
    Rejected { status: u16 },
}

/// The collector side of the remote call.
#[async_trait]
pub trait CentralCollector: Send + Sync {
    async fn receive(&self, msg: &Message) -> Result<(), RelayError>;
}

// ── HTTP collector ────────────────────────────────────────────────────────────

/// Calls `POST {base}/receive` on the central server.
pub struct HttpCollector {
    client: reqwest::Client,
    base_url: String,
    unit_id: String,
}

impl HttpCollector {
    pub fn new(base_url: &str, unit_id: &str, call_timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder().timeout(call_timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            unit_id: unit_id.to_string(),
        })
    }

    /// Build the collector and check once that the central server answers.
    /// An unreachable server is logged, not fatal: each relay call then fails
    /// on its own.
    pub async fn connect(
        base_url: &str,
        unit_id: &str,
        call_timeout: Duration,
    ) -> Result<Self, RelayError> {
        let collector = Self::new(base_url, unit_id, call_timeout)?;
        match collector.probe().await {
            Ok(()) => info!(
                "[Field Unit] Connected to central server at {}",
                collector.base_url
            ),
            Err(e) => warn!(
                "[Field Unit] Central server at {} not reachable yet: {e}",
                collector.base_url
            ),
        }
        Ok(collector)
    }

    pub async fn probe(&self) -> Result<(), RelayError> {
        let url = format!("{}{HEALTH_PATH}", self.base_url);
        let status = self.client.get(url).send().await?.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(RelayError::Rejected { status: status.as_u16() })
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CentralCollector for HttpCollector {
    async fn receive(&self, msg: &Message) -> Result<(), RelayError> {
        let url = format!("{}{RECEIVE_PATH}", self.base_url);
        let status = self
            .client
            .post(url)
            .header(SENDER_HEADER, &self.unit_id)
            .json(msg)
            .send()
            .await?
            .status();

        if status.is_success() {
            Ok(())
        } else {
            Err(RelayError::Rejected { status: status.as_u16() })
        }
    }
}

// ── Relay ─────────────────────────────────────────────────────────────────────

/// Delivery outcome for one series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelaySummary {
    pub sent: u32,
    /// Sequence numbers whose call failed
    pub failed: Vec<u32>,
}

pub struct Relay<C> {
    collector: C,
}

impl<C: CentralCollector> Relay<C> {
    pub fn new(collector: C) -> Self {
        Self { collector }
    }

    pub fn collector(&self) -> &C {
        &self.collector
    }

    pub async fn send(&self, series: &[f32]) -> RelaySummary {
        let mut summary = RelaySummary::default();
        let total = series.len() as u32;

        for (i, &value) in series.iter().enumerate() {
            let msg = Message::new(total, i as u32 + 1, value);
            match self.collector.receive(&msg).await {
                Ok(()) => {
                    debug!("[Field Unit] Relayed {msg}");
                    summary.sent += 1;
                }
                Err(e) => {
                    warn!(
                        "[Field Unit] Relay error for message {}: {e}",
                        msg.sequence_number
                    );
                    summary.failed.push(msg.sequence_number);
                }
            }
        }
        summary
    }
}
