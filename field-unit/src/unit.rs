//! Field unit cycle: receive → report gaps → smooth → relay, strictly in
//! sequence. The next transmission is not received until the previous one
//! has been relayed.

use relay_types::report::clock;
use relay_types::{smoothing, BatchReport};
use tracing::{info, warn};

use crate::config::FieldUnitConfig;
use crate::receiver::{self, ReceiveCycle, ReceiveError, ReceiveState};
use crate::relay::{CentralCollector, Relay, RelaySummary};

/// What one cycle did.
#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub state: ReceiveState,
    /// `None` when nothing was received
    pub report: Option<BatchReport>,
    pub series: Vec<f32>,
    pub relay: RelaySummary,
}

pub struct FieldUnit<C> {
    config: FieldUnitConfig,
    relay: Relay<C>,
}

impl<C: CentralCollector> FieldUnit<C> {
    pub fn new(config: FieldUnitConfig, collector: C) -> Self {
        Self {
            config,
            relay: Relay::new(collector),
        }
    }

    pub fn config(&self) -> &FieldUnitConfig {
        &self.config
    }

    /// Serve transmissions forever. Only a socket error ends the loop.
    pub async fn run(&self) -> Result<(), ReceiveError> {
        loop {
            self.run_cycle().await?;
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleSummary, ReceiveError> {
        let cycle = receiver::receive_batch(self.config.listen_addr(), self.config.timeout).await?;
        Ok(self.process(cycle).await)
    }

    /// Everything after reception: stats, smoothing, relay.
    pub async fn process(&self, cycle: ReceiveCycle) -> CycleSummary {
        let ReceiveCycle {
            state,
            mut batch,
            malformed,
            rejected,
        } = cycle;

        if malformed + rejected > 0 {
            warn!(
                "[Field Unit] {malformed} malformed and {rejected} rejected datagrams this cycle"
            );
        }

        if batch.is_empty() {
            info!("[Field Unit] No messages received, waiting again...");
            return CycleSummary {
                state,
                report: None,
                series: Vec::new(),
                relay: RelaySummary::default(),
            };
        }

        let report = BatchReport::from_batch(&batch);
        log_report(&report);

        info!("[Field Unit] Computing SMAs (window {})", self.config.window);
        let series = smoothing::moving_average(batch.messages_mut(), self.config.window);

        info!("[Field Unit] Sending {} SMAs to central server", series.len());
        let relay = self.relay.send(&series).await;
        if !relay.failed.is_empty() {
            warn!(
                "[Field Unit] {} of {} SMAs not delivered",
                relay.failed.len(),
                series.len()
            );
        }

        CycleSummary {
            state,
            report: Some(report),
            series,
            relay,
        }
    }
}

fn log_report(report: &BatchReport) {
    let gaps = &report.gaps;
    info!(
        "[Field Unit] Total Missing Messages = {} out of {}",
        gaps.missing_count, gaps.expected
    );
    if !report.is_complete() {
        info!("[Field Unit] Missing sequence numbers: {}", report.missing_list());
    }
    if let (Some(first), Some(last), Some(ms)) =
        (report.first_arrival, report.last_arrival, report.elapsed_ms)
    {
        info!(
            "[Field Unit] First {} | Last {} | Duration {ms} ms",
            clock(first),
            clock(last)
        );
    }
}
