//! # aggregator
//!
//! Central-side batch tracking for relayed results.
//!
//! ## Architecture
//! HTTP handlers never touch batch state. They push each call onto an mpsc
//! queue, and a single Tokio task ([`run_aggregator`]) owns the
//! [`CentralAggregator`]. Batches are keyed by the calling field unit, so two
//! units relaying at the same time never share a batch.
//!
//! Completion follows the same rules as the field unit: sequence 1 starts a
//! batch, the batch closes once every declared message has arrived, and the
//! sender's slot is cleared right after the report.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use relay_types::report::clock;
use relay_types::{AddOutcome, Batch, BatchReport, Message};
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

/// One remote call, as queued by the HTTP handler.
#[derive(Debug)]
pub struct Inbound {
    pub sender: String,
    pub msg: Message,
    pub at: DateTime<Utc>,
}

/// A completed batch, tagged with the field unit that relayed it.
#[derive(Debug, Clone, Serialize)]
pub struct SenderReport {
    pub sender: String,
    #[serde(flatten)]
    pub report: BatchReport,
}

// ── Aggregator ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct CentralAggregator {
    batches: HashMap<String, Batch>,
}

impl CentralAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one relayed message. Returns the report when this message
    /// completed the sender's batch.
    pub fn receive(
        &mut self,
        sender: &str,
        msg: Message,
        at: DateTime<Utc>,
    ) -> Option<BatchReport> {
        // Relayed messages arrive in order, so sequence 1 always restarts
        let batch = self
            .batches
            .entry(sender.to_string())
            .or_insert_with(Batch::strict);

        match batch.add_at(msg, at) {
            Ok(AddOutcome::Restarted { discarded }) => {
                warn!(
                    "[Central Server] {sender} restarted its batch; \
                     {discarded} pending messages discarded"
                );
            }
            Ok(_) => {}
            Err(e) => {
                warn!("[Central Server] Rejected message from {sender}: {e}");
                if batch.is_empty() {
                    self.batches.remove(sender);
                }
                return None;
            }
        }

        info!(
            "[Central Server] Received message {} out of {} from {sender}. Measure = {} | time={}",
            msg.sequence_number,
            msg.total_count,
            msg.value,
            clock(at)
        );

        if !batch.is_complete() {
            return None;
        }

        let closed = batch.take();
        self.batches.remove(sender);
        let report = BatchReport::from_batch(&closed);
        log_report(sender, &report);
        debug!("[Central Server] {} batches still open", self.open_batches());
        Some(report)
    }

    /// Messages held for `sender`'s open batch.
    pub fn pending(&self, sender: &str) -> usize {
        self.batches.get(sender).map_or(0, Batch::len)
    }

    /// Senders with an open batch.
    pub fn open_batches(&self) -> usize {
        self.batches.len()
    }
}

fn log_report(sender: &str, report: &BatchReport) {
    let gaps = &report.gaps;
    info!(
        "[Central Server] {sender}: Total Missing Messages = {} out of {} ({} received)",
        gaps.missing_count, gaps.expected, gaps.received
    );
    if !report.is_complete() {
        info!("[Central Server] Missing sequence numbers: {}", report.missing_list());
    }
    if let (Some(first), Some(last)) = (report.first_arrival, report.last_arrival) {
        info!("[Central Server] First received: {}", clock(first));
        info!("[Central Server] Last received : {}", clock(last));
    }
    if let Some(ms) = report.elapsed_ms {
        info!("[Central Server] Duration      : {ms} ms");
    }
}

// ── Report history ────────────────────────────────────────────────────────────

/// Most recent completed batches, newest last.
#[derive(Clone)]
pub struct ReportLog {
    entries: Arc<RwLock<VecDeque<SenderReport>>>,
    capacity: usize,
}

impl ReportLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub async fn push(&self, entry: SenderReport) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.write().await;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub async fn snapshot(&self) -> Vec<SenderReport> {
        self.entries.read().await.iter().cloned().collect()
    }
}

// ── Aggregator task ───────────────────────────────────────────────────────────

/// Drain the inbound queue until every sender handle is dropped.
pub async fn run_aggregator(mut inbound: mpsc::Receiver<Inbound>, reports: ReportLog) {
    let mut aggregator = CentralAggregator::new();
    while let Some(Inbound { sender, msg, at }) = inbound.recv().await {
        if let Some(report) = aggregator.receive(&sender, msg, at) {
            reports.push(SenderReport { sender, report }).await;
        }
    }
    debug!("[Central Server] Inbound queue closed; aggregator stopping");
}
