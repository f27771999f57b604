use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::batch::Batch;
use crate::gaps::GapReport;

/// Statistics for one closed batch, produced by both the field unit and the
/// central server.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    #[serde(flatten)]
    pub gaps: GapReport,
    pub first_arrival: Option<DateTime<Utc>>,
    pub last_arrival: Option<DateTime<Utc>>,
    /// Time between first and last arrival
    pub elapsed_ms: Option<i64>,
}

impl BatchReport {
    pub fn from_batch(batch: &Batch) -> Self {
        let first_arrival = batch.first_arrival();
        let last_arrival = batch.last_arrival();
        let elapsed_ms = match (first_arrival, last_arrival) {
            (Some(first), Some(last)) => Some((last - first).num_milliseconds()),
            _ => None,
        };
        Self {
            gaps: batch.gap_report(),
            first_arrival,
            last_arrival,
            elapsed_ms,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.gaps.is_complete()
    }

    /// Missing sequence numbers as a space-separated list (for log lines).
    pub fn missing_list(&self) -> String {
        self.gaps
            .missing
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Wall-clock `HH:MM:SS.mmm` in local time.
pub fn clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S%.3f").to_string()
}
