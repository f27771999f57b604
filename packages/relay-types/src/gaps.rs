use std::collections::BTreeSet;

use serde::Serialize;

/// Completeness of one closed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GapReport {
    pub expected: u32,
    pub received: u32,
    /// Sequence numbers in `1..=expected` never observed, ascending
    pub missing: Vec<u32>,
    pub missing_count: u32,
}

impl GapReport {
    pub fn is_complete(&self) -> bool {
        self.missing_count == 0
    }
}

/// Every sequence number in `1..=expected_total` absent from `received`.
///
/// Duplicates count once and numbers outside the range are ignored, so
/// `missing_count == expected - received` always holds.
pub fn missing(expected_total: u32, received: impl IntoIterator<Item = u32>) -> GapReport {
    let seen: BTreeSet<u32> = received
        .into_iter()
        .filter(|seq| (1..=expected_total).contains(seq))
        .collect();

    let missing: Vec<u32> = (1..=expected_total)
        .filter(|seq| !seen.contains(seq))
        .collect();

    GapReport {
        expected: expected_total,
        received: seen.len() as u32,
        missing_count: missing.len() as u32,
        missing,
    }
}
