use std::fmt;

use serde::{Deserialize, Serialize};

/// One scalar measurement inside a numbered transmission.
///
/// The same record travels on both hops: as a text datagram from the sensor
/// and as the JSON body of the relay call to the central server.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Declared size of the transmission this message belongs to
    pub total_count: u32,
    /// Position in the transmission, `1..=total_count`
    pub sequence_number: u32,
    /// The measurement itself
    pub value: f32,
}

impl Message {
    pub fn new(total_count: u32, sequence_number: u32, value: f32) -> Self {
        Self {
            total_count,
            sequence_number,
            value,
        }
    }

    /// Sequence number 1 starts a new batch.
    pub fn is_batch_start(&self) -> bool {
        self.sequence_number == 1
    }
}

/// Wire form without the line terminator: `total;seq;value`.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{}",
            self.total_count, self.sequence_number, self.value
        )
    }
}
