//! # field-unit
//!
//! Aggregating node between the sensor and the central server.
//!
//! ## Cycle
//!   1. Bind the UDP port and receive one transmission, until every declared
//!      message arrived or the socket stays silent for the timeout
//!   2. Report missing sequence numbers for what arrived
//!   3. Sort by sequence number and compute the trailing moving average
//!   4. Relay each smoothed value to the central server, one call per value
//!
//! Cycles run back to back on one task; a cycle that received nothing skips
//! steps 2-4.

pub mod config;
pub mod receiver;
pub mod relay;
pub mod unit;

pub use config::{ConfigError, FieldUnitConfig};
pub use receiver::{receive_batch, receive_on, ReceiveCycle, ReceiveError, ReceiveState};
pub use relay::{CentralCollector, HttpCollector, Relay, RelayError, RelaySummary};
pub use unit::{CycleSummary, FieldUnit};
