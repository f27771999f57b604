//! # central-server
//!
//! Terminal collector of the telemetry relay. Field units call
//! `receive(Message)` once per smoothed value; the server groups the calls
//! into batches per field unit and, when a batch is complete, reports how
//! many values were declared, received and missing, plus arrival timing.

pub mod aggregator;
pub mod config;
pub mod server;

pub use aggregator::{CentralAggregator, ReportLog, SenderReport};
pub use config::CentralConfig;
