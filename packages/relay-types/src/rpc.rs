//! Remote-call contract between field unit and central server.
//!
//! The call is `receive(Message)`: an HTTP `POST` of the JSON message to
//! [`RECEIVE_PATH`]. The caller names itself in [`SENDER_HEADER`] so the
//! central server can keep one batch per field unit.

/// Port the central server listens on unless told otherwise.
pub const DEFAULT_CENTRAL_PORT: u16 = 1099;

pub const RECEIVE_PATH: &str = "/receive";
pub const HEALTH_PATH: &str = "/health";
pub const REPORTS_PATH: &str = "/reports";

pub const SENDER_HEADER: &str = "x-field-unit-id";

/// Sender key used when a caller does not identify itself.
pub const ANONYMOUS_SENDER: &str = "anonymous";
