//! # relay-types
//!
//! Shared measurement types and batch logic for the telemetry relay.
//!
//! These types are used by:
//! - `sensor-sim`: encoding measurements into datagrams
//! - `field-unit`: decoding datagrams, batching, smoothing and gap reporting
//! - `central-server`: batching and gap reporting on relayed results
//!
//! ## Pipeline
//!
//! ```text
//! Sensor --(UDP, one datagram per Message)--> Field Unit
//!        --(remote call, one per smoothed value)--> Central Server
//! ```
//!
//! A batch is a numbered run of messages `1..=total_count`. Sequence number 1
//! is the only batch-start signal; there is no control message.
//!
//! ## Example
//!
//! ```rust
//! use std::num::NonZeroUsize;
//! use relay_types::{codec, smoothing, Batch, Message};
//!
//! let mut batch = Batch::new();
//! for (seq, value) in [(2, 20.0), (1, 10.0), (3, 30.0)] {
//!     let datagram = codec::encode(&Message::new(3, seq, value));
//!     batch.add(codec::decode(&datagram).unwrap()).unwrap();
//! }
//! assert!(batch.is_complete());
//!
//! let window = NonZeroUsize::new(2).unwrap();
//! let series = smoothing::moving_average(batch.messages_mut(), window);
//! assert_eq!(series, vec![10.0, 15.0, 25.0]);
//! ```

pub mod batch;
pub mod codec;
pub mod gaps;
pub mod message;
pub mod report;
pub mod rpc;
pub mod smoothing;

pub use batch::{AddOutcome, Batch, BatchError, StartPolicy};
pub use codec::{CodecError, MAX_DATAGRAM_SIZE};
pub use gaps::{missing, GapReport};
pub use message::Message;
pub use report::BatchReport;
