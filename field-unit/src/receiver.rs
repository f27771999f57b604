//! # receiver
//!
//! Datagram receive loop for one transmission.
//!
//! ## States
//! `Idle → Receiving → {Complete, TimedOut}`
//!
//! - Each `recv_from` waits at most the configured timeout. Silence for that
//!   long is how a transmission ends when datagrams are lost; it is a normal
//!   terminal state, not an error, and the partial batch is handed back.
//! - Malformed datagrams and rejected messages are logged and skipped.
//! - A bind or socket error ends the cycle and goes back to the caller.
//!
//! The socket lives for one cycle only; [`receive_batch`] binds it and drops
//! it before returning.

use std::net::SocketAddr;
use std::time::Duration;

use relay_types::{codec, AddOutcome, Batch, MAX_DATAGRAM_SIZE};
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ReceiveError {
    #[error("could not bind UDP {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("UDP receive failed: {0}")]
    Recv(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveState {
    /// Socket bound, nothing received yet
    Idle,
    /// At least one datagram arrived
    Receiving,
    /// Every declared message arrived
    Complete,
    /// Timeout fired; the batch may be partial or empty
    TimedOut,
}

/// Result of one receive cycle.
#[derive(Debug)]
pub struct ReceiveCycle {
    /// `Complete` or `TimedOut`
    pub state: ReceiveState,
    pub batch: Batch,
    /// Datagrams that failed to decode
    pub malformed: u32,
    /// Decoded messages the batch refused (mismatched total, duplicate, out of range)
    pub rejected: u32,
}

/// Bind `addr`, receive one transmission, release the socket.
pub async fn receive_batch(
    addr: SocketAddr,
    recv_timeout: Duration,
) -> Result<ReceiveCycle, ReceiveError> {
    let socket = UdpSocket::bind(addr)
        .await
        .map_err(|source| ReceiveError::Bind { addr, source })?;
    info!("📡 [Field Unit] Listening on UDP {addr}");

    receive_on(&socket, recv_timeout).await
}

/// Receive one transmission on an already bound socket.
pub async fn receive_on(
    socket: &UdpSocket,
    recv_timeout: Duration,
) -> Result<ReceiveCycle, ReceiveError> {
    let mut batch = Batch::new();
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    let mut state = ReceiveState::Idle;
    let mut malformed = 0u32;
    let mut rejected = 0u32;

    while !matches!(state, ReceiveState::Complete | ReceiveState::TimedOut) {
        let (len, src) = match timeout(recv_timeout, socket.recv_from(&mut buf)).await {
            Ok(Ok(received)) => received,
            Ok(Err(e)) => return Err(ReceiveError::Recv(e)),
            Err(_) => {
                info!(
                    "[Field Unit] Socket timed out after {}ms ({} of {} messages)",
                    recv_timeout.as_millis(),
                    batch.len(),
                    batch.total_count()
                );
                state = ReceiveState::TimedOut;
                continue;
            }
        };
        state = ReceiveState::Receiving;

        let msg = match codec::decode(&buf[..len]) {
            Ok(m) => m,
            Err(e) => {
                warn!("[Field Unit] Dropping packet from {src}: {e}");
                malformed += 1;
                continue;
            }
        };

        match batch.add(msg) {
            Ok(AddOutcome::Restarted { discarded }) => {
                warn!(
                    "[Field Unit] New transmission started; discarded {discarded} pending messages"
                );
            }
            Ok(_) => {}
            Err(e) => {
                warn!("[Field Unit] Rejected message from {src}: {e}");
                rejected += 1;
                continue;
            }
        }

        info!(
            "[Field Unit] Message {} out of {} received. Value = {}",
            msg.sequence_number, msg.total_count, msg.value
        );

        if batch.is_complete() {
            debug!("[Field Unit] Batch complete ({} messages)", batch.len());
            state = ReceiveState::Complete;
        }
    }

    Ok(ReceiveCycle {
        state,
        batch,
        malformed,
        rejected,
    })
}
