//! # batch
//!
//! In-progress collection of one transmission.
//!
//! A [`Batch`] is owned by whichever node is receiving. It accumulates
//! messages in arrival order (out-of-order arrival is fine), captures the
//! declared total from the first message, and is closed either when every
//! expected sequence number is present or when the receiver gives up.
//! [`Batch::take`] closes it and leaves a fresh, empty batch in its place so
//! nothing leaks into the next transmission.
//!
//! ## Rules
//! - Sequence number 1 starts a new batch; any pending messages are
//!   discarded (a restarted sequence wins). Under
//!   [`StartPolicy::AllowLateStart`] a start message overtaken in transit is
//!   the one exception: if the pending batch has the same total and no
//!   sequence 1 yet, the start message joins it.
//! - A non-start message whose `total_count` disagrees with the batch is
//!   rejected. So are duplicates and sequence numbers outside
//!   `1..=total_count`.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::gaps::{self, GapReport};
use crate::message::Message;

/// Why a message was not added to the current batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchError {
    #[error("message {sequence_number} declares total {declared}, batch expects {expected}")]
    TotalCountMismatch {
        sequence_number: u32,
        declared: u32,
        expected: u32,
    },

    #[error("sequence number {sequence_number} outside 1..={total_count}")]
    SequenceOutOfRange {
        sequence_number: u32,
        total_count: u32,
    },

    #[error("duplicate sequence number {0}")]
    Duplicate(u32),
}

/// What [`Batch::add`] did with an accepted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// First message of a new batch
    Started,
    /// Start message arrived mid-batch; `discarded` pending messages were dropped
    Restarted { discarded: usize },
    /// Appended to the batch in progress
    Appended,
}

/// How a sequence-1 message is treated while a batch is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartPolicy {
    /// Sequence 1 joins a pending batch with the same total and no 1 yet.
    /// For receivers whose batches end on a timeout, where datagrams can
    /// overtake each other.
    #[default]
    AllowLateStart,
    /// Sequence 1 always restarts. For in-order senders whose batches never
    /// time out, where a missing 1 means the start was lost for good.
    Strict,
}

#[derive(Debug, Clone, Default)]
pub struct Batch {
    messages: Vec<Message>,
    total_count: u32,
    first_arrival: Option<DateTime<Utc>>,
    last_arrival: Option<DateTime<Utc>>,
    policy: StartPolicy,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: StartPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// A batch where every sequence-1 message restarts.
    pub fn strict() -> Self {
        Self::with_policy(StartPolicy::Strict)
    }

    pub fn policy(&self) -> StartPolicy {
        self.policy
    }

    /// Back to the freshly constructed state: empty, `total_count == 0`.
    /// The start policy is kept.
    pub fn reset(&mut self) {
        *self = Self::with_policy(self.policy);
    }

    pub fn is_batch_start(msg: &Message) -> bool {
        msg.is_batch_start()
    }

    /// Add a message stamped with the current time.
    pub fn add(&mut self, msg: Message) -> Result<AddOutcome, BatchError> {
        self.add_at(msg, Utc::now())
    }

    /// A rejected message leaves the batch untouched.
    pub fn add_at(&mut self, msg: Message, at: DateTime<Utc>) -> Result<AddOutcome, BatchError> {
        // The first arrival declares the total, even when sequence 1 was lost
        let starts = self.messages.is_empty()
            || (Self::is_batch_start(&msg) && !self.is_late_start(&msg));

        let total_count = if starts {
            msg.total_count
        } else {
            self.check(&msg)?;
            self.total_count
        };
        if msg.sequence_number == 0 || msg.sequence_number > total_count {
            return Err(BatchError::SequenceOutOfRange {
                sequence_number: msg.sequence_number,
                total_count,
            });
        }

        let outcome = if !starts {
            AddOutcome::Appended
        } else if self.messages.is_empty() {
            AddOutcome::Started
        } else {
            AddOutcome::Restarted {
                discarded: self.messages.len(),
            }
        };
        if starts {
            self.reset();
            self.total_count = total_count;
        }

        self.first_arrival.get_or_insert(at);
        self.last_arrival = Some(at);
        self.messages.push(msg);
        Ok(outcome)
    }

    /// Sequence 1 overtaken by later messages of the same transmission.
    fn is_late_start(&self, msg: &Message) -> bool {
        self.policy == StartPolicy::AllowLateStart
            && msg.total_count == self.total_count
            && !self.sequence_numbers().any(|seq| seq == 1)
    }

    fn check(&self, msg: &Message) -> Result<(), BatchError> {
        if msg.total_count != self.total_count {
            return Err(BatchError::TotalCountMismatch {
                sequence_number: msg.sequence_number,
                declared: msg.total_count,
                expected: self.total_count,
            });
        }
        if self
            .messages
            .iter()
            .any(|m| m.sequence_number == msg.sequence_number)
        {
            return Err(BatchError::Duplicate(msg.sequence_number));
        }
        Ok(())
    }

    /// All declared messages are present. A batch with no declared total is
    /// never complete.
    pub fn is_complete(&self) -> bool {
        self.total_count > 0 && self.messages.len() >= self.total_count as usize
    }

    /// Close the batch: hand back its contents and start over empty, under
    /// the same start policy.
    pub fn take(&mut self) -> Batch {
        std::mem::replace(self, Self::with_policy(self.policy))
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// Messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Mutable view for in-place reordering before smoothing.
    pub fn messages_mut(&mut self) -> &mut [Message] {
        &mut self.messages
    }

    pub fn sequence_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.messages.iter().map(|m| m.sequence_number)
    }

    pub fn first_arrival(&self) -> Option<DateTime<Utc>> {
        self.first_arrival
    }

    pub fn last_arrival(&self) -> Option<DateTime<Utc>> {
        self.last_arrival
    }

    pub fn gap_report(&self) -> GapReport {
        gaps::missing(self.total_count, self.sequence_numbers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn msg(total: u32, seq: u32) -> Message {
        Message::new(total, seq, seq as f32 * 10.0)
    }

    #[test]
    fn test_fresh_batch_is_empty_and_incomplete() {
        let batch = Batch::new();
        assert!(batch.is_empty());
        assert_eq!(batch.total_count(), 0);
        assert!(!batch.is_complete());
        assert!(batch.first_arrival().is_none());
    }

    #[test]
    fn test_start_captures_total_and_completes() {
        let mut batch = Batch::new();
        assert_eq!(batch.add(msg(3, 1)), Ok(AddOutcome::Started));
        assert_eq!(batch.total_count(), 3);
        assert_eq!(batch.add(msg(3, 2)), Ok(AddOutcome::Appended));
        assert!(!batch.is_complete());
        assert_eq!(batch.add(msg(3, 3)), Ok(AddOutcome::Appended));
        assert!(batch.is_complete());
    }

    #[test]
    fn test_out_of_order_arrival() {
        let mut batch = Batch::new();
        for seq in [1, 3, 2] {
            batch.add(msg(3, seq)).unwrap();
        }
        assert!(batch.is_complete());
        assert_eq!(batch.sequence_numbers().collect::<Vec<_>>(), vec![1, 3, 2]);
    }

    #[test]
    fn test_late_start_message_joins_batch() {
        let mut batch = Batch::new();
        assert_eq!(batch.add(msg(3, 3)), Ok(AddOutcome::Started));
        assert_eq!(batch.add(msg(3, 1)), Ok(AddOutcome::Appended));
        assert_eq!(batch.add(msg(3, 2)), Ok(AddOutcome::Appended));
        assert!(batch.is_complete());
    }

    #[test]
    fn test_second_start_with_same_total_restarts() {
        let mut batch = Batch::new();
        batch.add(msg(3, 1)).unwrap();
        batch.add(msg(3, 2)).unwrap();
        assert_eq!(
            batch.add(msg(3, 1)),
            Ok(AddOutcome::Restarted { discarded: 2 })
        );
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_start_mid_batch_discards_pending() {
        let mut batch = Batch::new();
        batch.add(msg(5, 1)).unwrap();
        batch.add(msg(5, 2)).unwrap();
        batch.add(msg(5, 3)).unwrap();

        let outcome = batch.add(msg(2, 1)).unwrap();
        assert_eq!(outcome, AddOutcome::Restarted { discarded: 3 });
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.total_count(), 2);

        batch.add(msg(2, 2)).unwrap();
        assert!(batch.is_complete());
    }

    #[test]
    fn test_lost_start_message_still_declares_total() {
        let mut batch = Batch::new();
        assert_eq!(batch.add(msg(4, 2)), Ok(AddOutcome::Started));
        assert_eq!(batch.total_count(), 4);
        batch.add(msg(4, 3)).unwrap();
        batch.add(msg(4, 4)).unwrap();
        assert!(!batch.is_complete());
        assert_eq!(batch.gap_report().missing, vec![1]);
    }

    #[test]
    fn test_total_mismatch_rejected() {
        let mut batch = Batch::new();
        batch.add(msg(5, 1)).unwrap();
        let err = batch.add(msg(9, 2)).unwrap_err();
        assert_eq!(
            err,
            BatchError::TotalCountMismatch {
                sequence_number: 2,
                declared: 9,
                expected: 5
            }
        );
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut batch = Batch::new();
        batch.add(msg(3, 1)).unwrap();
        batch.add(msg(3, 2)).unwrap();
        assert_eq!(batch.add(msg(3, 2)), Err(BatchError::Duplicate(2)));
        assert_eq!(batch.len(), 2);
        assert!(!batch.is_complete());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut batch = Batch::new();
        batch.add(msg(2, 1)).unwrap();
        assert_eq!(
            batch.add(msg(2, 3)),
            Err(BatchError::SequenceOutOfRange {
                sequence_number: 3,
                total_count: 2
            })
        );

        let mut empty = Batch::new();
        assert!(empty.add(msg(4, 0)).is_err());
        assert!(empty.is_empty());
        assert_eq!(empty.total_count(), 0);
    }

    #[test]
    fn test_strict_batch_restarts_when_start_was_lost() {
        let mut batch = Batch::strict();
        batch.add(msg(3, 2)).unwrap();
        batch.add(msg(3, 3)).unwrap();

        // the next transmission's start must not complete the stale batch
        assert_eq!(
            batch.add(msg(3, 1)),
            Ok(AddOutcome::Restarted { discarded: 2 })
        );
        assert!(!batch.is_complete());
        batch.add(msg(3, 2)).unwrap();
        batch.add(msg(3, 3)).unwrap();
        assert!(batch.is_complete());
        assert_eq!(batch.gap_report().missing, Vec::<u32>::new());
    }

    #[test]
    fn test_rejected_start_keeps_pending_batch() {
        for mut batch in [Batch::new(), Batch::strict()] {
            batch.add(msg(5, 1)).unwrap();
            batch.add(msg(5, 2)).unwrap();

            assert_eq!(
                batch.add(Message::new(0, 1, 0.0)),
                Err(BatchError::SequenceOutOfRange {
                    sequence_number: 1,
                    total_count: 0
                })
            );
            assert_eq!(batch.len(), 2);
            assert_eq!(batch.total_count(), 5);
        }
    }

    #[test]
    fn test_take_keeps_start_policy() {
        let mut batch = Batch::strict();
        batch.add(msg(1, 1)).unwrap();
        let closed = batch.take();
        assert_eq!(closed.policy(), StartPolicy::Strict);
        assert_eq!(batch.policy(), StartPolicy::Strict);

        batch.reset();
        assert_eq!(batch.policy(), StartPolicy::Strict);
        assert_eq!(Batch::new().policy(), StartPolicy::AllowLateStart);
    }

    #[test]
    fn test_take_leaves_fresh_batch() {
        let mut batch = Batch::new();
        batch.add(msg(2, 1)).unwrap();
        batch.add(msg(2, 2)).unwrap();

        let closed = batch.take();
        assert_eq!(closed.len(), 2);
        assert!(closed.is_complete());

        assert!(batch.is_empty());
        assert_eq!(batch.total_count(), 0);
        assert!(batch.first_arrival().is_none());
        assert!(batch.last_arrival().is_none());
        assert!(!batch.is_complete());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut batch = Batch::new();
        batch.add(msg(3, 1)).unwrap();
        batch.reset();
        batch.reset();
        assert!(batch.is_empty());
        assert_eq!(batch.total_count(), 0);
    }

    #[test]
    fn test_arrival_timestamps() {
        let t0 = Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap();
        let t1 = t0 + chrono::Duration::milliseconds(250);
        let t2 = t0 + chrono::Duration::milliseconds(900);

        let mut batch = Batch::new();
        batch.add_at(msg(3, 1), t0).unwrap();
        batch.add_at(msg(3, 2), t1).unwrap();
        batch.add_at(msg(3, 3), t2).unwrap();

        assert_eq!(batch.first_arrival(), Some(t0));
        assert_eq!(batch.last_arrival(), Some(t2));
    }
}
