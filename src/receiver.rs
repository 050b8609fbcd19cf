//! Go-Back-N receive-side state machine.
//!
//! [`RecvState`] implements the receiver side of Go-Back-N:
//!
//! - Only **in-order** packets are accepted (`seq == expected_seq`).
//! - Out-of-order, duplicate, and future packets are never persisted or
//!   buffered; the receiver re-ACKs the last packet it accepted so the
//!   sender learns about the gap.
//! - One designated sequence number may be silently dropped exactly once
//!   (fault injection for exercising the sender's timeout recovery).
//!
//! At most one ACK is produced per received datagram, and before the very
//! first packet has been accepted an out-of-order arrival produces **no**
//! ACK at all — there is no "last accepted" sequence number to repeat yet.
//!
//! This module only manages state; all socket I/O and payload persistence
//! is the caller's responsibility.

// ---------------------------------------------------------------------------
// Disposition
// ---------------------------------------------------------------------------

/// What the receiver decided about one inbound data packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// In-order packet: the caller persists the payload and ACKs `ack`.
    Accept {
        /// Sequence number to acknowledge (equals the packet's own).
        ack: u16,
    },
    /// The injected-fault target: drop silently, no ACK, no state change.
    Discard,
    /// Gap detected: do not persist; re-ACK the last accepted sequence
    /// number, or stay silent when nothing has been accepted yet.
    OutOfOrder {
        /// `Some(last accepted seq)`, or `None` before the first accept.
        ack: Option<u16>,
    },
}

// ---------------------------------------------------------------------------
// RecvState
// ---------------------------------------------------------------------------

/// Go-Back-N receive-side state for one transfer.
#[derive(Debug)]
pub struct RecvState {
    /// Next expected sequence number; starts at 0, advances by exactly 1
    /// per accepted packet, never skips, never reverses.
    expected_seq: u16,

    /// Sequence number to drop on first sight, consumed at most once.
    discard: Option<u16>,
}

impl RecvState {
    /// Create a new [`RecvState`].
    ///
    /// `discard` designates one sequence number to silently drop the first
    /// time it arrives (pass `None` for a faithful receiver).
    pub fn new(discard: Option<u16>) -> Self {
        Self {
            expected_seq: 0,
            discard,
        }
    }

    /// Sequence number the receiver will accept next.
    pub fn expected_seq(&self) -> u16 {
        self.expected_seq
    }

    /// Classify an inbound data packet by sequence number.
    ///
    /// On [`Disposition::Accept`] the internal expectation has already been
    /// advanced; the caller persists the payload in arrival order and sends
    /// the returned ACK.
    pub fn on_segment(&mut self, seq: u16) -> Disposition {
        if self.discard == Some(seq) {
            self.discard = None; // injected loss fires only once
            return Disposition::Discard;
        }

        if seq == self.expected_seq {
            self.expected_seq += 1;
            Disposition::Accept { ack: seq }
        } else {
            Disposition::OutOfOrder {
                ack: self.expected_seq.checked_sub(1),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let r = RecvState::new(None);
        assert_eq!(r.expected_seq(), 0);
    }

    #[test]
    fn in_order_packets_accepted_one_by_one() {
        let mut r = RecvState::new(None);
        assert_eq!(r.on_segment(0), Disposition::Accept { ack: 0 });
        assert_eq!(r.on_segment(1), Disposition::Accept { ack: 1 });
        assert_eq!(r.on_segment(2), Disposition::Accept { ack: 2 });
        assert_eq!(r.expected_seq(), 3);
    }

    #[test]
    fn future_packet_triggers_duplicate_ack() {
        let mut r = RecvState::new(None);
        r.on_segment(0);
        r.on_segment(1);

        // seq 3 arrives while 2 is expected: re-ACK 1, expectation frozen.
        assert_eq!(r.on_segment(3), Disposition::OutOfOrder { ack: Some(1) });
        assert_eq!(r.expected_seq(), 2);
    }

    #[test]
    fn duplicate_packet_not_accepted_twice() {
        let mut r = RecvState::new(None);
        assert_eq!(r.on_segment(0), Disposition::Accept { ack: 0 });
        // The same packet again is out of order, never a second accept.
        assert_eq!(r.on_segment(0), Disposition::OutOfOrder { ack: Some(0) });
        assert_eq!(r.expected_seq(), 1);
    }

    #[test]
    fn out_of_order_before_first_accept_stays_silent() {
        let mut r = RecvState::new(None);
        // Nothing accepted yet, so there is no sequence number to re-ACK.
        assert_eq!(r.on_segment(5), Disposition::OutOfOrder { ack: None });
        assert_eq!(r.expected_seq(), 0);
    }

    #[test]
    fn discard_target_dropped_exactly_once() {
        let mut r = RecvState::new(Some(1));
        assert_eq!(r.on_segment(0), Disposition::Accept { ack: 0 });

        // First arrival of seq 1 vanishes without an ACK or state change.
        assert_eq!(r.on_segment(1), Disposition::Discard);
        assert_eq!(r.expected_seq(), 1);

        // The retransmission is accepted normally.
        assert_eq!(r.on_segment(1), Disposition::Accept { ack: 1 });
        assert_eq!(r.expected_seq(), 2);
    }

    #[test]
    fn discard_target_never_expected_leaves_state_alone() {
        let mut r = RecvState::new(Some(7));
        assert_eq!(r.on_segment(7), Disposition::Discard);
        // Consumed: a second arrival of 7 is ordinary (and out of order here).
        assert_eq!(r.on_segment(7), Disposition::OutOfOrder { ack: None });
    }

    #[test]
    fn expectation_never_reverses() {
        let mut r = RecvState::new(None);
        r.on_segment(0);
        r.on_segment(1);
        r.on_segment(0); // stale duplicate
        r.on_segment(9); // far future
        assert_eq!(r.expected_seq(), 2);
    }
}
