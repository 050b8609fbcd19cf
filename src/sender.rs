//! Go-Back-N send-side state machine.
//!
//! [`SendWindow`] owns the full ordered chunk list for one transfer and
//! tracks the sliding window of in-flight sequence numbers.
//!
//! # Protocol contract
//!
//! - At most `window_size` packets may be in flight at once:
//!   `next_seq - base <= window_size` always holds.
//! - ACKs are **cumulative**: `ack_num = K` means the receiver has accepted
//!   every packet with sequence number ≤ `K`, so `base` becomes `K + 1`.
//! - On timeout, the caller retransmits **all** unacked packets from `base`
//!   onwards (go back to N), in ascending order.
//! - Sequence numbers count packets, start at 0, and never wrap: a transfer
//!   is limited to `u16::MAX` chunks and larger inputs are rejected before
//!   a window is ever built.
//!
//! This module only manages state; all socket I/O is the caller's
//! responsibility.

// ---------------------------------------------------------------------------
// AckAction
// ---------------------------------------------------------------------------

/// What a received ACK did to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckAction {
    /// `base` advanced; freed slots may now be filled with new packets.
    Advanced,
    /// Duplicate or out-of-range ACK; state is unchanged and the caller
    /// keeps waiting.
    Stale,
}

// ---------------------------------------------------------------------------
// SendWindow
// ---------------------------------------------------------------------------

/// Go-Back-N send-side state for one transfer.
///
/// # Sequence-number layout
///
/// ```text
///     base            next_seq
///      │                  │
///  ────┼──────────────────┼──────────────────▶ seq space
///      │ <── in flight ──▶│ <── unsent ─────▶
/// ```
#[derive(Debug)]
pub struct SendWindow {
    /// Sequence number of the **oldest** unacked packet (left window edge).
    base: u16,

    /// Sequence number to use for the **next** new packet.
    next_seq: u16,

    /// Maximum number of packets that may be in flight simultaneously (N).
    window_size: u16,

    /// Every chunk of the transfer, indexed by sequence number.
    chunks: Vec<Vec<u8>>,
}

impl SendWindow {
    /// Create a new [`SendWindow`] over a pre-chunked payload sequence.
    ///
    /// # Panics
    ///
    /// Panics if `window_size` is 0 or if there are more than `u16::MAX`
    /// chunks (the session layer checks the chunk count first).
    pub fn new(chunks: Vec<Vec<u8>>, window_size: u16) -> Self {
        assert!(window_size >= 1, "window_size must be at least 1");
        assert!(
            chunks.len() <= u16::MAX as usize,
            "chunk count exceeds the sequence-number space"
        );
        Self {
            base: 0,
            next_seq: 0,
            window_size,
            chunks,
        }
    }

    /// Left edge of the window: oldest unacknowledged sequence number.
    pub fn base(&self) -> u16 {
        self.base
    }

    /// Next unused sequence number.
    pub fn next_seq(&self) -> u16 {
        self.next_seq
    }

    /// Total number of chunks in the transfer.
    pub fn total(&self) -> usize {
        self.chunks.len()
    }

    /// Number of packets currently awaiting acknowledgement.
    pub fn in_flight(&self) -> u16 {
        self.next_seq - self.base
    }

    /// `true` once every chunk has been cumulatively acknowledged.
    pub fn is_complete(&self) -> bool {
        self.base as usize == self.chunks.len()
    }

    /// Take the next sendable packet, advancing `next_seq`.
    ///
    /// Yields `(seq, chunk)` while there are unsent chunks and the window
    /// has a free slot; `None` once the window is full or all chunks have
    /// been handed out.
    pub fn pop_sendable(&mut self) -> Option<(u16, Vec<u8>)> {
        if (self.next_seq as usize) < self.chunks.len() && self.in_flight() < self.window_size {
            let seq = self.next_seq;
            self.next_seq += 1;
            Some((seq, self.chunks[seq as usize].clone()))
        } else {
            None
        }
    }

    /// Process a cumulative ACK.
    ///
    /// `base` becomes `ack_num + 1` when `base <= ack_num < next_seq`;
    /// anything else (stale duplicate, or an ACK for data never sent) leaves
    /// the window untouched.
    pub fn on_ack(&mut self, ack_num: u16) -> AckAction {
        if ack_num >= self.base && ack_num < self.next_seq {
            self.base = ack_num + 1;
            AckAction::Advanced
        } else {
            AckAction::Stale
        }
    }

    /// Every outstanding chunk, in ascending sequence order.
    ///
    /// This is the Go-Back-N step: after a timeout the caller resends the
    /// whole range `[base, min(next_seq, base + window_size))`.
    pub fn retransmit_batch(&self) -> Vec<(u16, Vec<u8>)> {
        let end = self.next_seq.min(self.base.saturating_add(self.window_size));
        (self.base..end)
            .map(|seq| (seq, self.chunks[seq as usize].clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
