//! Connection finite-state-machine (FSM) types.
//!
//! Both endpoints share one state enum; each visits only the states on its
//! own path.  Transitions are driven by the sessions in [`crate::session`]
//! and the handshake functions in [`crate::handshake`]; keeping the states
//! in their own module lets tests assert on transitions instead of parsing
//! console output.
//!
//! ```text
//! client:  Closed ──SYN sent──▶ SynSent ──SYN-ACK──▶ Established
//!                                                         │ data sent
//!          Closed ◀──FIN-ACK (or give up)── FinSent ◀─────┘
//!
//! server:  Closed ──SYN/SYN-ACK/ACK──▶ Established ──▶ Receiving
//!                                                         │ FIN
//!          Closed ◀───────────────────────────────────────┘
//! ```

/// All possible states of the connection FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection exists; initial and terminal state.
    #[default]
    Closed,
    /// SYN has been sent; waiting for SYN-ACK (client only).
    SynSent,
    /// Handshake complete; data transfer may begin.
    Established,
    /// Server is inside its receive loop accepting data packets.
    Receiving,
    /// FIN has been sent; waiting for the FIN-ACK reply (client only).
    FinSent,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
