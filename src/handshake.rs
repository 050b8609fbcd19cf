//! Connection establishment and teardown.
//!
//! *Establishment* is a three-message SYN / SYN-ACK / ACK exchange started
//! by the client.  Every control packet carries seq = ack = 0 and an empty
//! payload.  There is no retransmission here: if the expected flag is
//! absent from the first packet received at any step, the handshake aborts
//! and the session ends without transferring data.
//!
//! *Teardown* is a two-message FIN / FIN-ACK exchange, again started by the
//! client once all data has been acknowledged.  A missing FIN-ACK is
//! reported but non-fatal — the data itself has already been confirmed by
//! cumulative ACKs, only the closing courtesy is lost.

use std::net::SocketAddr;
use std::time::Duration;

use crate::packet::{flags, Packet};
use crate::socket::{RecvOutcome, Socket, SocketError};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Terminal handshake failures.  Any of these ends the session before data
/// flows.
#[derive(Debug)]
pub enum HandshakeError {
    /// The server's first datagram did not carry the SYN flag.
    ExpectedSyn,
    /// The client's reply was not a SYN-ACK.
    ExpectedSynAck,
    /// The server's final handshake datagram did not carry the ACK flag.
    ExpectedAck,
    /// No reply arrived within the bound (peer absent or packet lost).
    TimedOut,
    /// Underlying socket failure.
    Socket(SocketError),
}

impl std::fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExpectedSyn => write!(f, "first packet received lacks the SYN flag"),
            Self::ExpectedSynAck => write!(f, "reply to SYN was not a SYN-ACK"),
            Self::ExpectedAck => write!(f, "reply to SYN-ACK lacks the ACK flag"),
            Self::TimedOut => write!(f, "no handshake reply within the bound"),
            Self::Socket(e) => write!(f, "handshake socket error: {e}"),
        }
    }
}

impl std::error::Error for HandshakeError {}

impl From<SocketError> for HandshakeError {
    fn from(e: SocketError) -> Self {
        Self::Socket(e)
    }
}

// ---------------------------------------------------------------------------
// Establishment
// ---------------------------------------------------------------------------

/// Client side of the establishment handshake.
///
/// Sends SYN, awaits one SYN-ACK within `bound`, replies ACK.  The
/// connection counts as established the moment the ACK is sent; no further
/// confirmation is awaited.
pub async fn connect(
    socket: &Socket,
    peer: SocketAddr,
    bound: Duration,
) -> Result<(), HandshakeError> {
    socket.send_to(&Packet::control(flags::SYN), peer).await?;
    log::debug!("[handshake] → SYN");

    let reply = match socket.recv_from_timeout(bound).await? {
        RecvOutcome::Packet(pkt, _) => pkt,
        RecvOutcome::TimedOut => return Err(HandshakeError::TimedOut),
    };
    let f = reply.header.flags;
    if f & flags::SYN == 0 || f & flags::ACK == 0 {
        return Err(HandshakeError::ExpectedSynAck);
    }
    log::debug!("[handshake] ← SYN-ACK");

    socket.send_to(&Packet::control(flags::ACK), peer).await?;
    log::debug!("[handshake] → ACK");
    log::info!("connection established with {peer}");
    Ok(())
}

/// Server side of the establishment handshake.
///
/// Blocks until the first datagram arrives; it must be a SYN or the
/// handshake is rejected without sending anything.  Replies SYN-ACK, then
/// requires an ACK back.  Returns the client's address.
pub async fn accept(socket: &Socket) -> Result<SocketAddr, HandshakeError> {
    let (syn, client) = socket.recv_from().await?;
    if syn.header.flags & flags::SYN == 0 {
        return Err(HandshakeError::ExpectedSyn);
    }
    log::debug!("[handshake] ← SYN from {client}");

    socket
        .send_to(&Packet::control(flags::SYN | flags::ACK), client)
        .await?;
    log::debug!("[handshake] → SYN-ACK");

    let (ack, _) = socket.recv_from().await?;
    if ack.header.flags & flags::ACK == 0 {
        return Err(HandshakeError::ExpectedAck);
    }
    log::debug!("[handshake] ← ACK");
    log::info!("connection established with {client}");
    Ok(client)
}

// ---------------------------------------------------------------------------
// Teardown
// ---------------------------------------------------------------------------

/// Client side of the teardown handshake.
///
/// Sends FIN and awaits one FIN-ACK within `bound`.  Returns `true` when
/// the FIN-ACK arrived and `false` when it did not — the latter is logged
/// as a warning but is not an error, so the caller closes either way.
pub async fn close(
    socket: &Socket,
    peer: SocketAddr,
    bound: Duration,
) -> Result<bool, SocketError> {
    socket.send_to(&Packet::control(flags::FIN), peer).await?;
    log::debug!("[handshake] → FIN");

    let confirmed = match socket.recv_from_timeout(bound).await {
        Ok(RecvOutcome::Packet(pkt, _)) => pkt.header.flags & flags::ACK != 0,
        Ok(RecvOutcome::TimedOut) => false,
        Err(SocketError::Packet(_)) => false,
        Err(e) => return Err(e),
    };

    if confirmed {
        log::debug!("[handshake] ← FIN-ACK");
        log::info!("connection closed");
    } else {
        log::warn!("FIN-ACK not received; closing anyway");
    }
    Ok(confirmed)
}
