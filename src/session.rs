//! Per-endpoint transfer sessions.
//!
//! [`SendSession`] (client) and [`RecvSession`] (server) tie the pure state
//! machines in [`crate::sender`] and [`crate::receiver`] to a
//! [`crate::socket::Socket`] and drive the phase sequence:
//!
//! ```text
//!  handshake ──▶ windowed data / cumulative ACKs ──▶ teardown
//! ```
//!
//! Each session is single-threaded and blocking: the only suspension point
//! is "wait for the next datagram", bounded by the retransmission timeout
//! on the sending side and unbounded on the receiving side.  All state
//! lives in the session structs, so several independent sessions can run
//! in one process and tests can assert on their transitions.

use std::io::Write;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::handshake::{self, HandshakeError};
use crate::packet::{flags, Packet, MAX_PAYLOAD};
use crate::receiver::{Disposition, RecvState};
use crate::sender::{AckAction, SendWindow};
use crate::socket::{RecvOutcome, Socket, SocketError};
use crate::state::ConnectionState;

/// Default Go-Back-N window size (N).
pub const DEFAULT_WINDOW: u16 = 3;

/// Default retransmission timeout.  Fixed per session, not adaptive.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Failures that can end a transfer.
#[derive(Debug)]
pub enum TransferError {
    /// Underlying socket failure.
    Socket(SocketError),
    /// Writing to the output sink failed (server side).
    Sink(std::io::Error),
    /// The input needs more packets than the sequence-number space holds.
    TooManyChunks(usize),
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Socket(e) => write!(f, "transfer socket error: {e}"),
            Self::Sink(e) => write!(f, "output sink error: {e}"),
            Self::TooManyChunks(n) => {
                write!(f, "input splits into {n} chunks, more than a u16 sequence space")
            }
        }
    }
}

impl std::error::Error for TransferError {}

impl From<SocketError> for TransferError {
    fn from(e: SocketError) -> Self {
        Self::Socket(e)
    }
}

// ---------------------------------------------------------------------------
// TransferStats
// ---------------------------------------------------------------------------

/// Receiver-side accounting for the throughput summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferStats {
    /// Payload bytes persisted, in order.
    pub bytes: u64,
    /// Data packets accepted (retransmissions of accepted packets excluded).
    pub packets: u64,
    /// Wall-clock duration of the data-transfer phase.
    pub elapsed: Duration,
}

impl TransferStats {
    /// Throughput of the data phase in megabits per second.
    pub fn throughput_mbps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        (self.bytes as f64 * 8.0) / (secs * 1_000_000.0)
    }
}

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

/// Split a byte sequence into [`MAX_PAYLOAD`]-sized chunks.
///
/// The last chunk may be shorter; empty input yields no chunks at all.
pub fn chunk_payload(bytes: &[u8]) -> Vec<Vec<u8>> {
    bytes.chunks(MAX_PAYLOAD).map(<[u8]>::to_vec).collect()
}

// ---------------------------------------------------------------------------
// SendSession (client)
// ---------------------------------------------------------------------------

/// Client endpoint: establishes the connection, pushes windowed data, and
/// initiates teardown.
pub struct SendSession {
    socket: Socket,
    peer: SocketAddr,
    state: ConnectionState,
    timeout: Duration,
}

impl SendSession {
    /// Perform the establishment handshake against `peer`.
    ///
    /// `timeout` bounds both the handshake reply waits and, later, each ACK
    /// wait in the data phase.
    pub async fn connect(
        socket: Socket,
        peer: SocketAddr,
        timeout: Duration,
    ) -> Result<Self, HandshakeError> {
        let mut session = Self {
            socket,
            peer,
            state: ConnectionState::SynSent,
            timeout,
        };
        handshake::connect(&session.socket, peer, timeout).await?;
        session.state = ConnectionState::Established;
        Ok(session)
    }

    /// Current FSM state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Transfer `chunks` using a Go-Back-N window of `window_size` packets.
    ///
    /// Returns once every chunk has been cumulatively acknowledged.  A lost
    /// packet is recovered by retransmitting the whole outstanding window
    /// after `timeout`; retries are unbounded, so a vanished peer shows up
    /// as repeated warn-level retransmission logs rather than an error.
    pub async fn transfer(
        &mut self,
        chunks: Vec<Vec<u8>>,
        window_size: u16,
    ) -> Result<(), TransferError> {
        if chunks.len() > u16::MAX as usize {
            return Err(TransferError::TooManyChunks(chunks.len()));
        }
        let mut window = SendWindow::new(chunks, window_size);
        log::info!(
            "data transfer: {} chunk(s), window = {window_size}",
            window.total()
        );

        while !window.is_complete() {
            // Fill every free window slot with new packets.
            while let Some((seq, chunk)) = window.pop_sendable() {
                self.socket.send_to(&Packet::data(seq, chunk), self.peer).await?;
                log::debug!(
                    "[send] → DATA seq={seq} window=[{}..{})",
                    window.base(),
                    window.next_seq()
                );
            }

            // Wait for an ACK that advances the window; a timeout triggers
            // the Go-Back-N retransmission of everything outstanding.
            loop {
                match self.socket.recv_from_timeout(self.timeout).await {
                    Ok(RecvOutcome::TimedOut) => {
                        let batch = window.retransmit_batch();
                        log::warn!(
                            "[send] RTO — retransmitting {} packet(s) from base={}",
                            batch.len(),
                            window.base()
                        );
                        for (seq, chunk) in batch {
                            self.socket.send_to(&Packet::data(seq, chunk), self.peer).await?;
                            log::debug!("[send] → DATA seq={seq} (retransmit)");
                        }
                    }
                    Ok(RecvOutcome::Packet(pkt, addr)) => {
                        if addr != self.peer || pkt.header.flags & flags::ACK == 0 {
                            continue;
                        }
                        match window.on_ack(pkt.header.ack) {
                            AckAction::Advanced => {
                                log::debug!(
                                    "[send] ← ACK ack={} base={}",
                                    pkt.header.ack,
                                    window.base()
                                );
                                break;
                            }
                            AckAction::Stale => {
                                log::debug!("[send] ← stale ACK ack={}", pkt.header.ack);
                            }
                        }
                    }
                    // A malformed datagram is dropped; the session survives.
                    Err(SocketError::Packet(e)) => {
                        log::warn!("[send] dropping undecodable datagram: {e}");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        log::info!("data transfer finished");
        Ok(())
    }

    /// Initiate the teardown handshake.
    ///
    /// Returns `true` when the FIN-ACK arrived; `false` means the teardown
    /// went unconfirmed, which is reported but non-fatal.  The session ends
    /// in [`ConnectionState::Closed`] either way.
    pub async fn close(&mut self) -> Result<bool, SocketError> {
        self.state = ConnectionState::FinSent;
        let confirmed = handshake::close(&self.socket, self.peer, self.timeout).await?;
        self.state = ConnectionState::Closed;
        Ok(confirmed)
    }
}

// ---------------------------------------------------------------------------
// RecvSession (server)
// ---------------------------------------------------------------------------

/// Server endpoint: accepts the connection, enforces in-order delivery,
/// and answers the client's FIN.
pub struct RecvSession {
    socket: Socket,
    peer: SocketAddr,
    state: ConnectionState,
}

impl RecvSession {
    /// Wait for a client and complete the establishment handshake.
    pub async fn accept(socket: Socket) -> Result<Self, HandshakeError> {
        let peer = handshake::accept(&socket).await?;
        Ok(Self {
            socket,
            peer,
            state: ConnectionState::Established,
        })
    }

    /// Current FSM state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Address of the connected client.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Run the receive loop until the client's FIN arrives.
    ///
    /// Accepted payloads are appended to `sink` in strict sequence order —
    /// nothing is ever buffered for reordering or written twice.  `discard`
    /// designates one sequence number to silently drop on first sight
    /// (fault injection; pass `None` for a faithful receiver).
    ///
    /// The FIN is answered with an ACK unconditionally and ends the loop;
    /// the returned [`TransferStats`] cover the data phase.
    pub async fn receive<W: Write>(
        &mut self,
        sink: &mut W,
        discard: Option<u16>,
    ) -> Result<TransferStats, TransferError> {
        self.state = ConnectionState::Receiving;
        let mut recv = RecvState::new(discard);
        let mut bytes = 0u64;
        let mut packets = 0u64;
        let started = Instant::now();

        loop {
            let (pkt, addr) = match self.socket.recv_from().await {
                Ok(v) => v,
                // A malformed datagram is dropped; the session survives.
                Err(SocketError::Packet(e)) => {
                    log::warn!("[recv] dropping undecodable datagram: {e}");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if addr != self.peer {
                continue;
            }

            // The FIN reply is unconditional — it ignores sequence state.
            if pkt.header.flags & flags::FIN != 0 {
                self.socket
                    .send_to(&Packet::control(flags::ACK), self.peer)
                    .await?;
                log::debug!("[recv] ← FIN; → FIN-ACK");
                self.state = ConnectionState::Closed;
                break;
            }

            match recv.on_segment(pkt.header.seq) {
                Disposition::Accept { ack } => {
                    sink.write_all(&pkt.payload).map_err(TransferError::Sink)?;
                    bytes += pkt.payload.len() as u64;
                    packets += 1;
                    self.socket.send_to(&Packet::ack(ack), self.peer).await?;
                    log::debug!("[recv] ← DATA seq={ack}; → ACK ack={ack}");
                }
                Disposition::Discard => {
                    log::info!("discarding packet {}", pkt.header.seq);
                }
                Disposition::OutOfOrder { ack: Some(ack) } => {
                    self.socket.send_to(&Packet::ack(ack), self.peer).await?;
                    log::debug!(
                        "[recv] ← out-of-order seq={}; → ACK ack={ack}",
                        pkt.header.seq
                    );
                }
                Disposition::OutOfOrder { ack: None } => {
                    log::debug!(
                        "[recv] ← out-of-order seq={} before first accept; no ACK",
                        pkt.header.seq
                    );
                }
            }
        }

        let stats = TransferStats {
            bytes,
            packets,
            elapsed: started.elapsed(),
        };
        log::info!(
            "data transfer finished: {} byte(s) in {} packet(s), {:.2} Mbps",
            stats.bytes,
            stats.packets,
            stats.throughput_mbps()
        );
        Ok(stats)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_payload_splits_at_max_payload() {
        let bytes = vec![0xabu8; MAX_PAYLOAD * 2 + 10];
        let chunks = chunk_payload(&bytes);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), MAX_PAYLOAD);
        assert_eq!(chunks[1].len(), MAX_PAYLOAD);
        assert_eq!(chunks[2].len(), 10);
    }

    #[test]
    fn chunk_payload_exact_multiple_has_no_tail() {
        let chunks = chunk_payload(&vec![0u8; MAX_PAYLOAD * 3]);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == MAX_PAYLOAD));
    }

    #[test]
    fn chunk_payload_empty_input_yields_no_chunks() {
        assert!(chunk_payload(&[]).is_empty());
    }

    #[test]
    fn chunks_concatenate_back_to_input() {
        let bytes: Vec<u8> = (0..3000u32).map(|i| i as u8).collect();
        let joined: Vec<u8> = chunk_payload(&bytes).concat();
        assert_eq!(joined, bytes);
    }

    #[test]
    fn throughput_from_bytes_and_elapsed() {
        let stats = TransferStats {
            bytes: 1_000_000,
            packets: 1006,
            elapsed: Duration::from_secs(2),
        };
        // 8 Mbit over 2 s = 4 Mbps.
        assert!((stats.throughput_mbps() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn throughput_of_instant_transfer_is_zero() {
        let stats = TransferStats {
            bytes: 100,
            packets: 1,
            elapsed: Duration::ZERO,
        };
        assert_eq!(stats.throughput_mbps(), 0.0);
    }
}
