//! Async UDP socket abstraction.
//!
//! [`Socket`] is a thin wrapper around `tokio::net::UdpSocket` that speaks
//! [`crate::packet::Packet`] instead of raw bytes.  All protocol logic lives
//! elsewhere; this module owns only byte I/O.
//!
//! Two receive flavours are offered: [`Socket::recv_from`] blocks until a
//! datagram arrives (receiver side), while [`Socket::recv_from_timeout`]
//! gives up after a bound and reports that as an explicit
//! [`RecvOutcome::TimedOut`] value rather than an error (sender side, where
//! a timeout triggers the Go-Back-N retransmission step).

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;

use crate::packet::{Packet, PacketError, BUFFER_SIZE};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can arise from socket operations.
#[derive(Debug)]
pub enum SocketError {
    /// Underlying I/O error from the OS.
    Io(std::io::Error),
    /// The received datagram could not be decoded as a valid packet.
    ///
    /// Fatal to that datagram only; callers drop it and keep going.
    Packet(PacketError),
}

impl std::fmt::Display for SocketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "socket I/O error: {e}"),
            Self::Packet(e) => write!(f, "packet decode error: {e}"),
        }
    }
}

impl std::error::Error for SocketError {}

impl From<std::io::Error> for SocketError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<PacketError> for SocketError {
    fn from(e: PacketError) -> Self {
        Self::Packet(e)
    }
}

// ---------------------------------------------------------------------------
// RecvOutcome
// ---------------------------------------------------------------------------

/// Result of a bounded-wait receive.
///
/// A timeout is an ordinary protocol event for a Go-Back-N sender, not a
/// failure, so it is modelled as a value the caller branches on.
#[derive(Debug)]
pub enum RecvOutcome {
    /// A datagram arrived within the bound.
    Packet(Packet, SocketAddr),
    /// No datagram arrived within the bound.
    TimedOut,
}

// ---------------------------------------------------------------------------
// Socket
// ---------------------------------------------------------------------------

/// An async, packet-oriented UDP socket.
///
/// All methods are `&self` so the socket can be shared if needed.
#[derive(Debug)]
pub struct Socket {
    /// Address this socket is bound to (filled in after OS assigns ephemeral port).
    pub local_addr: SocketAddr,
    inner: UdpSocket,
}

impl Socket {
    /// Bind a new socket to `local_addr`.
    ///
    /// Passing `0.0.0.0:0` lets the OS choose an ephemeral port.
    pub async fn bind(local_addr: SocketAddr) -> Result<Self, SocketError> {
        let inner = UdpSocket::bind(local_addr).await?;
        let local_addr = inner.local_addr()?;
        Ok(Self { local_addr, inner })
    }

    /// Encode `packet` and send it as a single UDP datagram to `dest`.
    pub async fn send_to(&self, packet: &Packet, dest: SocketAddr) -> Result<(), SocketError> {
        let bytes = packet.encode();
        self.inner.send_to(&bytes, dest).await?;
        Ok(())
    }

    /// Receive the next datagram and decode it into a [`Packet`].
    ///
    /// Returns `(packet, sender_address)`.  Datagrams that fail to decode are
    /// returned as `Err` — the caller decides whether to retry.
    pub async fn recv_from(&self) -> Result<(Packet, SocketAddr), SocketError> {
        let mut buf = vec![0u8; BUFFER_SIZE];
        let (n, addr) = self.inner.recv_from(&mut buf).await?;
        let packet = Packet::decode(&buf[..n])?;
        Ok((packet, addr))
    }

    /// Receive with a bounded wait.
    ///
    /// Returns [`RecvOutcome::TimedOut`] when no datagram arrives within
    /// `bound`; otherwise behaves like [`Socket::recv_from`].
    pub async fn recv_from_timeout(&self, bound: Duration) -> Result<RecvOutcome, SocketError> {
        match timeout(bound, self.recv_from()).await {
            Ok(Ok((pkt, addr))) => Ok(RecvOutcome::Packet(pkt, addr)),
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Ok(RecvOutcome::TimedOut),
        }
    }
}
