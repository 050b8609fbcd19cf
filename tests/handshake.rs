//! Integration tests for connection establishment.
//!
//! Each test spins up a real `tokio::net::UdpSocket` on loopback, runs the
//! server half in a background task, and verifies the handshake outcome on
//! both sides.

use std::net::SocketAddr;
use std::time::Duration;

use gbn_transfer::{
    handshake::HandshakeError,
    packet::{flags, Packet},
    session::{RecvSession, SendSession},
    socket::{RecvOutcome, Socket},
    state::ConnectionState,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Bind a socket to an OS-chosen loopback port.
async fn ephemeral() -> Socket {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    Socket::bind(addr).await.expect("bind failed")
}

const HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// Both sides should reach `Established` after a clean handshake on loopback.
#[tokio::test]
async fn handshake_both_sides_reach_established() {
    let server_socket = ephemeral().await;
    let server_addr = server_socket.local_addr;

    // Server blocks on `accept` until the SYN arrives.
    let server_task = tokio::spawn(async move { RecvSession::accept(server_socket).await });

    let client_socket = ephemeral().await;
    let client = tokio::time::timeout(
        Duration::from_secs(5),
        SendSession::connect(client_socket, server_addr, HANDSHAKE_TIMEOUT),
    )
    .await
    .expect("client connect timed out")
    .expect("client connect failed");

    let server = tokio::time::timeout(Duration::from_secs(5), server_task)
        .await
        .expect("server accept timed out")
        .expect("server task panicked")
        .expect("server accept failed");

    assert_eq!(client.state(), ConnectionState::Established);
    assert_eq!(server.state(), ConnectionState::Established);
}

/// A first datagram without the SYN flag must be rejected: no SYN-ACK goes
/// out and no data-transfer state is entered.
#[tokio::test]
async fn server_rejects_non_syn_first_packet() {
    let server_socket = ephemeral().await;
    let server_addr = server_socket.local_addr;

    let server_task = tokio::spawn(async move { RecvSession::accept(server_socket).await });

    // Send a bare ACK where a SYN belongs.
    let rogue = ephemeral().await;
    rogue
        .send_to(&Packet::control(flags::ACK), server_addr)
        .await
        .expect("send");

    let err = tokio::time::timeout(Duration::from_secs(5), server_task)
        .await
        .expect("server task timed out")
        .expect("server task panicked")
        .err()
        .expect("accept should have been rejected");
    assert!(
        matches!(err, HandshakeError::ExpectedSyn),
        "expected ExpectedSyn, got: {err}"
    );

    // The server must have stayed silent — no SYN-ACK reply.
    let reply = rogue
        .recv_from_timeout(Duration::from_millis(200))
        .await
        .expect("recv");
    assert!(matches!(reply, RecvOutcome::TimedOut));
}

/// Connecting to an address where nobody is listening should fail with a
/// timeout rather than hang forever.
#[tokio::test]
async fn connect_to_silent_peer_times_out() {
    // Bind then immediately drop a socket so its port is unbound; any SYN
    // sent there receives no reply.
    let silent_addr = {
        let tmp = ephemeral().await;
        tmp.local_addr
    };

    let client_socket = ephemeral().await;
    let err = SendSession::connect(client_socket, silent_addr, Duration::from_millis(200))
        .await
        .err()
        .expect("connect should fail");

    assert!(
        matches!(err, HandshakeError::TimedOut),
        "expected TimedOut, got: {err}"
    );
}
