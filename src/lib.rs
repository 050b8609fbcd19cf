//! `gbn-transfer` — reliable file transfer over UDP using Go-Back-N ARQ.
//!
//! # Architecture
//!
//! ```text
//!  ┌─────────────┐  data packets   ┌─────────────┐
//!  │ SendSession │────────────────▶│ RecvSession │
//!  │  (client)   │◀────────────────│  (server)   │
//!  └──────┬──────┘ cumulative ACKs └──────┬──────┘
//!         │                               │
//!    SendWindow                      RecvState
//!  (sliding window,              (in-order accept,
//!   GBN retransmit)               duplicate ACKs)
//!         │                               │
//!  ┌──────▼───────────────────────────────▼──────┐
//!  │   Socket  (async wrapper, tokio UdpSocket)  │
//!  └─────────────────────────────────────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]    — wire format (serialise / deserialise)
//! - [`socket`]    — async UDP socket abstraction with bounded-wait receive
//! - [`state`]     — finite-state-machine types
//! - [`handshake`] — SYN/SYN-ACK/ACK establishment, FIN/FIN-ACK teardown
//! - [`sender`]    — Go-Back-N outbound window state machine
//! - [`receiver`]  — Go-Back-N inbound in-order / fault-injection state machine
//! - [`session`]   — per-endpoint transfer loops and throughput accounting

pub mod handshake;
pub mod packet;
pub mod receiver;
pub mod sender;
pub mod session;
pub mod socket;
pub mod state;
