//! Wire-format definitions for protocol datagrams.
//!
//! Every datagram exchanged between peers is a [`Packet`].  This module is
//! responsible for:
//! - Defining the on-wire binary layout (header fields, flags, payload).
//! - Serialising a [`Packet`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Packet`], returning an
//!   error for truncated input.
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |        Sequence Number        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     Acknowledgment Number     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |             Flags             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          Payload ...          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total header size: [`HEADER_LEN`] = 6 bytes.
//! seq(2) + ack(2) + flags(2)
//!
//! Sequence numbers count *packets*, not bytes: the receiver accepts packet
//! `k` only after packets `0..k` have all been accepted, and an ACK carries
//! the sequence number of the last packet accepted in order.

/// Bit-flag constants for the `flags` header field (bit 0 = LSB).
pub mod flags {
    /// Synchronise — handshake initiation.
    pub const SYN: u16 = 1 << 2;
    /// Acknowledgement field is valid.
    pub const ACK: u16 = 1 << 1;
    /// Finish — sender has no more data to send.
    pub const FIN: u16 = 1 << 0;
}

/// Byte length of the fixed-size header on the wire.
pub const HEADER_LEN: usize = 6;

/// Largest payload carried by a single data packet.
///
/// Header plus payload stays within a 1000-byte datagram budget, leaving
/// headroom under the [`BUFFER_SIZE`] receive buffer.
pub const MAX_PAYLOAD: usize = 994;

/// Size of the receive buffer handed to the OS per datagram.
pub const BUFFER_SIZE: usize = 1024;

// Byte offsets of each field within the serialised header.
const OFF_SEQ: usize = 0;
const OFF_ACK: usize = 2;
const OFF_FLAGS: usize = 4;

/// Fixed-size protocol header.
///
/// Fields are in host byte order; [`Packet::encode`] converts to big-endian
/// on the wire and [`Packet::decode`] converts back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Packet-counted sequence number (first data packet is 0).
    pub seq: u16,
    /// Cumulative acknowledgment: last sequence number accepted in order.
    /// Meaningful only when [`flags::ACK`] is set.
    pub ack: u16,
    /// Bitmask of [`flags`] constants; only the low 3 bits are meaningful.
    pub flags: u16,
}

/// A complete protocol datagram: header + payload bytes.
///
/// Control packets (SYN, SYN-ACK, ACK, FIN) carry an empty payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    pub payload: Vec<u8>,
}

impl Packet {
    /// Build a control packet (empty payload, seq = ack = 0).
    pub fn control(flags: u16) -> Self {
        Self {
            header: Header {
                seq: 0,
                ack: 0,
                flags,
            },
            payload: Vec::new(),
        }
    }

    /// Build a data packet carrying one chunk (no flags set).
    pub fn data(seq: u16, payload: Vec<u8>) -> Self {
        debug_assert!(payload.len() <= MAX_PAYLOAD);
        Self {
            header: Header {
                seq,
                ack: 0,
                flags: 0,
            },
            payload,
        }
    }

    /// Build a cumulative ACK for sequence number `ack_num`.
    pub fn ack(ack_num: u16) -> Self {
        Self {
            header: Header {
                seq: 0,
                ack: ack_num,
                flags: flags::ACK,
            },
            payload: Vec::new(),
        }
    }

    /// Serialise this packet into a newly allocated byte vector.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_LEN + self.payload.len()];

        buf[OFF_SEQ..OFF_SEQ + 2].copy_from_slice(&self.header.seq.to_be_bytes());
        buf[OFF_ACK..OFF_ACK + 2].copy_from_slice(&self.header.ack.to_be_bytes());
        buf[OFF_FLAGS..OFF_FLAGS + 2].copy_from_slice(&self.header.flags.to_be_bytes());
        buf[HEADER_LEN..].copy_from_slice(&self.payload);

        buf
    }

    /// Parse a [`Packet`] from a raw byte slice.
    ///
    /// Returns [`Err`] if `buf` is shorter than [`HEADER_LEN`].  Everything
    /// past the header is taken verbatim as the payload.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < HEADER_LEN {
            return Err(PacketError::BufferTooShort);
        }

        let seq = u16::from_be_bytes(buf[OFF_SEQ..OFF_SEQ + 2].try_into().unwrap());
        let ack = u16::from_be_bytes(buf[OFF_ACK..OFF_ACK + 2].try_into().unwrap());
        let flags = u16::from_be_bytes(buf[OFF_FLAGS..OFF_FLAGS + 2].try_into().unwrap());

        Ok(Packet {
            header: Header { seq, ack, flags },
            payload: buf[HEADER_LEN..].to_vec(),
        })
    }
}

/// Errors that can arise when parsing a raw datagram.
#[derive(Debug, PartialEq, Eq)]
pub enum PacketError {
    /// Buffer shorter than the fixed header size.
    BufferTooShort,
}

impl std::fmt::Display for PacketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketError::BufferTooShort => write!(f, "buffer too short to contain a header"),
        }
    }
}

impl std::error::Error for PacketError {}
