//! Link packet types and wire-format constants.
//!
//! Every frame on the inter-board link has the same fixed length:
//!
//! ```text
//! [0xAA][0x55][type:1][interface:1][report_id:1][report_len:1][data:16][checksum:1]
//! ```
//!
//! 23 bytes total. The two start markers exist purely for resync: a
//! receiver that loses its position in the stream scans for `0xAA 0x55`
//! and locks back on at the next frame boundary. The checksum is the
//! XOR of all 16 data bytes, padding included, regardless of
//! `report_len`. Fixed-length framing keeps the parser allocation-free
//! and removes any length-prefix ambiguity; there is no flow control
//! and no acknowledgement on the link.

use serde::{Deserialize, Serialize};

use crate::protocol::codec::{checksum, ProtocolError};

// ── Wire constants ────────────────────────────────────────────────────────────

/// First start-of-frame marker byte.
pub const START1: u8 = 0xAA;
/// Second start-of-frame marker byte.
pub const START2: u8 = 0x55;

/// Fixed size of the data region in every packet.
pub const PACKET_DATA_LEN: usize = 16;

/// Frame body length: everything after the two start markers
/// (type + interface + report_id + report_len + data + checksum).
pub const PACKET_BODY_LEN: usize = 4 + PACKET_DATA_LEN + 1;

/// Total frame length on the wire, start markers included.
pub const RAW_FRAME_LEN: usize = 2 + PACKET_BODY_LEN;

// ── Message type codes ────────────────────────────────────────────────────────

/// All message type codes carried in the `type` byte of a frame.
///
/// The numbering is sparse because the protocol retired several message
/// kinds over its lifetime; the values here are the canonical, current
/// message set. Codes not listed are accepted by the framer but produce
/// no dispatch action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    /// A keyboard report captured on the inactive board, forwarded for
    /// local injection on the active board.
    KeyboardReport = 1,
    /// A mouse report forwarded for local injection.
    MouseReport = 2,
    /// Active-output change announcement; `data[0]` holds the board id.
    OutputSelect = 3,
    /// A consumer-control report forwarded for local injection.
    ConsumerControl = 15,
    /// Ask the peer to emit its OS-specific lock-screen chord.
    LockScreen = 16,
    /// Ask the peer to emit its OS-specific suspend chord.
    SuspendHost = 17,
    /// Announce that diagnostic logging was switched on.
    EnableDebug = 18,
    /// Ask the peer to stop refreshing its watchdog and reset.
    RequestReboot = 19,
    /// Query the peer's current active output; answered with
    /// [`MessageType::OutputSelect`].
    OutputGet = 20,
}

impl TryFrom<u8> for MessageType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            1 => Ok(MessageType::KeyboardReport),
            2 => Ok(MessageType::MouseReport),
            3 => Ok(MessageType::OutputSelect),
            15 => Ok(MessageType::ConsumerControl),
            16 => Ok(MessageType::LockScreen),
            17 => Ok(MessageType::SuspendHost),
            18 => Ok(MessageType::EnableDebug),
            19 => Ok(MessageType::RequestReboot),
            20 => Ok(MessageType::OutputGet),
            _ => Err(()),
        }
    }
}

// ── Packet ────────────────────────────────────────────────────────────────────

/// One in-flight link frame, decoded form.
///
/// Packets are transient: they are constructed immediately before
/// transmission and dropped after handling. No packet survives across
/// receiver state-machine cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// What this frame carries; selects the dispatch handler.
    pub msg_type: MessageType,
    /// Which logical HID endpoint / report stream it concerns.
    pub interface: u8,
    /// HID report id within the interface.
    pub report_id: u8,
    /// Meaningful bytes in `data`, 0..=16.
    pub report_len: u8,
    /// Payload, zero-padded to the fixed data region size.
    pub data: [u8; PACKET_DATA_LEN],
    /// XOR of all 16 `data` bytes, padding included.
    pub checksum: u8,
}

impl Packet {
    /// Builds a packet for transmission, zero-padding the payload and
    /// computing the checksum over the full data region.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::PayloadTooLarge`] when the payload does
    /// not fit the fixed 16-byte data region.
    pub fn new(
        msg_type: MessageType,
        interface: u8,
        report_id: u8,
        payload: &[u8],
    ) -> Result<Self, ProtocolError> {
        if payload.len() > PACKET_DATA_LEN {
            return Err(ProtocolError::PayloadTooLarge(payload.len()));
        }
        let mut data = [0u8; PACKET_DATA_LEN];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            msg_type,
            interface,
            report_id,
            report_len: payload.len() as u8,
            checksum: checksum(&data),
            data,
        })
    }

    /// Builds a single-value packet (interface and report id zero), the
    /// common shape of control announcements such as OutputSelect.
    pub fn value(msg_type: MessageType, value: u8) -> Self {
        let mut data = [0u8; PACKET_DATA_LEN];
        data[0] = value;
        Self {
            msg_type,
            interface: 0,
            report_id: 0,
            report_len: 1,
            checksum: checksum(&data),
            data,
        }
    }

    /// Builds an empty query packet (no payload).
    pub fn empty(msg_type: MessageType) -> Self {
        Self {
            msg_type,
            interface: 0,
            report_id: 0,
            report_len: 0,
            checksum: 0,
            data: [0u8; PACKET_DATA_LEN],
        }
    }

    /// The meaningful slice of the data region.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.report_len as usize]
    }

    /// Recomputes the checksum over the full data region and compares
    /// it to the transmitted checksum byte.
    pub fn verify(&self) -> bool {
        checksum(&self.data) == self.checksum
    }
}
