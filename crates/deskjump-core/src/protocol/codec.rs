//! Binary encode/decode for link frames.
//!
//! Encoding is infallible once a [`Packet`] exists (construction already
//! validated the payload). Decoding operates on a frame *body* — the 21
//! bytes after the two start markers — because the receiver state
//! machine consumes the markers itself while hunting for frame
//! boundaries.

use thiserror::Error;

use crate::protocol::packet::{
    MessageType, Packet, PACKET_BODY_LEN, PACKET_DATA_LEN, RAW_FRAME_LEN, START1, START2,
};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Everything that can go wrong while building or decoding a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The payload does not fit the fixed 16-byte data region.
    #[error("payload of {0} bytes exceeds the {PACKET_DATA_LEN}-byte data region")]
    PayloadTooLarge(usize),

    /// Fewer bytes than a full frame body were supplied to the decoder.
    #[error("frame body truncated: got {0} bytes, need {PACKET_BODY_LEN}")]
    InsufficientData(usize),

    /// The transmitted checksum byte does not match the data region.
    #[error("checksum mismatch: computed {computed:#04x}, frame carried {received:#04x}")]
    ChecksumMismatch { computed: u8, received: u8 },

    /// The `type` byte is not a known message code.
    #[error("unknown message type code {0:#04x}")]
    UnknownMessageType(u8),

    /// The `report_len` byte claims more payload than the data region holds.
    #[error("report length {0} exceeds the {PACKET_DATA_LEN}-byte data region")]
    BadReportLength(u8),
}

// ── Checksum ──────────────────────────────────────────────────────────────────

/// XOR of every byte in the data region.
///
/// Always runs over the full 16-byte region, zero padding included, so
/// the result does not depend on `report_len`. XOR is weak as error
/// detection goes but the link is point-to-point and short; the checksum
/// mostly guards against desynchronised framing, which the start-marker
/// scan then repairs.
pub fn checksum(data: &[u8; PACKET_DATA_LEN]) -> u8 {
    data.iter().fold(0, |acc, &b| acc ^ b)
}

// ── Encode ────────────────────────────────────────────────────────────────────

/// Serializes a packet into its full 23-byte wire frame.
pub fn encode(packet: &Packet) -> [u8; RAW_FRAME_LEN] {
    let mut frame = [0u8; RAW_FRAME_LEN];
    frame[0] = START1;
    frame[1] = START2;
    frame[2] = packet.msg_type as u8;
    frame[3] = packet.interface;
    frame[4] = packet.report_id;
    frame[5] = packet.report_len;
    frame[6..6 + PACKET_DATA_LEN].copy_from_slice(&packet.data);
    frame[RAW_FRAME_LEN - 1] = packet.checksum;
    frame
}

// ── Decode ────────────────────────────────────────────────────────────────────

/// Deserializes a frame body (the 21 bytes after the start markers).
///
/// The checksum is verified before the type byte is interpreted, so a
/// corrupted frame reports [`ProtocolError::ChecksumMismatch`] even when
/// the corruption also hit the type byte.
///
/// # Errors
///
/// Returns an error when the body is short, the checksum does not match,
/// the claimed report length is impossible, or the type code is unknown.
pub fn decode_body(body: &[u8]) -> Result<Packet, ProtocolError> {
    if body.len() < PACKET_BODY_LEN {
        return Err(ProtocolError::InsufficientData(body.len()));
    }

    let mut data = [0u8; PACKET_DATA_LEN];
    data.copy_from_slice(&body[4..4 + PACKET_DATA_LEN]);
    let received = body[PACKET_BODY_LEN - 1];
    let computed = checksum(&data);
    if computed != received {
        return Err(ProtocolError::ChecksumMismatch { computed, received });
    }

    let report_len = body[3];
    if report_len as usize > PACKET_DATA_LEN {
        return Err(ProtocolError::BadReportLength(report_len));
    }

    let msg_type = MessageType::try_from(body[0])
        .map_err(|_| ProtocolError::UnknownMessageType(body[0]))?;

    Ok(Packet {
        msg_type,
        interface: body[1],
        report_id: body[2],
        report_len,
        data,
        checksum: received,
    })
}
