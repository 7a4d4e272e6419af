//! Receiver state machine for the inter-board link.
//!
//! The link is a raw byte stream with no out-of-band framing, so the
//! receiver must find frame boundaries itself. It runs a three-state
//! machine:
//!
//! - **Idle** – hunting for a frame start. A two-byte sliding window is
//!   compared against `0xAA 0x55` on every byte, so a marker split
//!   across two reads is still found and a stream joined mid-frame
//!   resynchronises at the next boundary.
//! - **ReadingPacket** – accumulating the 21-byte frame body.
//! - **ProcessingPacket** – a full body is buffered and ready to decode.
//!
//! Both success and failure of decoding return the machine to Idle, so
//! one corrupted frame never wedges the stream: at worst the bytes until
//! the next `0xAA 0x55` are discarded.

use tracing::{trace, warn};

use crate::protocol::codec::{decode_body, ProtocolError};
use crate::protocol::packet::{Packet, PACKET_BODY_LEN, START1, START2};

// ── State ─────────────────────────────────────────────────────────────────────

/// Phase of the frame receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    /// Scanning the byte stream for the `0xAA 0x55` start sequence.
    Idle,
    /// Start sequence seen; collecting the frame body.
    ReadingPacket,
    /// A complete body is buffered; [`FrameReceiver::process`] will
    /// decode it.
    ProcessingPacket,
}

// ── Receiver ──────────────────────────────────────────────────────────────────

/// Incremental frame parser. Feed it bytes in any chunking; it yields
/// decoded packets and silently recovers from garbage.
#[derive(Debug)]
pub struct FrameReceiver {
    state: ReceiverState,
    /// Previous byte, for the two-byte start-marker window.
    prev: u8,
    /// Frame body under accumulation.
    body: [u8; PACKET_BODY_LEN],
    /// Bytes of `body` filled so far.
    filled: usize,
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReceiver {
    pub fn new() -> Self {
        Self {
            state: ReceiverState::Idle,
            prev: 0,
            body: [0u8; PACKET_BODY_LEN],
            filled: 0,
        }
    }

    /// Current phase, mainly useful in tests and diagnostics.
    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// Consumes one byte from the stream.
    ///
    /// In `ProcessingPacket` the byte is ignored: the caller must call
    /// [`process`](Self::process) first to make room. Interleaving
    /// `feed` and `process` per byte (as [`drain`](Self::drain) does)
    /// never hits that case.
    pub fn feed(&mut self, byte: u8) {
        match self.state {
            ReceiverState::Idle => {
                if self.prev == START1 && byte == START2 {
                    self.state = ReceiverState::ReadingPacket;
                    self.filled = 0;
                    // A stale marker byte must not satisfy the next hunt.
                    self.prev = 0;
                } else {
                    self.prev = byte;
                }
            }
            ReceiverState::ReadingPacket => {
                self.body[self.filled] = byte;
                self.filled += 1;
                if self.filled == PACKET_BODY_LEN {
                    self.state = ReceiverState::ProcessingPacket;
                }
            }
            ReceiverState::ProcessingPacket => {
                trace!(byte, "byte dropped while a frame awaits processing");
            }
        }
    }

    /// Decodes the buffered frame body, if one is complete.
    ///
    /// Returns `None` in any other state and on decode failure; failures
    /// are logged and the frame is discarded. The machine always returns
    /// to `Idle` afterwards, win or lose.
    pub fn process(&mut self) -> Option<Packet> {
        if self.state != ReceiverState::ProcessingPacket {
            return None;
        }
        let result = decode_body(&self.body);
        self.state = ReceiverState::Idle;
        self.filled = 0;
        match result {
            Ok(packet) => Some(packet),
            Err(ProtocolError::UnknownMessageType(code)) => {
                // Forward-compatibility: a well-formed frame with a code
                // this build does not know is dropped without complaint.
                trace!(code, "ignoring frame with unrecognised message type");
                None
            }
            Err(err) => {
                warn!(%err, "discarding corrupted link frame");
                None
            }
        }
    }

    /// Feeds a whole read burst, invoking `sink` for every decoded
    /// packet. This is the shape the runtime uses: one call per
    /// `read()`, arbitrary chunk boundaries.
    pub fn drain<F>(&mut self, bytes: &[u8], mut sink: F)
    where
        F: FnMut(Packet),
    {
        for &byte in bytes {
            self.feed(byte);
            if self.state == ReceiverState::ProcessingPacket {
                if let Some(packet) = self.process() {
                    sink(packet);
                }
            }
        }
    }
}
