//! Link protocol module: packet types, the binary codec, and the
//! receiver state machine.

pub mod codec;
pub mod packet;
pub mod receiver;

pub use codec::{checksum, decode_body, encode, ProtocolError};
pub use packet::*;
pub use receiver::{FrameReceiver, ReceiverState};
