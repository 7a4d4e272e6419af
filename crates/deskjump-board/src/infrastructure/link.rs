//! Stream-backed inter-board link transport.
//!
//! The link is a point-to-point byte stream with no flow control and no
//! acknowledgements; frame integrity is the protocol layer's job. The
//! transport works over any `AsyncRead + AsyncWrite` stream: TCP between
//! two board processes in production, `tokio::io::duplex` in tests.
//!
//! Two tasks own the stream halves:
//!
//! - the **writer task** drains an outgoing packet channel and writes
//!   each encoded 23-byte frame with a single `write_all`, so a frame
//!   is never interleaved with another;
//! - the **reader task** pushes every read burst through a
//!   [`FrameReceiver`] and forwards decoded packets to the host loop's
//!   channel.
//!
//! Dropping either end of the stream ends both tasks; the host loop
//! observes the closed packet channel and marks the peer disconnected.

use std::sync::Arc;

use async_trait::async_trait;
use deskjump_core::protocol::codec::encode;
use deskjump_core::protocol::packet::Packet;
use deskjump_core::protocol::receiver::FrameReceiver;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::route_input::LinkTransmitter;

/// Error type for link transport setup.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("bind failed on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

// ── Establishing the stream ───────────────────────────────────────────────────

/// Listens on `addr` and accepts exactly one peer. The link is strictly
/// point-to-point; later connection attempts are not serviced.
pub async fn listen(addr: &str) -> Result<TcpStream, LinkError> {
    let listener = TcpListener::bind(addr).await.map_err(|source| LinkError::Bind {
        addr: addr.to_string(),
        source,
    })?;
    info!(addr, "waiting for peer board");
    let (stream, peer) = listener.accept().await.map_err(LinkError::Accept)?;
    info!(%peer, "peer board connected");
    Ok(stream)
}

/// Connects to the peer at `addr`, retrying with a fixed backoff until
/// it answers. The boards boot independently; whichever comes up second
/// finds the first one listening.
pub async fn connect(addr: &str) -> Result<TcpStream, LinkError> {
    const RETRY_DELAY: std::time::Duration = std::time::Duration::from_millis(500);
    const MAX_ATTEMPTS: u32 = 60;

    let mut last_err = None;
    for attempt in 1..=MAX_ATTEMPTS {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                info!(addr, "connected to peer board");
                return Ok(stream);
            }
            Err(source) => {
                debug!(addr, attempt, %source, "peer not answering yet");
                last_err = Some(source);
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
    Err(LinkError::Connect {
        addr: addr.to_string(),
        source: last_err.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::TimedOut, "no connection attempt made")
        }),
    })
}

// ── Channel-backed transmitter ────────────────────────────────────────────────

/// [`LinkTransmitter`] that hands packets to the writer task.
pub struct ChannelLinkTx {
    tx: mpsc::UnboundedSender<Packet>,
}

#[async_trait]
impl LinkTransmitter for ChannelLinkTx {
    async fn send(&self, packet: Packet) -> Result<(), String> {
        self.tx
            .send(packet)
            .map_err(|_| "link writer task gone".to_string())
    }
}

// ── Task spawning ─────────────────────────────────────────────────────────────

/// Running transport handles for one link.
pub struct LinkHandles {
    /// Transmitter to inject into the application layer.
    pub tx: Arc<ChannelLinkTx>,
    /// Decoded inbound packets, consumed by the host loop.
    pub rx: mpsc::UnboundedReceiver<Packet>,
    pub writer: JoinHandle<()>,
    pub reader: JoinHandle<()>,
}

/// Splits `stream` and spawns the writer and reader tasks.
pub fn spawn_link<S>(stream: S) -> LinkHandles
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let (out_tx, out_rx) = mpsc::unbounded_channel::<Packet>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<Packet>();

    let writer = tokio::spawn(writer_task(write_half, out_rx));
    let reader = tokio::spawn(reader_task(read_half, in_tx));

    LinkHandles {
        tx: Arc::new(ChannelLinkTx { tx: out_tx }),
        rx: in_rx,
        writer,
        reader,
    }
}

async fn writer_task<W>(mut write_half: W, mut out_rx: mpsc::UnboundedReceiver<Packet>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(packet) = out_rx.recv().await {
        let frame = encode(&packet);
        if let Err(err) = write_half.write_all(&frame).await {
            warn!(%err, "link write failed; writer stopping");
            break;
        }
    }
    debug!("link writer task ended");
}

async fn reader_task<R>(mut read_half: R, in_tx: mpsc::UnboundedSender<Packet>)
where
    R: AsyncRead + Unpin,
{
    let mut receiver = FrameReceiver::new();
    let mut buf = [0u8; 256];
    loop {
        match read_half.read(&mut buf).await {
            Ok(0) => {
                info!("link stream closed by peer");
                break;
            }
            Ok(n) => {
                let mut channel_gone = false;
                receiver.drain(&buf[..n], |packet| {
                    if in_tx.send(packet).is_err() {
                        channel_gone = true;
                    }
                });
                if channel_gone {
                    break;
                }
            }
            Err(err) => {
                warn!(%err, "link read failed; reader stopping");
                break;
            }
        }
    }
    debug!("link reader task ended");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use deskjump_core::protocol::packet::MessageType;
    use std::time::Duration;

    #[tokio::test]
    async fn test_packets_cross_a_duplex_stream() {
        // Arrange: two "boards" joined by an in-memory stream.
        let (a_stream, b_stream) = tokio::io::duplex(1024);
        let mut a = spawn_link(a_stream);
        let mut b = spawn_link(b_stream);

        // Act: A sends two packets, B answers one.
        a.tx.send(Packet::value(MessageType::OutputSelect, 1))
            .await
            .unwrap();
        a.tx.send(Packet::empty(MessageType::OutputGet)).await.unwrap();
        b.tx.send(Packet::value(MessageType::OutputSelect, 0))
            .await
            .unwrap();

        // Assert
        let first = b.rx.recv().await.unwrap();
        assert_eq!(first.msg_type, MessageType::OutputSelect);
        assert_eq!(first.payload(), &[1]);
        let second = b.rx.recv().await.unwrap();
        assert_eq!(second.msg_type, MessageType::OutputGet);

        let reply = a.rx.recv().await.unwrap();
        assert_eq!(reply.payload(), &[0]);
    }

    #[tokio::test]
    async fn test_reader_channel_closes_when_peer_drops() {
        let (a_stream, b_stream) = tokio::io::duplex(1024);
        let mut a = spawn_link(a_stream);
        let b = spawn_link(b_stream);

        // Dropping B's handles drops its stream half entirely.
        drop(b.rx);
        drop(b.tx);
        b.writer.abort();
        b.reader.abort();
        // Give the abort a moment to release the duplex half.
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(a.rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_send_after_writer_gone_reports_error() {
        let (a_stream, _b_stream) = tokio::io::duplex(64);
        let a = spawn_link(a_stream);
        a.writer.abort();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let result = a.tx.send(Packet::empty(MessageType::OutputGet)).await;
        assert!(result.is_err());
    }
}
