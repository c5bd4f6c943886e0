//! [`FrameTransport`] over an upgraded tokio-tungstenite stream.
//!
//! tungstenite works in whole messages, so this adapter translates in both
//! directions:
//!
//! - **Send**: fragments of one message are collected until the final one,
//!   then written as a single [`Message`].
//! - **Receive**: each incoming message is handed out in pieces sized to the
//!   caller's buffer slice. The first piece carries the message opcode, later
//!   pieces report the continuation opcode, and the last one is final.
//!
//! Ping, pong and raw frames are handled by tungstenite and never surface.
//!
//! A receive abandoned partway through a message leaves the unread rest in
//! the adapter until [`FrameTransport::discard_message`] drops it; the
//! message socket does this on every failed receive.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::{
    BINARY_OPCODE, CLOSE_OPCODE, CONTINUATION_OPCODE, MessageKind, TEXT_OPCODE, opcode_to_kind,
};
use crate::transport::{FrameTransport, ReceivedFrame};

// ============================================================================
// Types
// ============================================================================

/// Fragments of an outgoing message collected so far.
struct PartialMessage {
    kind: MessageKind,
    data: Vec<u8>,
}

/// An incoming message not yet fully copied out.
struct PendingMessage {
    opcode: u8,
    data: Vec<u8>,
    offset: usize,
}

struct Writer<S> {
    sink: SplitSink<WebSocketStream<S>, Message>,
    partial: Option<PartialMessage>,
}

struct Reader<S> {
    stream: SplitStream<WebSocketStream<S>>,
    pending: Option<PendingMessage>,
}

// ============================================================================
// TungsteniteTransport
// ============================================================================

/// Frame transport backed by a [`WebSocketStream`].
///
/// The stream must already be upgraded. Handshake and routing happen
/// elsewhere.
pub struct TungsteniteTransport<S> {
    writer: Mutex<Writer<S>>,
    reader: Mutex<Reader<S>>,
}

impl<S> TungsteniteTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an upgraded WebSocket stream.
    pub fn new(ws_stream: WebSocketStream<S>) -> Self {
        let (sink, stream) = ws_stream.split();

        Self {
            writer: Mutex::new(Writer {
                sink,
                partial: None,
            }),
            reader: Mutex::new(Reader {
                stream,
                pending: None,
            }),
        }
    }
}

// ============================================================================
// TungsteniteTransport - Helpers
// ============================================================================

/// Runs `operation` unless `cancel` fires first.
async fn cancellable<T>(
    cancel: &CancellationToken,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = operation => result,
    }
}

/// Builds the tungstenite message for a completed outgoing payload.
fn build_message(kind: MessageKind, data: Vec<u8>) -> Result<Message> {
    match kind {
        MessageKind::Text => {
            let text = String::from_utf8(data)
                .map_err(|e| Error::invalid_argument(format!("text payload is not UTF-8: {e}")))?;
            Ok(Message::Text(text.into()))
        }
        MessageKind::Binary => Ok(Message::Binary(data.into())),
        MessageKind::Close => {
            if data.is_empty() {
                return Ok(Message::Close(None));
            }
            if data.len() < 2 {
                return Err(Error::invalid_argument(
                    "close payload must start with a 2-byte status code",
                ));
            }
            let code = u16::from_be_bytes([data[0], data[1]]);
            let reason = String::from_utf8(data[2..].to_vec())
                .map_err(|e| Error::invalid_argument(format!("close reason is not UTF-8: {e}")))?;
            Ok(close_message(code, &reason))
        }
    }
}

/// Builds the close message for `status`.
///
/// 1005, 1006 and 1015 are reserved and must never appear on the wire, so
/// they produce a close frame with no payload.
fn close_message(status: u16, description: &str) -> Message {
    match CloseCode::from(status) {
        CloseCode::Status | CloseCode::Abnormal | CloseCode::Tls => Message::Close(None),
        code => Message::Close(Some(CloseFrame {
            code,
            reason: description.to_owned().into(),
        })),
    }
}

/// Extracts the opcode and payload of an incoming message.
///
/// Returns `None` for messages that are not surfaced to the reader.
fn incoming_payload(message: Message) -> Option<(u8, Vec<u8>)> {
    match message {
        Message::Text(text) => Some((TEXT_OPCODE, text.as_bytes().to_vec())),
        Message::Binary(data) => Some((BINARY_OPCODE, data.to_vec())),
        Message::Close(frame) => {
            let payload = frame
                .map(|frame| {
                    let mut payload = u16::from(frame.code).to_be_bytes().to_vec();
                    payload.extend_from_slice(frame.reason.as_bytes());
                    payload
                })
                .unwrap_or_default();
            Some((CLOSE_OPCODE, payload))
        }
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => None,
    }
}

// ============================================================================
// FrameTransport Implementation
// ============================================================================

#[async_trait]
impl<S> FrameTransport for TungsteniteTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send_frame(
        &self,
        data: &[u8],
        opcode: u8,
        is_final: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut writer = self.writer.lock().await;

        let mut partial = match writer.partial.take() {
            Some(mut partial) => {
                if opcode != CONTINUATION_OPCODE && opcode != partial.kind.opcode() {
                    let kind = partial.kind;
                    writer.partial = Some(partial);
                    return Err(Error::protocol(format!(
                        "opcode {opcode:#x} sent while a {kind} message is in progress"
                    )));
                }
                partial.data.extend_from_slice(data);
                partial
            }
            None => PartialMessage {
                kind: opcode_to_kind(opcode)?,
                data: data.to_vec(),
            },
        };

        if !is_final {
            if partial.kind == MessageKind::Close {
                return Err(Error::invalid_argument("close frames cannot be fragmented"));
            }
            trace!(
                kind = %partial.kind,
                buffered = partial.data.len(),
                "Buffered outgoing fragment"
            );
            writer.partial = Some(partial);
            return Ok(());
        }

        let kind = partial.kind;
        let message = build_message(kind, std::mem::take(&mut partial.data))?;
        let bytes = message.len();

        cancellable(cancel, async {
            writer.sink.send(message).await.map_err(Error::from)
        })
        .await?;

        trace!(%kind, bytes, "Message written");
        Ok(())
    }

    async fn receive_frame(
        &self,
        buffer: &mut [u8],
        cancel: &CancellationToken,
    ) -> Result<ReceivedFrame> {
        let mut reader = self.reader.lock().await;

        let first_piece = reader.pending.is_none();
        if first_piece {
            let (opcode, data) = cancellable(cancel, async {
                loop {
                    match reader.stream.next().await {
                        Some(Ok(message)) => {
                            if let Some(payload) = incoming_payload(message) {
                                return Ok(payload);
                            }
                        }
                        Some(Err(e)) => return Err(Error::from(e)),
                        None => {
                            debug!("WebSocket stream ended");
                            return Err(Error::ConnectionClosed);
                        }
                    }
                }
            })
            .await?;

            reader.pending = Some(PendingMessage {
                opcode,
                data,
                offset: 0,
            });
        }

        let Some(pending) = reader.pending.as_mut() else {
            return Err(Error::protocol("no pending message after read"));
        };

        let remaining = &pending.data[pending.offset..];
        let count = remaining.len().min(buffer.len());
        buffer[..count].copy_from_slice(&remaining[..count]);
        pending.offset += count;

        let opcode = if first_piece {
            pending.opcode
        } else {
            CONTINUATION_OPCODE
        };
        let is_final = pending.offset == pending.data.len();

        if is_final {
            reader.pending = None;
        }

        Ok(ReceivedFrame::new(opcode, is_final, count))
    }

    async fn close_connection(
        &self,
        status: u16,
        description: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.partial = None;

        let message = close_message(status, description);

        cancellable(cancel, async { writer.sink.send(message).await.map_err(Error::from) })
            .await?;

        debug!(status, "Close frame sent");
        Ok(())
    }

    async fn discard_message(&self) {
        if let Some(pending) = self.reader.lock().await.pending.take() {
            trace!(
                skipped = pending.data.len() - pending.offset,
                "Discarded rest of abandoned message"
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
