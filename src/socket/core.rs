//! Message socket implementation.
//!
//! [`MessageSocket`] combines the ordered send queue, the opcode translator
//! and the fragment reassembly loop on top of a [`FrameTransport`].
//!
//! # State Machine
//!
//! ```text
//! Open ──close()──► Closing ──transport ok──► Closed
//!   ▲                  │
//!   └──transport err───┘
//! ```
//!
//! Sends and receives are accepted while `Open` or `Closing` and fail with
//! [`Error::ConnectionClosed`] once `Closed`.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::protocol::{
    CONTINUATION_OPCODE, CloseStatus, MessageKind, kind_to_opcode, opcode_to_kind,
};
use crate::socket::context::SendContext;
use crate::socket::options::SocketOptions;
use crate::socket::queue::{QueuedTask, SendQueue};
use crate::transport::FrameTransport;

// ============================================================================
// SocketState
// ============================================================================

/// Lifecycle state of a [`MessageSocket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    /// Accepting sends and receives.
    Open,
    /// A close request is in flight.
    Closing,
    /// The transport has been closed.
    Closed,
}

// ============================================================================
// ReceivedMessage
// ============================================================================

/// A reassembled message borrowed from the caller's buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct ReceivedMessage<'a> {
    /// Message bytes, `buffer[..len]`.
    pub data: &'a [u8],
    /// Kind taken from the first fragment.
    pub kind: MessageKind,
    /// Number of fragments that made up the message.
    pub fragments: usize,
}

// ============================================================================
// MessageSocket
// ============================================================================

/// Per-connection WebSocket message socket.
///
/// # Thread Safety
///
/// `MessageSocket` is `Send + Sync`. Share it behind an [`Arc`] to send
/// from several tasks; the send queue serializes them. Run at most one
/// [`receive_message`](Self::receive_message) loop at a time.
pub struct MessageSocket {
    /// Connection identifier for logs.
    id: ConnectionId,
    /// Host-supplied frame operations.
    transport: Arc<dyn FrameTransport>,
    /// Serializes sends.
    send_queue: SendQueue,
    /// Socket options.
    options: SocketOptions,
    /// Lifecycle state.
    state: Mutex<SocketState>,
}

// ============================================================================
// MessageSocket - Constructor
// ============================================================================

impl MessageSocket {
    /// Creates a socket with default options.
    pub fn new(transport: Arc<dyn FrameTransport>) -> Self {
        Self::with_options(transport, SocketOptions::default())
    }

    /// Creates a socket with custom options.
    pub fn with_options(transport: Arc<dyn FrameTransport>, options: SocketOptions) -> Self {
        let id = ConnectionId::next();
        debug!(connection = %id, label = options.label.as_deref(), "Message socket created");

        Self {
            id,
            transport,
            send_queue: SendQueue::new(),
            options,
            state: Mutex::new(SocketState::Open),
        }
    }
}

// ============================================================================
// MessageSocket - Accessors
// ============================================================================

impl MessageSocket {
    /// Returns the connection ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the socket options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SocketOptions {
        &self.options
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SocketState {
        *self.state.lock()
    }

    /// Returns the send queue.
    #[inline]
    #[must_use]
    pub fn send_queue(&self) -> &SendQueue {
        &self.send_queue
    }

    /// Close status received from the peer.
    ///
    /// Always `None`: close handshake state belongs to the transport.
    #[inline]
    #[must_use]
    pub fn close_status(&self) -> Option<CloseStatus> {
        None
    }

    /// Close description received from the peer.
    ///
    /// Always `None`, like [`close_status`](Self::close_status).
    #[inline]
    #[must_use]
    pub fn close_status_description(&self) -> Option<&str> {
        None
    }

    fn ensure_not_closed(&self) -> Result<()> {
        if *self.state.lock() == SocketState::Closed {
            return Err(Error::ConnectionClosed);
        }
        Ok(())
    }
}

// ============================================================================
// MessageSocket - Send
// ============================================================================

impl MessageSocket {
    /// Sends a text frame. See [`send`](Self::send).
    pub fn send_text(
        &self,
        data: &[u8],
        is_final: bool,
        cancel: &CancellationToken,
    ) -> QueuedTask<()> {
        self.send(data, MessageKind::Text, is_final, cancel)
    }

    /// Sends a binary frame. See [`send`](Self::send).
    pub fn send_binary(
        &self,
        data: &[u8],
        is_final: bool,
        cancel: &CancellationToken,
    ) -> QueuedTask<()> {
        self.send(data, MessageKind::Binary, is_final, cancel)
    }

    /// Queues one frame for sending.
    ///
    /// The frame's position is fixed when this method returns. The returned
    /// task resolves after the transport has written exactly this frame.
    /// `data` is copied, so the caller may reuse it immediately.
    ///
    /// # Errors
    ///
    /// The returned task resolves with:
    ///
    /// - [`Error::ConnectionClosed`] if the socket is closed
    /// - [`Error::QueueClosed`] if the socket closed while this call raced it
    /// - [`Error::Cancelled`] if `cancel` fired before the frame's turn
    /// - [`Error::RuntimeUnavailable`] if called outside a tokio runtime
    /// - any transport error for this frame
    pub fn send(
        &self,
        data: &[u8],
        kind: MessageKind,
        is_final: bool,
        cancel: &CancellationToken,
    ) -> QueuedTask<()> {
        if let Err(e) = self.ensure_not_closed() {
            return QueuedTask::ready(Err(e));
        }

        let context = SendContext::new(data, is_final, kind, cancel.clone());
        let transport = Arc::clone(&self.transport);
        let id = self.id;

        self.send_queue.enqueue(
            move |context: SendContext| async move {
                if context.cancel().is_cancelled() {
                    trace!(connection = %id, kind = %context.kind(), "Skipping cancelled send");
                    return Err(Error::Cancelled);
                }

                transport
                    .send_frame(
                        context.data(),
                        kind_to_opcode(context.kind()),
                        context.is_final(),
                        context.cancel(),
                    )
                    .await?;

                trace!(
                    connection = %id,
                    kind = %context.kind(),
                    bytes = context.data().len(),
                    is_final = context.is_final(),
                    "Frame sent"
                );
                Ok(())
            },
            context,
        )
    }
}

// ============================================================================
// MessageSocket - Close
// ============================================================================

impl MessageSocket {
    /// Closes the connection.
    ///
    /// Goes straight to the transport without waiting for queued sends.
    /// Sends still queued will most likely fail.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the socket is not open
    /// - [`Error::Cancelled`] if `cancel` already fired
    /// - any transport error; the socket goes back to open
    ///
    /// Dropping the returned future before it completes also leaves the
    /// socket open.
    pub async fn close(
        &self,
        status: CloseStatus,
        description: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        {
            let mut state = self.state.lock();
            if *state != SocketState::Open {
                return Err(Error::ConnectionClosed);
            }
            *state = SocketState::Closing;
        }
        let reopen = ReopenGuard::new(&self.state);

        let pending = self.send_queue.pending_count();
        debug!(
            connection = %self.id,
            label = self.options.label.as_deref(),
            %status,
            pending,
            "Closing connection"
        );

        match self
            .transport
            .close_connection(status.code(), description, cancel)
            .await
        {
            Ok(()) => {
                reopen.disarm();
                *self.state.lock() = SocketState::Closed;
                self.send_queue.close();
                debug!(connection = %self.id, "Connection closed");
                Ok(())
            }
            Err(e) => {
                warn!(connection = %self.id, error = %e, "Close failed");
                Err(e)
            }
        }
    }
}

/// Puts a `Closing` socket back to `Open` unless the close completed.
///
/// Covers both a failed close and a close future dropped mid-flight.
struct ReopenGuard<'a> {
    state: Option<&'a Mutex<SocketState>>,
}

impl<'a> ReopenGuard<'a> {
    fn new(state: &'a Mutex<SocketState>) -> Self {
        Self { state: Some(state) }
    }

    fn disarm(mut self) {
        self.state = None;
    }
}

impl Drop for ReopenGuard<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.state {
            *state.lock() = SocketState::Open;
        }
    }
}

// ============================================================================
// MessageSocket - Receive
// ============================================================================

impl MessageSocket {
    /// Receives one complete message into `buffer`.
    ///
    /// Reads fragments into the unfilled tail of `buffer` until one is
    /// final. The kind comes from the first fragment; later fragments are
    /// only checked when
    /// [`strict_continuation`](SocketOptions::strict_continuation) is on.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the socket is closed
    /// - [`Error::Cancelled`] if `cancel` fires
    /// - [`Error::InvalidOpcode`] if the first fragment has no message kind
    /// - [`Error::BufferExhausted`] if `buffer` fills before the final fragment
    /// - [`Error::Protocol`] if the transport misreports a fragment
    /// - any transport error
    ///
    /// When a receive fails partway through a message, the rest of that
    /// message is discarded through [`FrameTransport::discard_message`], so
    /// the next call starts with the following message.
    pub async fn receive_message<'b>(
        &self,
        buffer: &'b mut [u8],
        cancel: &CancellationToken,
    ) -> Result<ReceivedMessage<'b>> {
        self.ensure_not_closed()?;

        let (leading_opcode, count, is_final) = self.receive_fragment(buffer, 0, cancel).await?;

        let assembled = self
            .assemble_message(buffer, leading_opcode, count, is_final, cancel)
            .await;
        let (kind, count, fragments) = match assembled {
            Ok(assembled) => assembled,
            Err(e) => {
                if !is_final {
                    // The rest of the message must not leak into the next receive.
                    self.transport.discard_message().await;
                }
                return Err(e);
            }
        };

        debug!(
            connection = %self.id,
            label = self.options.label.as_deref(),
            %kind,
            bytes = count,
            fragments,
            "Message received"
        );

        Ok(ReceivedMessage {
            data: &buffer[..count],
            kind,
            fragments,
        })
    }

    /// Reads fragments after the first one until the message is complete.
    ///
    /// Returns the message kind, total byte count and fragment count.
    async fn assemble_message(
        &self,
        buffer: &mut [u8],
        leading_opcode: u8,
        mut count: usize,
        mut is_final: bool,
        cancel: &CancellationToken,
    ) -> Result<(MessageKind, usize, usize)> {
        let capacity = buffer.len();
        let kind = opcode_to_kind(leading_opcode)?;
        let mut fragments = 1;

        while !is_final {
            if count == capacity {
                debug!(connection = %self.id, capacity, fragments, "Receive buffer exhausted");
                return Err(Error::buffer_exhausted(capacity));
            }

            let (opcode, received, last) = self.receive_fragment(buffer, count, cancel).await?;
            if self.options.strict_continuation
                && opcode != CONTINUATION_OPCODE
                && opcode != leading_opcode
            {
                return Err(Error::protocol(format!(
                    "continuation fragment reported opcode {opcode:#x} inside a {kind} message"
                )));
            }

            count += received;
            is_final = last;
            fragments += 1;
        }

        Ok((kind, count, fragments))
    }

    /// Reads one fragment into `buffer[offset..]`.
    ///
    /// Returns the fragment's opcode, byte count and final flag.
    async fn receive_fragment(
        &self,
        buffer: &mut [u8],
        offset: usize,
        cancel: &CancellationToken,
    ) -> Result<(u8, usize, bool)> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let available = buffer.len() - offset;
        let frame = self
            .transport
            .receive_frame(&mut buffer[offset..], cancel)
            .await?;

        if frame.count > available {
            return Err(Error::protocol(format!(
                "transport reported {} bytes for a {available}-byte slice",
                frame.count
            )));
        }

        trace!(
            connection = %self.id,
            opcode = frame.opcode,
            bytes = frame.count,
            is_final = frame.is_final,
            "Fragment received"
        );

        Ok((frame.opcode, frame.count, frame.is_final))
    }
}

// ============================================================================
// Tests
// ============================================================================
