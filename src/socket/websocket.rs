//! Application-facing WebSocket trait.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::protocol::{CloseStatus, MessageKind};
use crate::socket::core::{MessageSocket, ReceivedMessage};
use crate::socket::queue::QueuedTask;

// ============================================================================
// WebSocket
// ============================================================================

/// Message-level WebSocket operations.
///
/// Application code that only needs to send, receive and close can depend on
/// this trait instead of [`MessageSocket`], which makes it easy to swap in a
/// fake connection.
#[async_trait]
pub trait WebSocket: Send + Sync {
    /// Queues one frame for sending.
    fn send(
        &self,
        data: &[u8],
        kind: MessageKind,
        is_final: bool,
        cancel: &CancellationToken,
    ) -> QueuedTask<()>;

    /// Queues one text frame.
    fn send_text(&self, data: &[u8], is_final: bool, cancel: &CancellationToken) -> QueuedTask<()> {
        self.send(data, MessageKind::Text, is_final, cancel)
    }

    /// Queues one binary frame.
    fn send_binary(
        &self,
        data: &[u8],
        is_final: bool,
        cancel: &CancellationToken,
    ) -> QueuedTask<()> {
        self.send(data, MessageKind::Binary, is_final, cancel)
    }

    /// Closes the connection.
    async fn close(
        &self,
        status: CloseStatus,
        description: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Receives one complete message into `buffer`.
    async fn receive_message<'b>(
        &self,
        buffer: &'b mut [u8],
        cancel: &CancellationToken,
    ) -> Result<ReceivedMessage<'b>>;

    /// Close status received from the peer, if tracked.
    fn close_status(&self) -> Option<CloseStatus>;

    /// Close description received from the peer, if tracked.
    fn close_status_description(&self) -> Option<&str>;
}

#[async_trait]
impl WebSocket for MessageSocket {
    fn send(
        &self,
        data: &[u8],
        kind: MessageKind,
        is_final: bool,
        cancel: &CancellationToken,
    ) -> QueuedTask<()> {
        MessageSocket::send(self, data, kind, is_final, cancel)
    }

    async fn close(
        &self,
        status: CloseStatus,
        description: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        MessageSocket::close(self, status, description, cancel).await
    }

    async fn receive_message<'b>(
        &self,
        buffer: &'b mut [u8],
        cancel: &CancellationToken,
    ) -> Result<ReceivedMessage<'b>> {
        MessageSocket::receive_message(self, buffer, cancel).await
    }

    fn close_status(&self) -> Option<CloseStatus> {
        MessageSocket::close_status(self)
    }

    fn close_status_description(&self) -> Option<&str> {
        MessageSocket::close_status_description(self)
    }
}
