//! Message socket: ordered sends, fragment reassembly, close.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MessageSocket`] | Per-connection facade over a [`FrameTransport`](crate::FrameTransport) |
//! | [`SendQueue`] | FIFO that runs one send at a time |
//! | [`SendContext`] | One queued send request |
//! | [`SocketOptions`] | Per-socket options |
//! | [`WebSocket`] | Trait for application code |
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ordered_websocket::{CloseStatus, FrameTransport, MessageSocket, Result};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(transport: Arc<dyn FrameTransport>) -> Result<()> {
//! let socket = MessageSocket::new(transport);
//! let cancel = CancellationToken::new();
//!
//! // Both frames are queued now and written in this order.
//! let first = socket.send_text(b"hello", true, &cancel);
//! let second = socket.send_binary(&[1, 2, 3], true, &cancel);
//! first.await?;
//! second.await?;
//!
//! let mut buffer = vec![0u8; 64 * 1024];
//! let message = socket.receive_message(&mut buffer, &cancel).await?;
//! println!("{} message, {} bytes", message.kind, message.data.len());
//!
//! socket.close(CloseStatus::NormalClosure, "bye", &cancel).await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Send work-item context.
pub mod context;

/// Message socket implementation.
pub mod core;

/// Socket options.
pub mod options;

/// Ordered send queue.
pub mod queue;

/// Application-facing trait.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use context::SendContext;
pub use core::{MessageSocket, ReceivedMessage, SocketState};
pub use options::SocketOptions;
pub use queue::{QueuedTask, SendQueue};
pub use websocket::WebSocket;
