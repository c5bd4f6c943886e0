//! Ordered WebSocket - per-connection message socket over a frame transport.
//!
//! This library sits between application code and a host-supplied frame
//! transport (send frame, receive frame, close). It adds two things most
//! WebSocket integrations need:
//!
//! - **Ordered sends**: concurrent send calls are written one at a time, in
//!   the order they were issued
//! - **Reassembly**: fragments of one message are collected into a caller
//!   buffer and tagged with their [`MessageKind`]
//!
//! # Architecture
//!
//! ```text
//! application ──► MessageSocket ──► SendQueue ──► FrameTransport::send_frame
//!                     │
//!                     ├──► receive loop ◄──────── FrameTransport::receive_frame
//!                     └──► close ───────────────► FrameTransport::close_connection
//! ```
//!
//! The wire protocol itself (frame headers, masking, ping/pong) is the
//! transport's job. [`TungsteniteTransport`] provides one over an upgraded
//! tokio-tungstenite stream.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ordered_websocket::{CloseStatus, MessageSocket, Result, TungsteniteTransport};
//! use tokio::net::TcpListener;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:9000").await?;
//!     let (stream, _) = listener.accept().await?;
//!     let ws_stream = tokio_tungstenite::accept_async(stream).await?;
//!
//!     let socket = MessageSocket::new(Arc::new(TungsteniteTransport::new(ws_stream)));
//!     let cancel = CancellationToken::new();
//!
//!     let mut buffer = vec![0u8; 64 * 1024];
//!     let message = socket.receive_message(&mut buffer, &cancel).await?;
//!     socket.send(message.data, message.kind, true, &cancel).await?;
//!
//!     socket.close(CloseStatus::NormalClosure, "done", &cancel).await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | [`MessageKind`], opcodes, [`CloseStatus`] |
//! | [`socket`] | [`MessageSocket`], [`SendQueue`], options |
//! | [`transport`] | [`FrameTransport`] and the tungstenite adapter |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Message kinds, opcodes, and close codes.
pub mod protocol;

/// Message socket, send queue, and options.
pub mod socket;

/// Frame transport capability set.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::ConnectionId;

// Protocol types
pub use protocol::{CloseStatus, MessageKind, kind_to_opcode, opcode_to_kind};

// Socket types
pub use socket::{
    MessageSocket, QueuedTask, ReceivedMessage, SendContext, SendQueue, SocketOptions,
    SocketState, WebSocket,
};

// Transport types
pub use transport::{FrameTransport, ReceivedFrame, TungsteniteTransport};
