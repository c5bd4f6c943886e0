//! Error types for the message socket.
//!
//! Every fallible operation in this crate returns [`Result<T>`], which uses
//! [`Error`]. Errors are scoped to the call that produced them: a failed send
//! does not close the connection, and a failed receive does not poison the
//! send queue.
//!
//! # Usage
//!
//! ```ignore
//! use ordered_websocket::{Error, MessageSocket, Result};
//!
//! async fn pump(socket: &MessageSocket, buf: &mut [u8]) -> Result<()> {
//!     match socket.receive_message(buf, &CancellationToken::new()).await {
//!         Ok(message) => println!("{} bytes", message.data.len()),
//!         Err(Error::BufferExhausted { capacity }) => println!("need more than {capacity}"),
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Protocol | [`Error::InvalidOpcode`], [`Error::InvalidArgument`], [`Error::Protocol`] |
//! | Transport | [`Error::Transport`], [`Error::WebSocket`], [`Error::Io`] |
//! | Receive | [`Error::BufferExhausted`] |
//! | Lifecycle | [`Error::Cancelled`], [`Error::ConnectionClosed`], [`Error::QueueClosed`] |
//! | Queue | [`Error::TaskPanicked`], [`Error::RuntimeUnavailable`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Opcode outside the supported set {0x1, 0x2, 0x8}.
    ///
    /// Returned when the transport reports a frame type that has no
    /// [`MessageKind`](crate::MessageKind).
    #[error("Invalid opcode: {opcode:#x}")]
    InvalidOpcode {
        /// The offending opcode.
        opcode: u8,
    },

    /// Invalid argument passed to an operation.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// The transport broke its own contract.
    ///
    /// Returned when a frame report is inconsistent, e.g. more bytes than
    /// the buffer slice it was handed.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Underlying frame transport failed.
    #[error("Transport failure: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// WebSocket error from the tungstenite adapter.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    // ========================================================================
    // Receive Errors
    // ========================================================================
    /// Receive buffer filled up before the final fragment arrived.
    #[error("Receive buffer exhausted after {capacity} bytes without a final fragment")]
    BufferExhausted {
        /// Size of the caller's buffer.
        capacity: usize,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// The caller's cancellation token fired.
    #[error("Operation cancelled")]
    Cancelled,

    /// The connection is closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// The send queue no longer accepts work.
    #[error("Send queue closed")]
    QueueClosed,

    // ========================================================================
    // Queue Errors
    // ========================================================================
    /// A queued work item panicked while running.
    #[error("Queued task panicked")]
    TaskPanicked,

    /// Work was enqueued outside a tokio runtime.
    #[error("No tokio runtime available to run the send queue")]
    RuntimeUnavailable,
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid opcode error.
    #[inline]
    pub fn invalid_opcode(opcode: u8) -> Self {
        Self::InvalidOpcode { opcode }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a transport failure.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a buffer exhausted error.
    #[inline]
    pub fn buffer_exhausted(capacity: usize) -> Self {
        Self::BufferExhausted { capacity }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the caller's cancellation token caused this error.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::WebSocket(_)
                | Self::Io(_)
                | Self::ConnectionClosed
                | Self::QueueClosed
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry with the same connection,
    /// possibly with a larger buffer or a fresh token.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Cancelled | Self::BufferExhausted { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
