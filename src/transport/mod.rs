//! Frame transport capability set.
//!
//! The host environment supplies three operations on an already-upgraded
//! connection: send one frame, receive one frame into a buffer slice, and
//! close. [`FrameTransport`] is that capability set as a trait, so the
//! message socket can be driven by a real WebSocket stream or by a scripted
//! mock in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                          ┌──────────────────┐
//! │  MessageSocket   │      FrameTransport      │  Host transport  │
//! │                  │─── send_frame ──────────►│                  │
//! │  SendQueue       │◄── receive_frame ────────│  (framing, mask, │
//! │  receive loop    │─── close_connection ────►│   ping/pong)     │
//! └──────────────────┘                          └──────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `tungstenite` | [`FrameTransport`] over a tokio-tungstenite stream |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// Adapter over a tokio-tungstenite WebSocket stream.
pub mod tungstenite;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::tungstenite::TungsteniteTransport;

// ============================================================================
// ReceivedFrame
// ============================================================================

/// Report for one fragment written by [`FrameTransport::receive_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedFrame {
    /// Wire opcode of the fragment. Continuations report `0x0`.
    pub opcode: u8,
    /// Whether this fragment ends the message.
    pub is_final: bool,
    /// Number of bytes written to the front of the buffer slice.
    pub count: usize,
}

impl ReceivedFrame {
    /// Creates a frame report.
    #[inline]
    #[must_use]
    pub const fn new(opcode: u8, is_final: bool, count: usize) -> Self {
        Self {
            opcode,
            is_final,
            count,
        }
    }
}

// ============================================================================
// FrameTransport
// ============================================================================

/// Host-supplied frame operations for one connection.
///
/// Implementations handle the wire protocol themselves (framing, masking,
/// ping/pong). `send_frame` is never called concurrently by
/// [`MessageSocket`](crate::MessageSocket); `receive_frame` is assumed to have
/// a single reader.
///
/// Every operation receives the caller's cancellation token and should fail
/// with [`Error::Cancelled`](crate::Error::Cancelled) once it fires.
#[async_trait]
pub trait FrameTransport: Send + Sync {
    /// Writes one frame.
    async fn send_frame(
        &self,
        data: &[u8],
        opcode: u8,
        is_final: bool,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Reads the next fragment into the front of `buffer`.
    async fn receive_frame(
        &self,
        buffer: &mut [u8],
        cancel: &CancellationToken,
    ) -> Result<ReceivedFrame>;

    /// Closes the connection with a status code and description.
    async fn close_connection(
        &self,
        status: u16,
        description: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Drops whatever is left of a message the reader gave up on.
    ///
    /// Called after a receive fails partway through a message, so the next
    /// `receive_frame` starts at a message boundary. Transports that hold
    /// no read state can keep the default.
    async fn discard_message(&self) {}
}
