//! Send work-item context.

// ============================================================================
// Imports
// ============================================================================

use tokio_util::sync::CancellationToken;

use crate::protocol::MessageKind;

// ============================================================================
// SendContext
// ============================================================================

/// Everything one queued send needs once its turn comes.
///
/// Owns a copy of the payload, so the caller's buffer is free as soon as
/// [`MessageSocket::send`](crate::MessageSocket::send) returns.
#[derive(Debug, Clone)]
pub struct SendContext {
    data: Vec<u8>,
    is_final: bool,
    kind: MessageKind,
    cancel: CancellationToken,
}

impl SendContext {
    /// Creates a send context.
    #[must_use]
    pub fn new(
        data: impl Into<Vec<u8>>,
        is_final: bool,
        kind: MessageKind,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            data: data.into(),
            is_final,
            kind,
            cancel,
        }
    }

    /// Payload bytes.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether this frame ends the message.
    #[inline]
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Message kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Cancellation token for this send only.
    #[inline]
    #[must_use]
    pub fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }
}

// ============================================================================
// Tests
// ============================================================================
