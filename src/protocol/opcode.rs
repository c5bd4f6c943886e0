//! Translation between wire opcodes and [`MessageKind`].
//!
//! The integer encoding stays inside this module. Everything above the
//! transport seam works with [`MessageKind`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Continuation frame opcode. Never maps to a [`MessageKind`].
pub const CONTINUATION_OPCODE: u8 = 0x0;

/// Text frame opcode.
pub const TEXT_OPCODE: u8 = 0x1;

/// Binary frame opcode.
pub const BINARY_OPCODE: u8 = 0x2;

/// Close frame opcode.
pub const CLOSE_OPCODE: u8 = 0x8;

// ============================================================================
// MessageKind
// ============================================================================

/// Kind of a logical WebSocket message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// UTF-8 text message.
    Text,
    /// Binary message.
    Binary,
    /// Close message.
    Close,
}

impl MessageKind {
    /// All message kinds.
    pub const ALL: [MessageKind; 3] = [Self::Text, Self::Binary, Self::Close];

    /// Returns the wire opcode for this kind.
    #[inline]
    #[must_use]
    pub const fn opcode(self) -> u8 {
        kind_to_opcode(self)
    }

    /// Returns a lowercase name for logging.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = Error;

    fn try_from(opcode: u8) -> Result<Self> {
        opcode_to_kind(opcode)
    }
}

impl From<MessageKind> for u8 {
    fn from(kind: MessageKind) -> Self {
        kind_to_opcode(kind)
    }
}

// ============================================================================
// Translation
// ============================================================================

/// Maps a message kind to its wire opcode.
#[inline]
#[must_use]
pub const fn kind_to_opcode(kind: MessageKind) -> u8 {
    match kind {
        MessageKind::Text => TEXT_OPCODE,
        MessageKind::Binary => BINARY_OPCODE,
        MessageKind::Close => CLOSE_OPCODE,
    }
}

/// Maps a wire opcode to its message kind.
///
/// # Errors
///
/// Returns [`Error::InvalidOpcode`] for anything outside {0x1, 0x2, 0x8},
/// including the continuation opcode.
pub fn opcode_to_kind(opcode: u8) -> Result<MessageKind> {
    match opcode {
        TEXT_OPCODE => Ok(MessageKind::Text),
        BINARY_OPCODE => Ok(MessageKind::Binary),
        CLOSE_OPCODE => Ok(MessageKind::Close),
        other => Err(Error::invalid_opcode(other)),
    }
}

// ============================================================================
// Tests
// ============================================================================
