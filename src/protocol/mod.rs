//! Message kinds, wire opcodes, and close codes.
//!
//! # Opcodes
//!
//! | Opcode | Kind |
//! |--------|------|
//! | `0x1` | [`MessageKind::Text`] |
//! | `0x2` | [`MessageKind::Binary`] |
//! | `0x8` | [`MessageKind::Close`] |
//!
//! Any other opcode is rejected with
//! [`Error::InvalidOpcode`](crate::Error::InvalidOpcode).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `close` | Close status codes |
//! | `opcode` | Opcode translator and [`MessageKind`] |

// ============================================================================
// Submodules
// ============================================================================

/// Close status codes.
pub mod close;

/// Opcode translator.
pub mod opcode;

// ============================================================================
// Re-exports
// ============================================================================

pub use close::CloseStatus;
pub use opcode::{
    BINARY_OPCODE, CLOSE_OPCODE, CONTINUATION_OPCODE, MessageKind, TEXT_OPCODE, kind_to_opcode,
    opcode_to_kind,
};
