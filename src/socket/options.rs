//! Message socket configuration.
//!
//! # Example
//!
//! ```ignore
//! use ordered_websocket::SocketOptions;
//!
//! let options = SocketOptions::new()
//!     .with_label("chat")
//!     .with_strict_continuation();
//! ```

// ============================================================================
// SocketOptions
// ============================================================================

/// Per-socket options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocketOptions {
    /// Extra label attached to every log line of this socket.
    pub label: Option<String>,

    /// Reject continuation fragments that carry a different opcode.
    ///
    /// When off, only the first fragment's opcode is looked at. When on, a
    /// later fragment must report either the continuation opcode (`0x0`) or
    /// the same opcode as the first one.
    pub strict_continuation: bool,
}

// ============================================================================
// Constructors
// ============================================================================

impl SocketOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            label: None,
            strict_continuation: false,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SocketOptions {
    /// Sets the log label.
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Enables strict continuation checking.
    #[inline]
    #[must_use]
    pub fn with_strict_continuation(mut self) -> Self {
        self.strict_continuation = true;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
