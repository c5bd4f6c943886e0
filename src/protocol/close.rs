//! Close status codes.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// CloseStatus
// ============================================================================

/// Status code sent with a close request.
///
/// Named variants cover the codes an application normally sends. Anything
/// else travels as [`CloseStatus::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseStatus {
    /// 1000: the purpose of the connection has been fulfilled.
    NormalClosure,
    /// 1001: the endpoint is going away.
    EndpointUnavailable,
    /// 1002: protocol error.
    ProtocolError,
    /// 1003: received a message kind it cannot accept.
    InvalidMessageType,
    /// 1005: no status code was present.
    Empty,
    /// 1007: payload data inconsistent with the message kind.
    InvalidPayloadData,
    /// 1008: policy violation.
    PolicyViolation,
    /// 1009: message too big to process.
    MessageTooBig,
    /// 1010: the client expected an extension the server did not negotiate.
    MandatoryExtension,
    /// 1011: unexpected server condition.
    InternalServerError,
    /// Any other code.
    Other(u16),
}

impl CloseStatus {
    /// Returns the numeric code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::NormalClosure => 1000,
            Self::EndpointUnavailable => 1001,
            Self::ProtocolError => 1002,
            Self::InvalidMessageType => 1003,
            Self::Empty => 1005,
            Self::InvalidPayloadData => 1007,
            Self::PolicyViolation => 1008,
            Self::MessageTooBig => 1009,
            Self::MandatoryExtension => 1010,
            Self::InternalServerError => 1011,
            Self::Other(code) => code,
        }
    }
}

impl From<u16> for CloseStatus {
    fn from(code: u16) -> Self {
        match code {
            1000 => Self::NormalClosure,
            1001 => Self::EndpointUnavailable,
            1002 => Self::ProtocolError,
            1003 => Self::InvalidMessageType,
            1005 => Self::Empty,
            1007 => Self::InvalidPayloadData,
            1008 => Self::PolicyViolation,
            1009 => Self::MessageTooBig,
            1010 => Self::MandatoryExtension,
            1011 => Self::InternalServerError,
            other => Self::Other(other),
        }
    }
}

impl From<CloseStatus> for u16 {
    fn from(status: CloseStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for CloseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Tests
// ============================================================================
