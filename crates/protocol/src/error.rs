//! Error types for the protocol crate.

use thiserror::Error;

/// Protocol error type covering all possible failure modes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload does not fit in the 16-bit length field.
    #[error("payload too large: {size} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge {
        /// Actual payload size.
        size: usize,
        /// Maximum representable payload size.
        max: usize,
    },

    /// Payload length does not match what the opcode requires.
    #[error("bad payload for opcode {opcode}: expected {expected} bytes, got {got}")]
    BadPayload {
        /// Opcode of the offending frame.
        opcode: u8,
        /// Required payload length for this opcode.
        expected: usize,
        /// Actual payload length.
        got: usize,
    },
}
