//! Error types for the protocol boundary.
//!
//! The broker distinguishes two classes of bad input: a malformed envelope
//! (wrong frame shape, caught at every tier) and a malformed payload (codec
//! or domain decode failure, caught only in the worker). Both are drop-and-log
//! conditions, never fatal ones, so each decoding function surfaces them as
//! an explicit error value for the caller to handle.

use thiserror::Error;

use crate::types::Identity;

/// Failure to interpret a frame as a routing identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The frame did not have the fixed identity width.
    #[error("identity frame must be {expected} bytes, got {got}", expected = Identity::WIRE_LEN)]
    Length {
        /// Actual frame length.
        got: usize,
    },

    /// The string form could not be parsed back into an identity.
    #[error("malformed identity string: {0}")]
    Parse(#[from] uuid::Error),
}

/// A frame sequence that does not have the `[identity, delimiter, body...]`
/// envelope shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// An envelope needs at least an identity frame and a delimiter frame.
    #[error("envelope must have at least 2 frames, got {got}")]
    TooFewFrames {
        /// Actual frame count.
        got: usize,
    },

    /// The leading frame is not a valid identity.
    #[error("bad identity frame: {0}")]
    Identity(#[from] IdentityError),

    /// The second frame must be the empty delimiter.
    #[error("delimiter frame must be empty, got {got} bytes")]
    Delimiter {
        /// Actual delimiter length.
        got: usize,
    },
}

/// A message body that cannot be decoded into a domain message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The body contained no frames at all.
    #[error("empty message body")]
    EmptyMessage,

    /// The hint frame must be exactly one byte.
    #[error("hint frame must be exactly 1 byte, got {got}")]
    HintFrame {
        /// Actual hint frame length.
        got: usize,
    },

    /// The hint byte is outside the closed hint table.
    #[error("unknown hint byte {0:#04x}")]
    UnknownHint(u8),

    /// A fixed-size variant payload had the wrong length.
    #[error("payload for hint {hint:#04x} must be {expected} bytes, got {got}")]
    PayloadLength {
        /// Hint whose payload was malformed.
        hint: u8,
        /// Required payload length for that hint.
        expected: usize,
        /// Actual payload length.
        got: usize,
    },

    /// A name payload was not valid UTF-8.
    #[error("name payload is not valid UTF-8: {0}")]
    Name(#[from] std::string::FromUtf8Error),

    /// An identity embedded in a payload was malformed.
    #[error("bad identity in payload: {0}")]
    Identity(#[from] IdentityError),
}
