//! The hint/payload wire codec.
//!
//! An envelope body is a [`WireMessage`] on the wire: a single-byte hint
//! frame followed by the payload bytes. Encoding always produces exactly two
//! frames; decoding accepts any number of payload frames and concatenates
//! them in order, so a message split across frames by the transport still
//! decodes to the same logical pair. Both directions are pure functions -
//! no state, no I/O, safe to call from every worker at once.

use bytes::{Bytes, BytesMut};

use crate::envelope::Frames;
use crate::error::WireError;

/// A decoded envelope body: one hint byte selecting the domain variant and
/// the variant's serialized payload, opaque at this layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    /// Single-byte discriminator from the closed hint table.
    pub hint: u8,
    /// Serialized variant body.
    pub payload: Bytes,
}

impl WireMessage {
    /// Pairs a hint with its payload.
    pub fn new(hint: u8, payload: Bytes) -> Self {
        Self { hint, payload }
    }
}

/// Decodes a message body into its `(hint, payload)` pair.
///
/// The first frame must be exactly one byte; the remaining frames,
/// concatenated in order, form the payload. The hint byte itself is not
/// checked against the hint table here - that is the domain layer's job.
pub fn decode(frames: &[Bytes]) -> Result<WireMessage, WireError> {
    let (hint_frame, rest) = frames.split_first().ok_or(WireError::EmptyMessage)?;
    if hint_frame.len() != 1 {
        return Err(WireError::HintFrame {
            got: hint_frame.len(),
        });
    }
    let payload = match rest {
        [] => Bytes::new(),
        [single] => single.clone(),
        many => {
            let mut joined = BytesMut::with_capacity(many.iter().map(Bytes::len).sum());
            for frame in many {
                joined.extend_from_slice(frame);
            }
            joined.freeze()
        }
    };
    Ok(WireMessage::new(hint_frame[0], payload))
}

/// Encodes a message into its canonical two-frame body,
/// `[hint-frame, payload-frame]`.
pub fn encode(message: &WireMessage) -> Frames {
    vec![
        Bytes::copy_from_slice(&[message.hint]),
        message.payload.clone(),
    ]
}
