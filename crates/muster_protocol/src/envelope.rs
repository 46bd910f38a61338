//! The routed envelope: `[identity, delimiter, body...]`.
//!
//! Every unit that crosses the broker is a frame sequence whose first frame
//! is the routing identity and whose second frame is an empty delimiter;
//! whatever follows is the message body. The front and relay tiers only ever
//! check this shape - the body stays opaque until a worker decodes it - and
//! forward valid sequences verbatim. [`Envelope::validate`] is the cheap
//! shape check for pass-through tiers; [`Envelope::from_frames`] is the full
//! parse for the worker.

use bytes::Bytes;

use crate::error::EnvelopeError;
use crate::types::Identity;

/// One transport unit: an ordered sequence of opaque byte frames.
pub type Frames = Vec<Bytes>;

/// A validated routed message.
///
/// Rebuilding with [`into_frames`](Envelope::into_frames) reproduces the
/// original frame sequence byte-for-byte: the identity frame, the empty
/// delimiter, then the body frames unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    identity: Identity,
    body: Vec<Bytes>,
}

impl Envelope {
    /// Wraps a message body for delivery to `identity`.
    pub fn new(identity: Identity, body: Vec<Bytes>) -> Self {
        Self { identity, body }
    }

    /// Checks the `[identity, delimiter, body...]` shape without allocating.
    ///
    /// Used by the pass-through tiers, which must drop malformed input but
    /// never inspect the body.
    pub fn validate(frames: &[Bytes]) -> Result<(), EnvelopeError> {
        Self::check(frames).map(|_| ())
    }

    /// Parses a frame sequence into an envelope, consuming it.
    pub fn from_frames(mut frames: Frames) -> Result<Self, EnvelopeError> {
        let identity = Self::check(&frames)?;
        let body = frames.split_off(2);
        Ok(Self { identity, body })
    }

    fn check(frames: &[Bytes]) -> Result<Identity, EnvelopeError> {
        if frames.len() < 2 {
            return Err(EnvelopeError::TooFewFrames { got: frames.len() });
        }
        let identity = Identity::from_wire(&frames[0])?;
        if !frames[1].is_empty() {
            return Err(EnvelopeError::Delimiter {
                got: frames[1].len(),
            });
        }
        Ok(identity)
    }

    /// The session this envelope came from or is addressed to.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// The opaque message body frames.
    pub fn body(&self) -> &[Bytes] {
        &self.body
    }

    /// Rebuilds the wire frame sequence.
    pub fn into_frames(self) -> Frames {
        let mut frames = Vec::with_capacity(self.body.len() + 2);
        frames.push(self.identity.to_frame());
        frames.push(Bytes::new());
        frames.extend(self.body);
        frames
    }
}
