//! Core identifier types.
//!
//! An [`Identity`] is the one piece of state every tier agrees on: the
//! transport assigns it when a connection is accepted, the broker routes by
//! it, and the world store keys entities by its string form. It is a wrapper
//! around UUID so identities cannot be confused with other byte blobs in the
//! system.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IdentityError;

/// Routing identity of one connected client session.
///
/// The transport layer mints a fresh identity per accepted connection and
/// exposes it as the leading frame of every inbound envelope. The same value
/// doubles as the domain entity key: its hyphenated string form is what the
/// world store sees. An identity is stable for the life of a connection and
/// meaningless after disconnect - no two live sessions ever share one.
///
/// On the wire an identity is its 16 raw UUID bytes, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(pub Uuid);

impl Identity {
    /// Fixed width of an identity frame on the wire.
    pub const WIRE_LEN: usize = 16;

    /// Mints a new random identity (UUID v4).
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identity from its 16-byte wire form.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, IdentityError> {
        if bytes.len() != Self::WIRE_LEN {
            return Err(IdentityError::Length { got: bytes.len() });
        }
        let mut raw = [0u8; Self::WIRE_LEN];
        raw.copy_from_slice(bytes);
        Ok(Self(Uuid::from_bytes(raw)))
    }

    /// The 16-byte wire form as an owned frame.
    pub fn to_frame(&self) -> Bytes {
        Bytes::copy_from_slice(self.0.as_bytes())
    }

    /// The raw wire bytes.
    pub fn as_bytes(&self) -> &[u8; Self::WIRE_LEN] {
        self.0.as_bytes()
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_round_trip() {
        let id = Identity::new();
        let frame = id.to_frame();
        assert_eq!(frame.len(), Identity::WIRE_LEN);
        assert_eq!(Identity::from_wire(&frame).unwrap(), id);
    }

    #[test]
    fn string_round_trip() {
        let id = Identity::new();
        let parsed: Identity = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_wrong_width() {
        assert_eq!(
            Identity::from_wire(&[0u8; 4]),
            Err(IdentityError::Length { got: 4 })
        );
        assert_eq!(
            Identity::from_wire(&[]),
            Err(IdentityError::Length { got: 0 })
        );
    }

    #[test]
    fn identities_are_unique() {
        assert_ne!(Identity::new(), Identity::new());
    }
}
