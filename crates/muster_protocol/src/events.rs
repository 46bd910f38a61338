//! Domain messages and the closed hint table.
//!
//! [`DomainEvent`] is what clients send (join, move, leave);
//! [`DomainNotification`] is what the server fans back out. Each variant owns
//! exactly one reserved hint byte in [`hints`], and every payload has a fixed
//! little-endian layout. Decoders are strict: an unknown hint or a payload of
//! the wrong length is a [`WireError`], never a silent truncation.

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::WireMessage;
use crate::error::WireError;
use crate::types::Identity;

/// Reserved hint bytes, one per domain variant.
///
/// The table is closed: a hint outside it is a decode error. Inbound events
/// live below 0x10, outbound notifications at or above it.
pub mod hints {
    /// `Join { name }` - client requests entry into the world.
    pub const JOIN: u8 = 0x01;
    /// `Move { x }` - client requests a position change.
    pub const MOVE: u8 = 0x02;
    /// `Leave` - client departs the world.
    pub const LEAVE: u8 = 0x03;

    /// `Authenticated` - unicast acknowledgement of a join to its sender.
    pub const AUTHENTICATED: u8 = 0x10;
    /// `Joined { id }` - a peer entered the world.
    pub const JOINED: u8 = 0x11;
    /// `Moved { id, x }` - a peer changed position.
    pub const MOVED: u8 = 0x12;
    /// `Left { id }` - a peer departed the world.
    pub const LEFT: u8 = 0x13;
}

const F64_LEN: usize = 8;

/// An inbound client event, implicitly scoped to the sending identity.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// Enter the world under a nickname. Payload: the UTF-8 bytes of `name`.
    Join {
        /// Nickname the entity will carry in the world store.
        name: String,
    },
    /// Request a position change. Payload: 8-byte `f64` LE.
    Move {
        /// Requested 1-D position.
        x: f64,
    },
    /// Depart the world. Payload: empty.
    Leave,
}

impl DomainEvent {
    /// Decodes an event from its wire form; unknown hints and wrong-length
    /// payloads are errors.
    pub fn from_wire(message: &WireMessage) -> Result<Self, WireError> {
        match message.hint {
            hints::JOIN => Ok(Self::Join {
                name: String::from_utf8(message.payload.to_vec())?,
            }),
            hints::MOVE => {
                let payload = fixed_payload::<F64_LEN>(message)?;
                Ok(Self::Move {
                    x: f64::from_le_bytes(payload),
                })
            }
            hints::LEAVE => {
                expect_empty(message)?;
                Ok(Self::Leave)
            }
            other => Err(WireError::UnknownHint(other)),
        }
    }

    /// Encodes the event into its wire form.
    pub fn to_wire(&self) -> WireMessage {
        match self {
            Self::Join { name } => {
                WireMessage::new(hints::JOIN, Bytes::copy_from_slice(name.as_bytes()))
            }
            Self::Move { x } => {
                WireMessage::new(hints::MOVE, Bytes::copy_from_slice(&x.to_le_bytes()))
            }
            Self::Leave => WireMessage::new(hints::LEAVE, Bytes::new()),
        }
    }
}

/// An outbound notification, addressed per destination by the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainNotification {
    /// Join acknowledged; sent only to the joining client. Payload: empty.
    Authenticated,
    /// A peer entered the world. Payload: 16 identity bytes.
    Joined {
        /// Identity of the entering peer.
        id: Identity,
    },
    /// A peer changed position. Payload: 16 identity bytes + 8-byte `f64` LE.
    Moved {
        /// Identity of the moving peer.
        id: Identity,
        /// The peer's requested position.
        x: f64,
    },
    /// A peer departed the world. Payload: 16 identity bytes.
    Left {
        /// Identity of the departed peer.
        id: Identity,
    },
}

impl DomainNotification {
    /// Encodes the notification into its wire form.
    pub fn to_wire(&self) -> WireMessage {
        match self {
            Self::Authenticated => WireMessage::new(hints::AUTHENTICATED, Bytes::new()),
            Self::Joined { id } => WireMessage::new(hints::JOINED, id.to_frame()),
            Self::Moved { id, x } => {
                let mut payload = BytesMut::with_capacity(Identity::WIRE_LEN + F64_LEN);
                payload.put_slice(id.as_bytes());
                payload.put_slice(&x.to_le_bytes());
                WireMessage::new(hints::MOVED, payload.freeze())
            }
            Self::Left { id } => WireMessage::new(hints::LEFT, id.to_frame()),
        }
    }

    /// Decodes a notification from its wire form. Used by client handles;
    /// the server only encodes this direction.
    pub fn from_wire(message: &WireMessage) -> Result<Self, WireError> {
        match message.hint {
            hints::AUTHENTICATED => {
                expect_empty(message)?;
                Ok(Self::Authenticated)
            }
            hints::JOINED => {
                let payload = fixed_payload::<{ Identity::WIRE_LEN }>(message)?;
                Ok(Self::Joined {
                    id: Identity::from_wire(&payload)?,
                })
            }
            hints::MOVED => {
                let payload = fixed_payload::<{ Identity::WIRE_LEN + F64_LEN }>(message)?;
                let id = Identity::from_wire(&payload[..Identity::WIRE_LEN])?;
                let mut x_bytes = [0u8; F64_LEN];
                x_bytes.copy_from_slice(&payload[Identity::WIRE_LEN..]);
                Ok(Self::Moved {
                    id,
                    x: f64::from_le_bytes(x_bytes),
                })
            }
            hints::LEFT => {
                let payload = fixed_payload::<{ Identity::WIRE_LEN }>(message)?;
                Ok(Self::Left {
                    id: Identity::from_wire(&payload)?,
                })
            }
            other => Err(WireError::UnknownHint(other)),
        }
    }
}

fn fixed_payload<const N: usize>(message: &WireMessage) -> Result<[u8; N], WireError> {
    if message.payload.len() != N {
        return Err(WireError::PayloadLength {
            hint: message.hint,
            expected: N,
            got: message.payload.len(),
        });
    }
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&message.payload);
    Ok(bytes)
}

fn expect_empty(message: &WireMessage) -> Result<(), WireError> {
    if !message.payload.is_empty() {
        return Err(WireError::PayloadLength {
            hint: message.hint,
            expected: 0,
            got: message.payload.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_round_trips() {
        let events = [
            DomainEvent::Join {
                name: "ada".to_string(),
            },
            DomainEvent::Join {
                name: String::new(),
            },
            DomainEvent::Move { x: -12.5 },
            DomainEvent::Leave,
        ];
        for event in events {
            assert_eq!(DomainEvent::from_wire(&event.to_wire()).unwrap(), event);
        }
    }

    #[test]
    fn notification_round_trips() {
        let id = Identity::new();
        let notifications = [
            DomainNotification::Authenticated,
            DomainNotification::Joined { id },
            DomainNotification::Moved { id, x: 99.25 },
            DomainNotification::Left { id },
        ];
        for notification in notifications {
            assert_eq!(
                DomainNotification::from_wire(&notification.to_wire()).unwrap(),
                notification
            );
        }
    }

    #[test]
    fn unknown_hint_is_rejected() {
        let message = WireMessage::new(0x7f, Bytes::new());
        assert_eq!(
            DomainEvent::from_wire(&message),
            Err(WireError::UnknownHint(0x7f))
        );
        assert_eq!(
            DomainNotification::from_wire(&message),
            Err(WireError::UnknownHint(0x7f))
        );
    }

    #[test]
    fn move_payload_length_is_strict() {
        let message = WireMessage::new(hints::MOVE, Bytes::from_static(&[0u8; 4]));
        assert_eq!(
            DomainEvent::from_wire(&message),
            Err(WireError::PayloadLength {
                hint: hints::MOVE,
                expected: 8,
                got: 4,
            })
        );
    }

    #[test]
    fn leave_rejects_trailing_bytes() {
        let message = WireMessage::new(hints::LEAVE, Bytes::from_static(b"extra"));
        assert_eq!(
            DomainEvent::from_wire(&message),
            Err(WireError::PayloadLength {
                hint: hints::LEAVE,
                expected: 0,
                got: 5,
            })
        );
    }

    #[test]
    fn join_rejects_invalid_utf8() {
        let message = WireMessage::new(hints::JOIN, Bytes::from_static(&[0xff, 0xfe]));
        assert!(matches!(
            DomainEvent::from_wire(&message),
            Err(WireError::Name(_))
        ));
    }

    #[test]
    fn moved_layout_is_identity_then_position() {
        let id = Identity::new();
        let wire = DomainNotification::Moved { id, x: 2.0 }.to_wire();
        assert_eq!(wire.payload.len(), 24);
        assert_eq!(&wire.payload[..16], id.as_bytes());
        assert_eq!(&wire.payload[16..], &2.0f64.to_le_bytes());
    }
}
