//! # Muster Protocol
//!
//! The wire protocol shared by the Muster coordination server and its
//! clients. This crate is pure data transformation - no sockets, no tasks,
//! no world state - so every tier of the broker and every test client can
//! depend on it without dragging in the runtime.
//!
//! ## Layers
//!
//! The protocol has three layers, outermost first:
//!
//! - **Envelope** - the routed unit: `[identity, delimiter, body...]` frame
//!   sequence. The leading frame addresses a client session; intermediate
//!   tiers forward it byte-for-byte and never rewrite or reorder frames.
//! - **Wire message** - the body of an envelope: a single-byte hint frame
//!   followed by the payload bytes. [`codec`] converts between the two
//!   representations.
//! - **Domain messages** - [`DomainEvent`] (client → server) and
//!   [`DomainNotification`] (server → client), each mapped to exactly one
//!   reserved hint in [`events::hints`]. Unknown hints are a decode error,
//!   never silently ignored.
//!
//! ## Malformed input
//!
//! Every decoding function returns an explicit `Result`; nothing in this
//! crate panics on wire input. Callers at process boundaries are expected to
//! log and drop on error rather than propagate malformed traffic downstream.

pub mod codec;
pub mod envelope;
pub mod error;
pub mod events;
pub mod types;

pub use codec::WireMessage;
pub use envelope::{Envelope, Frames};
pub use error::{EnvelopeError, IdentityError, WireError};
pub use events::{hints, DomainEvent, DomainNotification};
pub use types::Identity;
