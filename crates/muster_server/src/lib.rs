//! # Muster Server
//!
//! A small real-time multiplayer coordination server. Clients connect over
//! an identity-addressed transport, send binary domain events (join, move,
//! leave), and the server mutates an authoritative world store and fans
//! change notifications out to every other connected client.
//!
//! ## Architecture
//!
//! The core is a three-tier broker over bounded queues:
//!
//! * **Front router** ([`broker::front`]) - owns the externally bound
//!   transport; shape-checks inbound envelopes and forwards them verbatim.
//! * **Relay** ([`broker::relay`]) - pass-through bridge that deals client
//!   units round-robin across the worker pool and funnels replies back.
//! * **Workers** ([`broker::worker`]) - decode payloads, dispatch on the
//!   hint table, call the [`world::WorldStore`], and emit one addressed
//!   envelope per notification. Each instance runs under a respawn
//!   supervisor: domain failures restart that worker fresh, nothing else.
//!
//! The wire contract (identities, envelope framing, hint table, payload
//! layouts) lives in the `muster_protocol` crate.
//!
//! ## Guarantees and gaps
//!
//! Delivery is at-most-once: units addressed to a disconnected identity are
//! silently dropped. Per-client event ordering holds within one worker's
//! queue only - with a pool larger than one, the hub's round-robin can
//! interleave a client's events across instances. A transport disconnect is
//! not a leave: the entity stays in the store until an explicit leave event.

pub use config::Config;
pub use error::ServerError;
pub use server::MusterServer;
pub use utils::{create_server, create_server_with_config};

pub mod broker;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;
pub mod shutdown;
pub mod transport;
pub mod utils;
pub mod world;
