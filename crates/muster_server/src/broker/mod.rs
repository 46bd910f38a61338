//! The three-tier broker: front router, relay, worker pool.
//!
//! Units flow `client → front → relay → worker → world store` and replies
//! flow back `worker → relay → front → client(s)`. Each tier is an
//! independent task over bounded queues; nothing blocks on a downstream
//! reply, and malformed units are dropped with a log at the first tier that
//! sees them. Only the worker understands the codec and the domain.

pub mod dispatch;
pub mod front;
pub mod relay;
pub mod worker;

pub use front::FrontRouter;
pub use relay::Relay;
pub use worker::spawn_supervised_worker;
