//! World store boundary: the authoritative record of joined entities.
//!
//! The broker only touches the store through [`WorldStore`], injected into
//! every worker, so tests can substitute fakes and deployments can plug in a
//! real document store. The trait assumes per-id atomicity for each call; no
//! cross-entity transaction is coordinated above it.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryWorldStore;

/// One joined entity. `id` is the stringified connection identity; the rest
/// is domain state owned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity key - the hyphenated form of the connection identity.
    pub id: String,
    /// Nickname given at join.
    pub nickname: String,
    /// Current 1-D position.
    pub x: f64,
}

/// Failures of world-state operations. These are domain operation failures:
/// the worker does not catch them, its supervisor restarts it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The id has never joined, or already left.
    #[error("no entity with id {0}")]
    UnknownEntity(String),

    /// Snapshot file could not be read or written.
    #[error("snapshot i/o failed: {0}")]
    SnapshotIo(#[from] std::io::Error),

    /// Snapshot contents could not be encoded or decoded.
    #[error("snapshot encoding failed: {0}")]
    SnapshotEncoding(#[from] serde_json::Error),
}

/// Authoritative store of connected entities.
#[async_trait]
pub trait WorldStore: Send + Sync {
    /// Creates (or resets) the entity for `id` under `nickname`.
    async fn join(&self, nickname: &str, id: &str) -> Result<Entity, StoreError>;

    /// Applies a position change. Whether a move is acceptable is store
    /// policy; a rejected move is an `Ok` no-op, not an error.
    async fn try_move(&self, id: &str, x: f64) -> Result<(), StoreError>;

    /// Removes the entity for `id`.
    async fn leave(&self, id: &str) -> Result<(), StoreError>;

    /// Every entity other than `id`.
    async fn find_except(&self, id: &str) -> Result<Vec<Entity>, StoreError>;
}
