//! Reference in-memory world store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{Entity, StoreError, WorldStore};

/// 1-D world boundary policy. Moves outside the range are silently refused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    /// Smallest acceptable position.
    pub min_x: f64,
    /// Largest acceptable position.
    pub max_x: f64,
}

impl WorldBounds {
    /// Whether a position is inside the world.
    pub fn contains(&self, x: f64) -> bool {
        x >= self.min_x && x <= self.max_x
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min_x: -1000.0,
            max_x: 1000.0,
        }
    }
}

/// Thread-safe in-memory [`WorldStore`] with optional JSON snapshots.
///
/// Every operation takes the lock once, which gives the per-id atomicity the
/// broker assumes; `find_except` reads a consistent snapshot of the map at
/// one instant.
pub struct MemoryWorldStore {
    entities: RwLock<HashMap<String, Entity>>,
    bounds: WorldBounds,
}

impl MemoryWorldStore {
    /// Empty store with the given bounds policy.
    pub fn new(bounds: WorldBounds) -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            bounds,
        }
    }

    /// Store primed from a JSON snapshot file. A missing file is an empty
    /// world, not an error.
    pub async fn with_snapshot(bounds: WorldBounds, path: &Path) -> Result<Self, StoreError> {
        let entities = if path.exists() {
            let raw = tokio::fs::read(path).await?;
            let loaded: HashMap<String, Entity> = serde_json::from_slice(&raw)?;
            info!("loaded {} entities from {}", loaded.len(), path.display());
            loaded
        } else {
            HashMap::new()
        };
        Ok(Self {
            entities: RwLock::new(entities),
            bounds,
        })
    }

    /// Writes the current world to a JSON snapshot file.
    pub async fn save_snapshot(&self, path: &Path) -> Result<(), StoreError> {
        let entities = self.entities.read().await;
        let raw = serde_json::to_vec_pretty(&*entities)?;
        tokio::fs::write(path, raw).await?;
        info!("saved {} entities to {}", entities.len(), path.display());
        Ok(())
    }

    /// Number of joined entities.
    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }

    /// Whether the world is empty.
    pub async fn is_empty(&self) -> bool {
        self.entities.read().await.is_empty()
    }
}

#[async_trait]
impl WorldStore for MemoryWorldStore {
    async fn join(&self, nickname: &str, id: &str) -> Result<Entity, StoreError> {
        let entity = Entity {
            id: id.to_string(),
            nickname: nickname.to_string(),
            x: 0.0,
        };
        self.entities
            .write()
            .await
            .insert(id.to_string(), entity.clone());
        debug!(id, nickname, "entity joined");
        Ok(entity)
    }

    async fn try_move(&self, id: &str, x: f64) -> Result<(), StoreError> {
        let mut entities = self.entities.write().await;
        let entity = entities
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownEntity(id.to_string()))?;
        if !self.bounds.contains(x) {
            debug!(id, x, "move out of bounds, ignored");
            return Ok(());
        }
        entity.x = x;
        Ok(())
    }

    async fn leave(&self, id: &str) -> Result<(), StoreError> {
        self.entities
            .write()
            .await
            .remove(id)
            .ok_or_else(|| StoreError::UnknownEntity(id.to_string()))?;
        debug!(id, "entity left");
        Ok(())
    }

    async fn find_except(&self, id: &str) -> Result<Vec<Entity>, StoreError> {
        let entities = self.entities.read().await;
        Ok(entities
            .values()
            .filter(|entity| entity.id != id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryWorldStore {
        MemoryWorldStore::new(WorldBounds {
            min_x: -100.0,
            max_x: 100.0,
        })
    }

    #[tokio::test]
    async fn join_creates_at_origin_and_rejoin_resets() {
        let store = store();
        let entity = store.join("ada", "a").await.unwrap();
        assert_eq!(entity.x, 0.0);

        store.try_move("a", 5.0).await.unwrap();
        let entity = store.join("ada", "a").await.unwrap();
        assert_eq!(entity.x, 0.0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn move_within_bounds_applies() {
        let store = store();
        store.join("ada", "a").await.unwrap();
        store.try_move("a", 42.0).await.unwrap();
        let others = store.find_except("b").await.unwrap();
        assert_eq!(others[0].x, 42.0);
    }

    #[tokio::test]
    async fn move_out_of_bounds_is_an_ok_noop() {
        let store = store();
        store.join("ada", "a").await.unwrap();
        store.try_move("a", 9000.0).await.unwrap();
        let others = store.find_except("b").await.unwrap();
        assert_eq!(others[0].x, 0.0);
    }

    #[tokio::test]
    async fn unknown_id_is_a_domain_failure() {
        let store = store();
        assert!(matches!(
            store.try_move("ghost", 1.0).await,
            Err(StoreError::UnknownEntity(_))
        ));
        assert!(matches!(
            store.leave("ghost").await,
            Err(StoreError::UnknownEntity(_))
        ));
    }

    #[tokio::test]
    async fn find_except_excludes_only_the_given_id() {
        let store = store();
        store.join("ada", "a").await.unwrap();
        store.join("bob", "b").await.unwrap();
        store.join("cyd", "c").await.unwrap();

        let mut ids: Vec<String> = store
            .find_except("b")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.json");

        let store = store();
        store.join("ada", "a").await.unwrap();
        store.try_move("a", 7.0).await.unwrap();
        store.save_snapshot(&path).await.unwrap();

        let restored = MemoryWorldStore::with_snapshot(WorldBounds::default(), &path)
            .await
            .unwrap();
        let entities = restored.find_except("nobody").await.unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id, "a");
        assert_eq!(entities[0].x, 7.0);
    }

    #[tokio::test]
    async fn missing_snapshot_is_an_empty_world() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            MemoryWorldStore::with_snapshot(WorldBounds::default(), &dir.path().join("none.json"))
                .await
                .unwrap();
        assert!(store.is_empty().await);
    }
}
