//! Game entity system with typed integer IDs
//!
//! Every entity (player, card, modifier) draws its ID from one shared
//! counter on the game state, so a raw ID names exactly one entity in the
//! snapshot dictionary. The phantom parameter keeps card, player and
//! modifier IDs apart at compile time while the wire representation stays
//! a plain u32.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::EngineError;
use crate::Result;

/// Typed integer ID for game entities
///
/// IDs are stable throughout a game - entities don't get deallocated, they
/// move between zones or get flagged as removed from play.
pub struct EntityId<T> {
    raw: u32,
    _kind: PhantomData<fn() -> T>,
}

impl<T> EntityId<T> {
    pub fn new(raw: u32) -> Self {
        EntityId {
            raw,
            _kind: PhantomData,
        }
    }

    pub fn as_u32(&self) -> u32 {
        self.raw
    }
}

// Manual impls: derives would put bounds on T, which is only a marker.
impl<T> Clone for EntityId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityId<T> {}

impl<T> PartialEq for EntityId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for EntityId<T> {}

impl<T> PartialOrd for EntityId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for EntityId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Hash for EntityId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.raw)
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl<T> Serialize for EntityId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.raw)
    }
}

impl<'de, T> Deserialize<'de> for EntityId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        u32::deserialize(deserializer).map(EntityId::new)
    }
}

/// Base trait for all game entities
pub trait GameEntity: Sized {
    fn id(&self) -> EntityId<Self>;
    fn name(&self) -> &str;
}

/// Allocates entity IDs from a single shared counter
///
/// Shared across all entity kinds so the snapshot dictionary can key every
/// entity by its raw ID without collisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdGenerator {
    next_raw: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        IdGenerator { next_raw: 0 }
    }

    pub fn next<T>(&mut self) -> EntityId<T> {
        let id = EntityId::new(self.next_raw);
        self.next_raw += 1;
        id
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Central storage for one kind of game entity
///
/// Provides fast lookup by EntityId. Uses FxHashMap for fast hashing of
/// integer keys; anything order-sensitive goes through `ids_sorted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStore<T> {
    entities: FxHashMap<EntityId<T>, T>,
}

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        EntityStore {
            entities: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, id: EntityId<T>, entity: T) {
        self.entities.insert(id, entity);
    }

    /// Get an entity by ID
    pub fn get(&self, id: EntityId<T>) -> Result<&T> {
        self.entities
            .get(&id)
            .ok_or(EngineError::EntityNotFound(id.as_u32()))
    }

    /// Get a mutable reference to an entity
    pub fn get_mut(&mut self, id: EntityId<T>) -> Result<&mut T> {
        self.entities
            .get_mut(&id)
            .ok_or(EngineError::EntityNotFound(id.as_u32()))
    }

    pub fn contains(&self, id: EntityId<T>) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn remove(&mut self, id: EntityId<T>) -> Option<T> {
        self.entities.remove(&id)
    }

    /// Iterate over all entities (hash order, not stable across runs)
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId<T>, &T)> {
        self.entities.iter()
    }

    /// All IDs in ascending order, for deterministic iteration
    pub fn ids_sorted(&self) -> Vec<EntityId<T>> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestEntity {
        id: EntityId<TestEntity>,
        name: String,
    }

    impl GameEntity for TestEntity {
        fn id(&self) -> EntityId<TestEntity> {
            self.id
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn test_id_generator_shared_space() {
        let mut ids = IdGenerator::new();
        let a: EntityId<TestEntity> = ids.next();
        let b: EntityId<u8> = ids.next();
        assert_eq!(a.as_u32(), 0);
        assert_eq!(b.as_u32(), 1);
    }

    #[test]
    fn test_entity_store() {
        let mut ids = IdGenerator::new();
        let mut store = EntityStore::new();
        let id1 = ids.next();
        let id2 = ids.next();

        store.insert(
            id1,
            TestEntity {
                id: id1,
                name: "Test1".to_string(),
            },
        );
        store.insert(
            id2,
            TestEntity {
                id: id2,
                name: "Test2".to_string(),
            },
        );

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(id1).unwrap().name, "Test1");
        assert_eq!(store.get(id2).unwrap().name, "Test2");
        assert!(store.get(EntityId::new(999)).is_err());
    }

    #[test]
    fn test_ids_sorted_is_ascending() {
        let mut store = EntityStore::new();
        for raw in [5u32, 1, 9, 3] {
            let id = EntityId::new(raw);
            store.insert(
                id,
                TestEntity {
                    id,
                    name: format!("e{raw}"),
                },
            );
        }
        let sorted: Vec<u32> = store.ids_sorted().iter().map(|id| id.as_u32()).collect();
        assert_eq!(sorted, vec![1, 3, 5, 9]);
    }

    #[test]
    fn test_entity_id_serializes_as_plain_u32() {
        let id: EntityId<TestEntity> = EntityId::new(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        let back: EntityId<TestEntity> = serde_json::from_str("7").unwrap();
        assert_eq!(back, id);
    }
}
