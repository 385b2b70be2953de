//! Global id → object index

use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::core::error::{Result, WorldError};
use crate::core::types::ObjectId;
use crate::entity::WorldObject;

/// Every spawned object by id
#[derive(Default)]
pub struct WorldIndex {
    objects: RwLock<AHashMap<ObjectId, Arc<WorldObject>>>,
}

impl WorldIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, object: &Arc<WorldObject>) -> Result<()> {
        let mut objects = self.objects.write();
        if objects.contains_key(&object.id()) {
            return Err(WorldError::AlreadySpawned(object.id()));
        }
        objects.insert(object.id(), Arc::clone(object));
        Ok(())
    }

    /// Absent ids are ignored
    pub fn unregister(&self, id: ObjectId) -> Option<Arc<WorldObject>> {
        self.objects.write().remove(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<Arc<WorldObject>> {
        self.objects.read().get(&id).cloned()
    }

    pub fn try_get(&self, id: ObjectId) -> Result<Arc<WorldObject>> {
        self.get(id).ok_or(WorldError::ObjectNotFound(id))
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.read().contains_key(&id)
    }

    pub fn snapshot(&self) -> Vec<Arc<WorldObject>> {
        self.objects.read().values().cloned().collect()
    }

    pub fn player_count(&self) -> usize {
        self.objects
            .read()
            .values()
            .filter(|o| o.kind().is_player())
            .count()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}
