//! One cell of the region grid

use ahash::AHashMap;
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core::types::{ObjectId, RegionId};
use crate::entity::WorldObject;

/// Objects currently inside a region, with a running player count
#[derive(Default)]
pub struct MemberSet {
    objects: AHashMap<ObjectId, Arc<WorldObject>>,
    players: usize,
}

impl MemberSet {
    /// Returns false if the object was already a member
    pub fn insert(&mut self, object: &Arc<WorldObject>) -> bool {
        if self.objects.contains_key(&object.id()) {
            return false;
        }
        if object.kind().is_player() {
            self.players += 1;
        }
        self.objects.insert(object.id(), Arc::clone(object));
        true
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<Arc<WorldObject>> {
        let removed = self.objects.remove(&id)?;
        if removed.kind().is_player() {
            self.players -= 1;
        }
        Some(removed)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Arc<WorldObject>> {
        self.objects.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<WorldObject>> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn players(&self) -> usize {
        self.players
    }
}

pub struct Region {
    id: RegionId,
    column: i32,
    row: i32,
    neighbors: Vec<RegionId>,
    members: Mutex<MemberSet>,
    /// Mirror of the member set's player count, readable without the lock
    players: AtomicUsize,
    active: AtomicBool,
}

impl Region {
    pub(crate) fn new(id: RegionId, column: i32, row: i32, neighbors: Vec<RegionId>) -> Self {
        Self {
            id,
            column,
            row,
            neighbors,
            members: Mutex::new(MemberSet::default()),
            players: AtomicUsize::new(0),
            active: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> RegionId {
        self.id
    }

    /// (column, row) of this cell
    pub fn cell(&self) -> (i32, i32) {
        (self.column, self.row)
    }

    /// Self plus every surrounding cell, ascending by id
    pub fn neighbors(&self) -> &[RegionId] {
        &self.neighbors
    }

    /// Lock the member set. Callers taking several regions must lock them
    /// in ascending id order and call [`Region::sync_players`] before release.
    pub(crate) fn lock(&self) -> MutexGuard<'_, MemberSet> {
        self.members.lock()
    }

    pub(crate) fn sync_players(&self, members: &MemberSet) {
        self.players.store(members.players(), Ordering::Release);
    }

    /// Returns false if the object was already a member
    pub fn add_member(&self, object: &Arc<WorldObject>) -> bool {
        let mut members = self.lock();
        let added = members.insert(object);
        self.sync_players(&members);
        added
    }

    /// Absent members are ignored
    pub fn remove_member(&self, id: ObjectId) -> bool {
        let mut members = self.lock();
        let removed = members.remove(id).is_some();
        self.sync_players(&members);
        removed
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn player_count(&self) -> usize {
        self.players.load(Ordering::Acquire)
    }

    /// Copy of the current members
    pub fn snapshot(&self) -> Vec<Arc<WorldObject>> {
        self.lock().iter().cloned().collect()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Returns the previous value
    pub(crate) fn set_active(&self, active: bool) -> bool {
        self.active.swap(active, Ordering::AcqRel)
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("id", &self.id)
            .field("cell", &self.cell())
            .field("players", &self.player_count())
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}
