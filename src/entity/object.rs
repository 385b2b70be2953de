//! World objects: everything that has a position and can be known by others
//!
//! Each object keeps its mutable data in separate locks so that relocation,
//! zone classification and regeneration never contend on one another:
//!
//! - `state`: position, vitals and the region back-reference
//! - `known`: the known-objects set (leaf lock, never held with another)
//! - `zones`: the zone classification state machine
//! - `timers`: regeneration task handles
//!
//! `relocation` serializes region changes of this object.

use parking_lot::{Mutex, MutexGuard};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use super::behavior::ObjectBehavior;
use super::vitals::Vitals;
use crate::core::types::{ClanId, ObjectId, ObjectKind, Position, RegionId, ZoneId};
use crate::simulation::regeneration::RegenTimers;
use crate::transport::OutboundMessage;
use crate::zone::{Classification, ZoneState};

/// Mutable per-object data guarded by the state lock
#[derive(Debug, Clone)]
pub struct ObjectState {
    pub position: Position,
    pub heading: i32,
    pub destination: Option<Position>,
    pub dead: bool,
    pub region: Option<RegionId>,
    pub vitals: Vitals,
    pub clan: Option<ClanId>,
}

/// Known objects, ordered by id. Holds membership only.
pub type KnownObjects = BTreeMap<ObjectId, Weak<WorldObject>>;

pub struct WorldObject {
    id: ObjectId,
    kind: ObjectKind,
    behavior: Box<dyn ObjectBehavior>,
    visible: AtomicBool,
    spawned: AtomicBool,
    state: Mutex<ObjectState>,
    known: Mutex<KnownObjects>,
    zones: Mutex<ZoneState>,
    timers: Mutex<RegenTimers>,
    relocation: Mutex<()>,
}

impl WorldObject {
    pub fn new(id: ObjectId, kind: ObjectKind, position: Position, behavior: impl ObjectBehavior + 'static) -> Self {
        Self {
            id,
            kind,
            behavior: Box::new(behavior),
            visible: AtomicBool::new(true),
            spawned: AtomicBool::new(false),
            state: Mutex::new(ObjectState {
                position,
                heading: 0,
                destination: None,
                dead: false,
                region: None,
                vitals: Vitals::default(),
                clan: None,
            }),
            known: Mutex::new(BTreeMap::new()),
            zones: Mutex::new(ZoneState::new()),
            timers: Mutex::new(RegenTimers::default()),
            relocation: Mutex::new(()),
        }
    }

    pub fn with_vitals(self, vitals: Vitals) -> Self {
        self.state.lock().vitals = vitals;
        self
    }

    pub fn with_clan(self, clan: ClanId) -> Self {
        self.state.lock().clan = Some(clan);
        self
    }

    pub fn with_visibility(self, visible: bool) -> Self {
        self.visible.store(visible, Ordering::Release);
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn behavior(&self) -> &dyn ObjectBehavior {
        self.behavior.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    /// Returns the previous value
    pub(crate) fn store_visible(&self, visible: bool) -> bool {
        self.visible.swap(visible, Ordering::AcqRel)
    }

    pub fn is_spawned(&self) -> bool {
        self.spawned.load(Ordering::Acquire)
    }

    /// Returns the previous value
    pub(crate) fn store_spawned(&self, spawned: bool) -> bool {
        self.spawned.swap(spawned, Ordering::AcqRel)
    }

    // === STATE ===

    /// Run `f` under the state lock
    pub fn with_state<R>(&self, f: impl FnOnce(&mut ObjectState) -> R) -> R {
        f(&mut self.state.lock())
    }

    pub fn state(&self) -> ObjectState {
        self.state.lock().clone()
    }

    pub fn position(&self) -> Position {
        self.state.lock().position
    }

    pub fn heading(&self) -> i32 {
        self.state.lock().heading
    }

    pub fn set_heading(&self, heading: i32) {
        self.state.lock().heading = heading;
    }

    pub fn destination(&self) -> Option<Position> {
        self.state.lock().destination
    }

    pub fn set_destination(&self, destination: Option<Position>) {
        self.state.lock().destination = destination;
    }

    pub fn region(&self) -> Option<RegionId> {
        self.state.lock().region
    }

    pub fn is_dead(&self) -> bool {
        self.state.lock().dead
    }

    pub fn set_dead(&self, dead: bool) {
        self.state.lock().dead = dead;
    }

    pub fn vitals(&self) -> Vitals {
        self.state.lock().vitals.clone()
    }

    pub fn clan(&self) -> Option<ClanId> {
        self.state.lock().clan
    }

    pub fn is_inside_radius(&self, other: &WorldObject, radius: i32, check_z: bool, strict: bool) -> bool {
        self.position()
            .is_inside_radius(other.position(), radius, check_z, strict)
    }

    /// "Added" notification describing this object to a viewer
    pub fn info_message(&self) -> OutboundMessage {
        let state = self.state.lock();
        OutboundMessage::ObjectInfo {
            object: self.id,
            kind: self.kind,
            position: state.position,
            heading: state.heading,
        }
    }

    pub(crate) fn relocation_guard(&self) -> MutexGuard<'_, ()> {
        self.relocation.lock()
    }

    // === KNOWLEDGE ===

    pub fn knows(&self, id: ObjectId) -> bool {
        self.known.lock().contains_key(&id)
    }

    pub fn known_ids(&self) -> Vec<ObjectId> {
        self.known.lock().keys().copied().collect()
    }

    pub fn known_count(&self) -> usize {
        self.known.lock().len()
    }

    /// Snapshot of the known set; entries already dropped are skipped
    pub fn known_objects(&self) -> Vec<Arc<WorldObject>> {
        self.known
            .lock()
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }

    pub fn known_players(&self) -> Vec<Arc<WorldObject>> {
        self.known_objects()
            .into_iter()
            .filter(|o| o.kind().is_player())
            .collect()
    }

    /// Returns false when `other` was already known
    pub(crate) fn insert_known(&self, other: &Arc<WorldObject>) -> bool {
        let mut known = self.known.lock();
        if known.contains_key(&other.id) {
            return false;
        }
        known.insert(other.id, Arc::downgrade(other));
        true
    }

    /// Absent ids are ignored
    pub(crate) fn remove_known(&self, id: ObjectId) -> bool {
        self.known.lock().remove(&id).is_some()
    }

    /// Empty the known set, returning what was in it
    pub(crate) fn take_known(&self) -> Vec<Arc<WorldObject>> {
        std::mem::take(&mut *self.known.lock())
            .into_values()
            .filter_map(|weak| weak.upgrade())
            .collect()
    }

    // === ZONES ===

    pub(crate) fn zones(&self) -> MutexGuard<'_, ZoneState> {
        self.zones.lock()
    }

    pub fn classification(&self) -> Classification {
        self.zones.lock().classification()
    }

    pub fn is_in_battle(&self) -> bool {
        self.zones.lock().is_in_battle()
    }

    pub fn is_in_peace(&self) -> bool {
        self.zones.lock().is_in_peace()
    }

    pub fn is_in_water(&self) -> bool {
        self.zones.lock().is_in_water()
    }

    pub fn is_in_siege(&self) -> bool {
        self.zones.lock().is_in_siege()
    }

    pub fn forced_pvp(&self) -> bool {
        self.zones.lock().forced_pvp()
    }

    pub fn is_in_zone(&self, zone: ZoneId) -> bool {
        self.zones.lock().is_active(zone)
    }

    pub fn active_zone_ids(&self) -> Vec<ZoneId> {
        self.zones.lock().active_zone_ids()
    }

    // === TIMERS ===

    pub(crate) fn timers(&self) -> MutexGuard<'_, RegenTimers> {
        self.timers.lock()
    }

    pub fn is_regenerating(&self) -> bool {
        self.timers.lock().regen_running()
    }

    pub fn is_pushing_status(&self) -> bool {
        self.timers.lock().status_running()
    }
}

impl fmt::Debug for WorldObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldObject")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("visible", &self.is_visible())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for WorldObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.behavior.describe(self))
    }
}
