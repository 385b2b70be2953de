//! The world: grid, zones, index and scheduler behind one value
//!
//! Built once by [`World::load`] and passed by reference. Every mutation of
//! object placement, zone membership or visibility goes through here.

use std::sync::Arc;

use tokio::runtime::Handle;

use super::index::WorldIndex;
use super::knowledge::{KnowledgeTracker, Outbox};
use super::loader::WorldData;
use crate::core::config::WorldConfig;
use crate::core::error::{Result, WorldError};
use crate::core::types::{ObjectId, Position, RegionId, ZoneId};
use crate::entity::WorldObject;
use crate::simulation::RegenerationScheduler;
use crate::spatial::RegionGrid;
use crate::transport::{OutboundMessage, Transport};
use crate::zone::{Zone, ZoneRegistry};

pub struct World {
    config: WorldConfig,
    grid: RegionGrid,
    zones: ZoneRegistry,
    index: WorldIndex,
    transport: Arc<dyn Transport>,
    scheduler: RegenerationScheduler,
}

impl World {
    /// Build the grid and take ownership of the zones
    ///
    /// `runtime` hosts the regeneration tickers.
    pub fn load(
        config: WorldConfig,
        zones: ZoneRegistry,
        transport: Arc<dyn Transport>,
        runtime: Handle,
    ) -> Result<Self> {
        config.validate()?;
        let grid = RegionGrid::new(&config.grid)?;
        let scheduler = RegenerationScheduler::new(runtime, Arc::clone(&transport), &config.regeneration);

        tracing::info!(
            regions = grid.len(),
            columns = grid.columns(),
            rows = grid.rows(),
            zones = zones.len(),
            "world loaded"
        );

        Ok(Self {
            config,
            grid,
            zones,
            index: WorldIndex::new(),
            transport,
            scheduler,
        })
    }

    pub fn from_data(data: &WorldData, transport: Arc<dyn Transport>, runtime: Handle) -> Result<Self> {
        Self::load(data.config(), data.zone_registry()?, transport, runtime)
    }

    /// Decay every object still in the world
    pub fn shutdown(&self) {
        let objects = self.index.snapshot();
        let count = objects.len();
        for object in objects {
            if let Err(error) = self.decay(object.id()) {
                tracing::warn!(object = %object.id(), %error, "decay during shutdown failed");
            }
        }
        tracing::info!(objects = count, "world shut down");
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn grid(&self) -> &RegionGrid {
        &self.grid
    }

    pub fn zones(&self) -> &ZoneRegistry {
        &self.zones
    }

    pub fn index(&self) -> &WorldIndex {
        &self.index
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn scheduler(&self) -> &RegenerationScheduler {
        &self.scheduler
    }

    pub fn knowledge(&self) -> KnowledgeTracker<'_> {
        KnowledgeTracker::new(&self.grid, self.transport.as_ref())
    }

    pub fn resolve_region(&self, position: Position) -> RegionId {
        self.grid.lookup(position).id()
    }

    pub fn get(&self, id: ObjectId) -> Option<Arc<WorldObject>> {
        self.index.get(id)
    }

    fn zone(&self, id: ZoneId) -> Result<&Arc<Zone>> {
        self.zones.get(id).ok_or(WorldError::UnknownZone(id))
    }

    // === LIFECYCLE ===

    /// Register `object`, place it in its region and fire its spawn hook
    pub fn spawn(&self, object: WorldObject) -> Result<Arc<WorldObject>> {
        let object = Arc::new(object);
        self.index.register(&object)?;
        object.store_spawned(true);

        let region = self.resolve_region(object.position());
        if let Err(error) = self.knowledge().set_region(&object, Some(region)) {
            object.store_spawned(false);
            self.index.unregister(object.id());
            return Err(error);
        }

        let z = object.position().z;
        object.zones().revalidate_water(z);
        object.behavior().on_spawn(&object, self.transport());

        tracing::info!(object = %object.id(), kind = ?object.kind(), region = ?region, "spawned");
        Ok(object)
    }

    /// Remove an object from the world
    ///
    /// Timers stop, every active zone is exited with `destroying`, and both
    /// sides of every known pair forget each other. Unknown ids are errors.
    pub fn decay(&self, id: ObjectId) -> Result<()> {
        let object = self.index.try_get(id)?;
        if !object.store_spawned(false) {
            return Ok(());
        }

        self.scheduler.stop(&object);

        for zone in object.active_zone_ids() {
            if let Some(zone) = self.zones.get(zone) {
                self.on_exit_zone(&object, zone, true);
            }
        }

        let tracker = self.knowledge();
        tracker.set_region(&object, None)?;
        tracker.clear_knowns(&object, true);
        self.index.unregister(id);

        tracing::info!(object = %id, "decayed");
        Ok(())
    }

    /// Update position and follow it into a new region if needed
    pub fn move_to(&self, object: &Arc<WorldObject>, position: Position) -> Result<()> {
        object.with_state(|state| state.position = position);
        self.knowledge().set_region(object, Some(self.resolve_region(position)))?;
        object.zones().revalidate_water(position.z);
        Ok(())
    }

    pub fn move_by_id(&self, id: ObjectId, position: Position) -> Result<()> {
        let object = self.index.try_get(id)?;
        self.move_to(&object, position)
    }

    pub fn set_visible(&self, object: &Arc<WorldObject>, visible: bool) {
        self.knowledge().set_visible(object, visible);
    }

    // === ZONES ===

    /// Broad-phase says `object` is now inside `zone`
    ///
    /// A no-op once the object has decayed.
    pub fn on_enter_zone(&self, object: &Arc<WorldObject>, zone: &Arc<Zone>) {
        let z = object.position().z;
        let messages = {
            let mut zones = object.zones();
            if !object.is_spawned() {
                return;
            }
            let Some(messages) = zones.enter(zone, z) else {
                return;
            };
            zone.add_member(object.id());
            messages
        };

        object.behavior().on_enter_zone(object, zone, self.transport());

        let mut outbox = Outbox::default();
        outbox.push(object, OutboundMessage::Text(format!("entered zone {}", zone.name())));
        for message in messages {
            outbox.push(object, message);
        }
        outbox.deliver(self.transport());

        tracing::debug!(
            object = %object.id(),
            zone = zone.name(),
            classification = ?object.classification(),
            "entered zone"
        );
    }

    /// Broad-phase says `object` left `zone`, or the object is decaying
    ///
    /// Only the destroying exits issued by `decay` apply to a decayed object.
    pub fn on_exit_zone(&self, object: &Arc<WorldObject>, zone: &Arc<Zone>, destroying: bool) {
        let z = object.position().z;
        let (zone, messages) = {
            let mut zones = object.zones();
            if !destroying && !object.is_spawned() {
                return;
            }
            let Some((zone, messages)) = zones.exit(zone.id(), z) else {
                return;
            };
            zone.remove_member(object.id());
            (zone, messages)
        };

        object.behavior().on_exit_zone(object, &zone, destroying, self.transport());

        if !destroying {
            let mut outbox = Outbox::default();
            for message in messages {
                outbox.push(object, message);
            }
            outbox.deliver(self.transport());
        }

        tracing::debug!(
            object = %object.id(),
            zone = zone.name(),
            destroying,
            classification = ?object.classification(),
            "left zone"
        );
    }

    pub fn enter_zone(&self, object: ObjectId, zone: ZoneId) -> Result<()> {
        let zone = self.zone(zone)?;
        let object = self.index.try_get(object)?;
        self.on_enter_zone(&object, zone);
        Ok(())
    }

    pub fn exit_zone(&self, object: ObjectId, zone: ZoneId) -> Result<()> {
        let zone = self.zone(zone)?;
        let object = self.index.try_get(object)?;
        self.on_exit_zone(&object, zone, false);
        Ok(())
    }

    /// Enter and exit zones so that `object`'s active set matches its
    /// position, using the boxes shipped with static data
    pub fn revalidate_zones(&self, object: &Arc<WorldObject>) {
        if !object.is_spawned() {
            return;
        }
        let position = object.position();
        for zone in self.zones.iter() {
            if zone.contains(position) {
                self.on_enter_zone(object, zone);
            } else {
                self.on_exit_zone(object, zone, false);
            }
        }
    }

    pub fn set_forced_pvp(&self, object: &Arc<WorldObject>, forced: bool) {
        let z = object.position().z;
        let messages = object.zones().set_forced_pvp(forced, z);

        let mut outbox = Outbox::default();
        for message in messages {
            outbox.push(object, message);
        }
        outbox.deliver(self.transport());
    }

    // === OUTBOUND ===

    pub fn broadcast(&self, sender: &WorldObject, message: OutboundMessage, exclude_self: bool) {
        self.transport.broadcast(sender, message, exclude_self);
    }

    /// `actor` interacts with `target`
    pub fn on_action(&self, target: ObjectId, actor: ObjectId) -> Result<()> {
        let target = self.index.try_get(target)?;
        let actor = self.index.try_get(actor)?;
        target.behavior().on_action(&target, &actor, self.transport());
        Ok(())
    }
}
