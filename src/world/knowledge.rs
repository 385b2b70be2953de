//! Known-object tracking driven by region changes
//!
//! Every object knows exactly the other objects in its neighborhood. A
//! relocation diffs the old and new neighborhoods and updates both sides of
//! each affected pair while holding the member locks of every touched
//! region, acquired in ascending id order. Notifications are queued and only
//! handed to the transport once all locks are released.

use parking_lot::MutexGuard;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::core::error::Result;
use crate::core::types::{ObjectId, RegionId};
use crate::entity::WorldObject;
use crate::spatial::{MemberSet, RegionGrid};
use crate::transport::{OutboundMessage, Transport};

/// Messages held back until every lock is released
#[derive(Default)]
pub(crate) struct Outbox {
    queued: Vec<(ObjectId, OutboundMessage)>,
}

impl Outbox {
    /// Only player-controlled objects have a client to talk to
    pub(crate) fn push(&mut self, recipient: &WorldObject, message: OutboundMessage) {
        if recipient.kind().is_player() {
            self.queued.push((recipient.id(), message));
        }
    }

    /// Drop everything queued for `recipient`
    pub(crate) fn discard(&mut self, recipient: ObjectId) {
        self.queued.retain(|(id, _)| *id != recipient);
    }

    pub(crate) fn deliver(self, transport: &dyn Transport) {
        for (recipient, message) in self.queued {
            transport.send(recipient, message);
        }
    }
}

pub struct KnowledgeTracker<'a> {
    grid: &'a RegionGrid,
    transport: &'a dyn Transport,
}

impl<'a> KnowledgeTracker<'a> {
    pub fn new(grid: &'a RegionGrid, transport: &'a dyn Transport) -> Self {
        Self { grid, transport }
    }

    /// Move `object` into `new_region` (or out of the grid with `None`)
    ///
    /// Pairs leaving the neighborhood forget each other before pairs entering
    /// it learn about each other. Unspawned objects are never placed, and get
    /// no notifications when removed.
    pub fn set_region(&self, object: &Arc<WorldObject>, new_region: Option<RegionId>) -> Result<()> {
        let new_neighbors = match new_region {
            Some(id) => self.grid.neighbors(id)?,
            None => &[],
        };

        let _relocating = object.relocation_guard();
        let old_region = object.region();
        if old_region == new_region || (new_region.is_some() && !object.is_spawned()) {
            return Ok(());
        }
        let old_neighbors = match old_region {
            Some(id) => self.grid.neighbors(id)?,
            None => &[],
        };

        let touched: BTreeSet<RegionId> = old_neighbors.iter().chain(new_neighbors).copied().collect();
        let mut guards: BTreeMap<RegionId, MutexGuard<'_, MemberSet>> = BTreeMap::new();
        for id in &touched {
            guards.insert(*id, self.grid.try_region(*id)?.lock());
        }

        let mut outbox = Outbox::default();

        for id in old_neighbors.iter().filter(|id| !new_neighbors.contains(id)) {
            for other in guards[id].iter() {
                if other.id() != object.id() {
                    forget_pair(object, other, &mut outbox);
                }
            }
        }

        for id in new_neighbors.iter().filter(|id| !old_neighbors.contains(id)) {
            for other in guards[id].iter() {
                if other.id() != object.id() {
                    learn_pair(object, other, &mut outbox);
                }
            }
        }

        if let Some(id) = old_region {
            if let Some(members) = guards.get_mut(&id) {
                members.remove(object.id());
            }
        }
        if let Some(id) = new_region {
            if let Some(members) = guards.get_mut(&id) {
                members.insert(object);
            }
        }
        object.with_state(|state| state.region = new_region);

        for (id, members) in &guards {
            self.grid.try_region(*id)?.sync_players(members);
        }

        if object.kind().is_player() {
            self.update_activation(old_neighbors, new_neighbors);
        }

        drop(guards);

        // A decaying object has no client left to update
        if new_region.is_none() && !object.is_spawned() {
            outbox.discard(object.id());
        }

        tracing::debug!(object = %object.id(), from = ?old_region, to = ?new_region, "region changed");
        outbox.deliver(self.transport);
        Ok(())
    }

    fn update_activation(&self, old_neighbors: &[RegionId], new_neighbors: &[RegionId]) {
        for id in new_neighbors.iter().filter(|id| !old_neighbors.contains(id)) {
            if let Some(region) = self.grid.region(*id) {
                if !region.set_active(true) {
                    tracing::debug!(region = ?id, "region activated");
                }
            }
        }

        for id in old_neighbors.iter().filter(|id| !new_neighbors.contains(id)) {
            if !self.grid.is_empty_neighborhood(*id) {
                continue;
            }
            if let Some(region) = self.grid.region(*id) {
                if region.set_active(false) {
                    tracing::debug!(region = ?id, "region deactivated");
                }
            }
        }
    }

    /// Flip visibility and refresh every holder's view of `object`
    ///
    /// Knowledge membership is left untouched.
    pub fn set_visible(&self, object: &Arc<WorldObject>, visible: bool) {
        if object.store_visible(visible) == visible {
            return;
        }

        let holders = object.known_objects();
        let mut outbox = Outbox::default();
        for holder in &holders {
            let message = if visible {
                object.info_message()
            } else {
                OutboundMessage::DeleteObject { object: object.id() }
            };
            outbox.push(holder, message);
        }
        outbox.deliver(self.transport);

        for holder in &holders {
            object.behavior().on_set_visible(object, holder, self.transport);
        }
    }

    /// Resend "added" for every visible object `object` knows
    pub fn update_visible_status(&self, object: &WorldObject) {
        let mut outbox = Outbox::default();
        for other in object.known_objects() {
            if other.is_visible() {
                outbox.push(object, other.info_message());
            }
        }
        outbox.deliver(self.transport);
    }

    /// Make sure `object` and `other` know each other if they share a
    /// neighborhood. Returns true when anything was missing.
    ///
    /// Both regions stay locked while the pair is repaired, so a concurrent
    /// relocation of either side cannot interleave with it.
    pub fn revalidate(&self, object: &Arc<WorldObject>, other: &Arc<WorldObject>) -> bool {
        if object.id() == other.id() {
            return false;
        }
        let (Some(here), Some(there)) = (object.region(), other.region()) else {
            return false;
        };
        let (Some(region), Some(other_region)) = (self.grid.region(here), self.grid.region(there)) else {
            return false;
        };
        if !region.neighbors().contains(&there) {
            return false;
        }

        let mut outbox = Outbox::default();
        let repaired = {
            let (first, second) = if here <= there {
                (region, other_region)
            } else {
                (other_region, region)
            };
            let _first = first.lock();
            let _second = (first.id() != second.id()).then(|| second.lock());

            // A relocation that won the race already settled the pair
            if object.region() != Some(here) || other.region() != Some(there) {
                return false;
            }
            learn_pair(object, other, &mut outbox)
        };
        outbox.deliver(self.transport);
        repaired
    }

    /// Drop every known of `object` on both sides
    ///
    /// With `deleting`, `object` is going away and gets no notifications of
    /// its own.
    pub fn clear_knowns(&self, object: &WorldObject, deleting: bool) {
        let mut outbox = Outbox::default();
        for other in object.take_known() {
            if other.remove_known(object.id()) && object.is_visible() {
                outbox.push(&other, OutboundMessage::DeleteObject { object: object.id() });
            }
            if !deleting && other.is_visible() {
                outbox.push(object, OutboundMessage::DeleteObject { object: other.id() });
            }
        }
        outbox.deliver(self.transport);
    }
}

/// Returns true if either side learned something new
fn learn_pair(a: &Arc<WorldObject>, b: &Arc<WorldObject>, outbox: &mut Outbox) -> bool {
    let a_learned = a.insert_known(b);
    let b_learned = b.insert_known(a);
    if a_learned && b.is_visible() {
        outbox.push(a, b.info_message());
    }
    if b_learned && a.is_visible() {
        outbox.push(b, a.info_message());
    }
    a_learned || b_learned
}

fn forget_pair(a: &WorldObject, b: &WorldObject, outbox: &mut Outbox) {
    if a.remove_known(b.id()) && b.is_visible() {
        outbox.push(a, OutboundMessage::DeleteObject { object: b.id() });
    }
    if b.remove_known(a.id()) && a.is_visible() {
        outbox.push(b, OutboundMessage::DeleteObject { object: a.id() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GridConfig;
    use crate::core::types::{ObjectKind, Position};
    use crate::entity::{NpcBehavior, PlayerBehavior};
    use crate::transport::RecordingTransport;

    /// 4x4 cells of 100 units, 3x3 neighborhoods
    fn grid() -> RegionGrid {
        RegionGrid::new(&GridConfig {
            min_x: 0,
            max_x: 400,
            min_y: 0,
            max_y: 400,
            cell_size: 100,
            neighbor_radius: 1,
        })
        .unwrap()
    }

    fn spawned(id: u32, kind: ObjectKind) -> Arc<WorldObject> {
        let object = match kind {
            ObjectKind::Player => {
                WorldObject::new(ObjectId(id), kind, Position::default(), PlayerBehavior::new("p"))
            }
            _ => WorldObject::new(ObjectId(id), kind, Position::default(), NpcBehavior::new(1)),
        };
        object.store_spawned(true);
        Arc::new(object)
    }

    fn is_info(m: &OutboundMessage) -> bool {
        matches!(m, OutboundMessage::ObjectInfo { .. })
    }

    fn is_delete(m: &OutboundMessage) -> bool {
        matches!(m, OutboundMessage::DeleteObject { .. })
    }

    #[test]
    fn test_entering_neighborhood_is_mutual() {
        let grid = grid();
        let out = RecordingTransport::new();
        let tracker = KnowledgeTracker::new(&grid, &out);
        let a = spawned(1, ObjectKind::Player);
        let b = spawned(2, ObjectKind::Player);

        tracker.set_region(&a, Some(RegionId(0))).unwrap();
        tracker.set_region(&b, Some(RegionId(5))).unwrap();

        assert!(a.knows(ObjectId(2)));
        assert!(b.knows(ObjectId(1)));
        assert_eq!(out.count_for(ObjectId(1), is_info), 1);
        assert_eq!(out.count_for(ObjectId(2), is_info), 1);
        assert_eq!(grid.region(RegionId(5)).unwrap().player_count(), 1);
    }

    #[test]
    fn test_leaving_neighborhood_forgets_both_sides() {
        let grid = grid();
        let out = RecordingTransport::new();
        let tracker = KnowledgeTracker::new(&grid, &out);
        let a = spawned(1, ObjectKind::Player);
        let b = spawned(2, ObjectKind::Npc);

        tracker.set_region(&a, Some(RegionId(0))).unwrap();
        tracker.set_region(&b, Some(RegionId(1))).unwrap();
        out.clear();

        tracker.set_region(&a, Some(RegionId(15))).unwrap();

        assert!(!a.knows(ObjectId(2)));
        assert!(!b.knows(ObjectId(1)));
        assert_eq!(out.count_for(ObjectId(1), is_delete), 1);
        // NPCs have no client
        assert!(out.messages_for(ObjectId(2)).is_empty());
        assert!(!grid.region(RegionId(0)).unwrap().contains(ObjectId(1)));
        assert!(grid.region(RegionId(15)).unwrap().contains(ObjectId(1)));
        assert_eq!(a.region(), Some(RegionId(15)));
    }

    #[test]
    fn test_hidden_objects_are_known_but_not_announced() {
        let grid = grid();
        let out = RecordingTransport::new();
        let tracker = KnowledgeTracker::new(&grid, &out);
        let a = spawned(1, ObjectKind::Player);
        let ghost = spawned(2, ObjectKind::Player);
        ghost.store_visible(false);

        tracker.set_region(&ghost, Some(RegionId(0))).unwrap();
        tracker.set_region(&a, Some(RegionId(0))).unwrap();

        assert!(a.knows(ObjectId(2)));
        assert_eq!(out.count_for(ObjectId(1), is_info), 0);
        assert_eq!(out.count_for(ObjectId(2), is_info), 1);

        tracker.set_visible(&ghost, true);
        assert_eq!(out.count_for(ObjectId(1), is_info), 1);
        assert!(a.knows(ObjectId(2)));
    }

    #[test]
    fn test_set_visible_is_idempotent() {
        let grid = grid();
        let out = RecordingTransport::new();
        let tracker = KnowledgeTracker::new(&grid, &out);
        let a = spawned(1, ObjectKind::Player);
        let b = spawned(2, ObjectKind::Player);
        tracker.set_region(&a, Some(RegionId(0))).unwrap();
        tracker.set_region(&b, Some(RegionId(0))).unwrap();
        out.clear();

        tracker.set_visible(&b, false);
        tracker.set_visible(&b, false);

        assert_eq!(out.count_for(ObjectId(1), is_delete), 1);
        assert!(a.knows(ObjectId(2)));
    }

    #[test]
    fn test_moving_within_neighborhood_keeps_knowledge() {
        let grid = grid();
        let out = RecordingTransport::new();
        let tracker = KnowledgeTracker::new(&grid, &out);
        let a = spawned(1, ObjectKind::Player);
        let b = spawned(2, ObjectKind::Player);
        tracker.set_region(&a, Some(RegionId(5))).unwrap();
        tracker.set_region(&b, Some(RegionId(5))).unwrap();
        out.clear();

        tracker.set_region(&a, Some(RegionId(6))).unwrap();

        assert!(a.knows(ObjectId(2)));
        assert!(b.knows(ObjectId(1)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_unspawned_object_is_not_placed() {
        let grid = grid();
        let out = RecordingTransport::new();
        let tracker = KnowledgeTracker::new(&grid, &out);
        let a = spawned(1, ObjectKind::Player);
        a.store_spawned(false);

        tracker.set_region(&a, Some(RegionId(0))).unwrap();
        assert_eq!(a.region(), None);
        assert!(grid.region(RegionId(0)).unwrap().is_empty());
    }

    #[test]
    fn test_only_players_activate_regions() {
        let grid = grid();
        let out = RecordingTransport::new();
        let tracker = KnowledgeTracker::new(&grid, &out);
        let npc = spawned(1, ObjectKind::Npc);
        let hero = spawned(2, ObjectKind::Player);

        tracker.set_region(&npc, Some(RegionId(0))).unwrap();
        assert_eq!(grid.active_regions(), 0);

        tracker.set_region(&hero, Some(RegionId(0))).unwrap();
        assert!(grid.region(RegionId(0)).unwrap().is_active());
        assert!(grid.region(RegionId(5)).unwrap().is_active());
        assert_eq!(grid.active_regions(), 4);

        tracker.set_region(&hero, Some(RegionId(15))).unwrap();
        assert!(!grid.region(RegionId(0)).unwrap().is_active());
        assert!(grid.region(RegionId(10)).unwrap().is_active());
        assert_eq!(grid.active_regions(), 4);
    }

    #[test]
    fn test_revalidate_repairs_missing_pair() {
        let grid = grid();
        let out = RecordingTransport::new();
        let tracker = KnowledgeTracker::new(&grid, &out);
        let a = spawned(1, ObjectKind::Player);
        let b = spawned(2, ObjectKind::Npc);
        let far = spawned(3, ObjectKind::Npc);
        tracker.set_region(&a, Some(RegionId(0))).unwrap();
        tracker.set_region(&b, Some(RegionId(0))).unwrap();
        tracker.set_region(&far, Some(RegionId(15))).unwrap();

        a.remove_known(ObjectId(2));
        assert!(tracker.revalidate(&a, &b));
        assert!(a.knows(ObjectId(2)));
        assert!(!tracker.revalidate(&a, &b));
        assert!(!tracker.revalidate(&a, &far));
    }

    #[test]
    fn test_clear_knowns_on_delete() {
        let grid = grid();
        let out = RecordingTransport::new();
        let tracker = KnowledgeTracker::new(&grid, &out);
        let a = spawned(1, ObjectKind::Player);
        let b = spawned(2, ObjectKind::Player);
        tracker.set_region(&a, Some(RegionId(0))).unwrap();
        tracker.set_region(&b, Some(RegionId(0))).unwrap();
        out.clear();

        tracker.clear_knowns(&a, true);

        assert_eq!(a.known_count(), 0);
        assert!(!b.knows(ObjectId(1)));
        assert_eq!(out.count_for(ObjectId(2), is_delete), 1);
        assert!(out.messages_for(ObjectId(1)).is_empty());
    }

    #[test]
    fn test_update_visible_status_resends_visible_knowns() {
        let grid = grid();
        let out = RecordingTransport::new();
        let tracker = KnowledgeTracker::new(&grid, &out);
        let a = spawned(1, ObjectKind::Player);
        let b = spawned(2, ObjectKind::Npc);
        let c = spawned(3, ObjectKind::Npc);
        c.store_visible(false);
        for object in [&a, &b, &c] {
            tracker.set_region(object, Some(RegionId(0))).unwrap();
        }
        out.clear();

        tracker.update_visible_status(&a);
        assert_eq!(out.count_for(ObjectId(1), is_info), 1);
    }
}
