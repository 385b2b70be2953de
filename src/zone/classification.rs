//! Per-object zone classification state machine
//!
//! Three independent axes are tracked: Battle/Peace/Neutral, water and the
//! forced-PvP override. Every transition returns the messages the object's
//! own client should receive; nothing is emitted when an axis is unchanged.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::area::{Zone, ZoneKind};
use crate::core::config::{WATER_Z_MAX, WATER_Z_MIN};
use crate::core::types::ZoneId;
use crate::transport::{CompassCode, OutboundMessage, SystemMessageId};

/// Aggregate gameplay classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Battle,
    Peace,
    Neutral,
}

impl Classification {
    pub fn compass(self) -> CompassCode {
        match self {
            Classification::Battle => CompassCode::Pvp,
            Classification::Peace => CompassCode::Peace,
            Classification::Neutral => CompassCode::General,
        }
    }
}

/// Open interval test on the z axis
#[inline]
pub fn is_water_depth(z: i32) -> bool {
    z > WATER_Z_MIN && z < WATER_Z_MAX
}

#[derive(Debug, Default)]
pub struct ZoneState {
    active: BTreeMap<ZoneId, Arc<Zone>>,
    in_peace: bool,
    in_pvp: bool,
    in_water: bool,
    in_siege: bool,
    forced_pvp: bool,
    last_compass: Option<CompassCode>,
}

impl ZoneState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate `zone`. Returns `None` if it was already active.
    pub fn enter(&mut self, zone: &Arc<Zone>, z: i32) -> Option<Vec<OutboundMessage>> {
        if self.active.contains_key(&zone.id()) {
            return None;
        }
        self.active.insert(zone.id(), Arc::clone(zone));

        let mut out = Vec::new();
        self.reclassify(z, &mut out);
        Some(out)
    }

    /// Deactivate a zone. Returns `None` if it was not active.
    pub fn exit(&mut self, zone: ZoneId, z: i32) -> Option<(Arc<Zone>, Vec<OutboundMessage>)> {
        let removed = self.active.remove(&zone)?;

        let mut out = Vec::new();
        self.reclassify(z, &mut out);
        Some((removed, out))
    }

    pub fn set_forced_pvp(&mut self, forced: bool, z: i32) -> Vec<OutboundMessage> {
        self.forced_pvp = forced;

        let mut out = Vec::new();
        self.reclassify(z, &mut out);
        out
    }

    /// Recompute the water flag only. Returns true when it changed.
    pub fn revalidate_water(&mut self, z: i32) -> bool {
        let was = self.in_water;
        self.in_water = is_water_depth(z);
        was != self.in_water
    }

    fn has_kind(&self, kind: ZoneKind) -> bool {
        self.active.values().any(|zone| zone.kind() == kind)
    }

    fn reclassify(&mut self, z: i32, out: &mut Vec<OutboundMessage>) {
        let was_pvp = self.in_pvp;
        let was_peace = self.in_peace;

        self.in_pvp = self.forced_pvp || self.has_kind(ZoneKind::Battle);
        self.in_peace = self.has_kind(ZoneKind::Peace);
        self.in_siege = self.has_kind(ZoneKind::Siege);
        self.in_water = is_water_depth(z);

        match (was_pvp, self.in_pvp) {
            (false, true) => out.push(OutboundMessage::System(SystemMessageId::EnteredCombatZone)),
            (true, false) => out.push(OutboundMessage::System(SystemMessageId::LeftCombatZone)),
            _ => {}
        }

        match (was_peace, self.in_peace) {
            (false, true) => out.push(OutboundMessage::System(SystemMessageId::EnterPeacefulZone)),
            (true, false) => out.push(OutboundMessage::System(SystemMessageId::ExitPeacefulZone)),
            _ => {}
        }

        let code = self.classification().compass();
        if self.last_compass != Some(code) {
            self.last_compass = Some(code);
            out.push(OutboundMessage::CompassZone(code));
        }
    }

    pub fn classification(&self) -> Classification {
        if self.in_pvp {
            Classification::Battle
        } else if self.in_peace {
            Classification::Peace
        } else {
            Classification::Neutral
        }
    }

    pub fn is_in_battle(&self) -> bool {
        self.in_pvp
    }

    /// Peace only counts when no combat rule overrides it
    pub fn is_in_peace(&self) -> bool {
        !self.in_pvp && self.in_peace
    }

    pub fn is_in_water(&self) -> bool {
        self.in_water
    }

    pub fn is_in_siege(&self) -> bool {
        self.in_siege
    }

    pub fn forced_pvp(&self) -> bool {
        self.forced_pvp
    }

    pub fn last_compass(&self) -> Option<CompassCode> {
        self.last_compass
    }

    pub fn is_active(&self, zone: ZoneId) -> bool {
        self.active.contains_key(&zone)
    }

    pub fn active_zone_ids(&self) -> Vec<ZoneId> {
        self.active.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::area::ZoneBounds;

    const DRY: i32 = 0;

    fn zone(id: u32, kind: ZoneKind) -> Arc<Zone> {
        let bounds = ZoneBounds {
            min_x: 0,
            max_x: 1,
            min_y: 0,
            max_y: 1,
            min_z: 0,
            max_z: 1,
        };
        Arc::new(Zone::new(ZoneId(id), format!("zone-{id}"), kind, bounds))
    }

    fn system_count(messages: &[OutboundMessage], id: SystemMessageId) -> usize {
        messages
            .iter()
            .filter(|m| **m == OutboundMessage::System(id))
            .count()
    }

    #[test]
    fn test_water_band_is_open_interval() {
        assert!(!is_water_depth(-4779));
        assert!(is_water_depth(-4778));
        assert!(is_water_depth(-4000));
        assert!(is_water_depth(-3780));
        assert!(!is_water_depth(-3779));
        assert!(!is_water_depth(0));
    }

    #[test]
    fn test_neutral_by_default() {
        let state = ZoneState::new();
        assert_eq!(state.classification(), Classification::Neutral);
        assert_eq!(state.last_compass(), None);
    }

    #[test]
    fn test_battle_outranks_peace() {
        let mut state = ZoneState::new();
        state.enter(&zone(1, ZoneKind::Peace), DRY);
        let out = state.enter(&zone(2, ZoneKind::Battle), DRY).unwrap();

        assert_eq!(state.classification(), Classification::Battle);
        assert_eq!(system_count(&out, SystemMessageId::EnteredCombatZone), 1);
        assert_eq!(system_count(&out, SystemMessageId::EnterPeacefulZone), 0);
        assert_eq!(system_count(&out, SystemMessageId::ExitPeacefulZone), 0);
        assert!(!state.is_in_peace());
    }

    #[test]
    fn test_peace_survives_partial_exit() {
        let mut state = ZoneState::new();
        state.enter(&zone(1, ZoneKind::Peace), DRY);
        state.enter(&zone(2, ZoneKind::Peace), DRY);
        let (_, out) = state.exit(ZoneId(1), DRY).unwrap();

        assert_eq!(state.classification(), Classification::Peace);
        assert!(out.is_empty());
    }

    #[test]
    fn test_reentering_active_zone_is_noop() {
        let mut state = ZoneState::new();
        let town = zone(1, ZoneKind::Peace);
        assert!(state.enter(&town, DRY).is_some());
        assert!(state.enter(&town, DRY).is_none());
        assert!(state.exit(ZoneId(9), DRY).is_none());
    }

    #[test]
    fn test_compass_only_on_change() {
        let mut state = ZoneState::new();
        let out = state.enter(&zone(1, ZoneKind::Battle), DRY).unwrap();
        assert!(out.contains(&OutboundMessage::CompassZone(CompassCode::Pvp)));

        // Second battle zone keeps the same classification
        let out = state.enter(&zone(2, ZoneKind::Battle), DRY).unwrap();
        assert!(out.is_empty());

        let out = state.set_forced_pvp(true, DRY);
        assert!(out.is_empty());
    }

    #[test]
    fn test_forced_pvp_overrides_and_releases() {
        let mut state = ZoneState::new();
        state.enter(&zone(1, ZoneKind::Peace), DRY);

        let out = state.set_forced_pvp(true, DRY);
        assert_eq!(state.classification(), Classification::Battle);
        assert_eq!(system_count(&out, SystemMessageId::EnteredCombatZone), 1);

        let out = state.set_forced_pvp(false, DRY);
        assert_eq!(state.classification(), Classification::Peace);
        assert_eq!(system_count(&out, SystemMessageId::LeftCombatZone), 1);
        assert!(out.contains(&OutboundMessage::CompassZone(CompassCode::Peace)));
    }

    #[test]
    fn test_water_follows_depth_on_reclassify() {
        let mut state = ZoneState::new();
        state.enter(&zone(1, ZoneKind::Water), -4000);
        assert!(state.is_in_water());

        assert!(state.revalidate_water(0));
        assert!(!state.is_in_water());
        assert!(!state.revalidate_water(0));
    }

    #[test]
    fn test_siege_flag_tracks_siege_zones() {
        let mut state = ZoneState::new();
        state.enter(&zone(1, ZoneKind::Siege), DRY);
        assert!(state.is_in_siege());
        assert_eq!(state.classification(), Classification::Neutral);

        state.exit(ZoneId(1), DRY);
        assert!(!state.is_in_siege());
    }
}
