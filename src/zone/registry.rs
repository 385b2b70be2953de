//! Zone registry built once from static data

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::area::{Zone, ZoneBounds, ZoneKind};
use crate::core::error::ConfigError;
use crate::core::types::{Position, ZoneId};

/// Zone as written in static data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDefinition {
    pub id: u32,
    pub name: String,
    pub kind: ZoneKind,
    pub bounds: ZoneBounds,
}

impl ZoneDefinition {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidZone {
                id: ZoneId(self.id),
                reason: "name is empty".into(),
            });
        }
        if !self.bounds.is_well_formed() {
            return Err(ConfigError::InvalidZone {
                id: ZoneId(self.id),
                reason: format!("bounds are inverted: {:?}", self.bounds),
            });
        }
        Ok(())
    }
}

/// All zones of the world, indexed by id
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    zones: BTreeMap<ZoneId, Arc<Zone>>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from static definitions, rejecting malformed or duplicate entries
    pub fn from_definitions(definitions: &[ZoneDefinition]) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for definition in definitions {
            definition.validate()?;
            registry.insert(Zone::new(
                ZoneId(definition.id),
                definition.name.clone(),
                definition.kind,
                definition.bounds,
            ))?;
        }
        Ok(registry)
    }

    /// Register a zone with a custom containment test
    pub fn insert(&mut self, zone: Zone) -> Result<Arc<Zone>, ConfigError> {
        let id = zone.id();
        if self.zones.contains_key(&id) {
            return Err(ConfigError::InvalidZone {
                id,
                reason: "duplicate id".into(),
            });
        }
        let zone = Arc::new(zone);
        self.zones.insert(id, Arc::clone(&zone));
        Ok(zone)
    }

    pub fn get(&self, id: ZoneId) -> Option<&Arc<Zone>> {
        self.zones.get(&id)
    }

    pub fn by_kind(&self, kind: ZoneKind) -> impl Iterator<Item = &Arc<Zone>> {
        self.zones.values().filter(move |zone| zone.kind() == kind)
    }

    /// Zones whose containment test holds at `position`
    pub fn zones_at(&self, position: Position) -> Vec<&Arc<Zone>> {
        self.zones
            .values()
            .filter(|zone| zone.contains(position))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Zone>> {
        self.zones.values()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
