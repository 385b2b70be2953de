//! Zones: named volumes with a gameplay effect

use ahash::AHashSet;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::{ObjectId, Position, ZoneId};

/// Gameplay effect of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Peace,
    Battle,
    Water,
    Siege,
}

/// Point-in-volume test supplied by the geometry layer.
///
/// The core only calls it; polygon math lives with the broad-phase scan.
pub trait ContainmentTest: Send + Sync {
    fn contains(&self, position: Position) -> bool;
}

/// Axis-aligned box, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    pub min_z: i32,
    pub max_z: i32,
}

impl ZoneBounds {
    pub fn is_well_formed(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y && self.min_z <= self.max_z
    }
}

impl ContainmentTest for ZoneBounds {
    fn contains(&self, p: Position) -> bool {
        (self.min_x..=self.max_x).contains(&p.x)
            && (self.min_y..=self.max_y).contains(&p.y)
            && (self.min_z..=self.max_z).contains(&p.z)
    }
}

pub struct Zone {
    id: ZoneId,
    name: String,
    kind: ZoneKind,
    shape: Box<dyn ContainmentTest>,
    members: Mutex<AHashSet<ObjectId>>,
}

impl Zone {
    pub fn new(id: ZoneId, name: impl Into<String>, kind: ZoneKind, shape: impl ContainmentTest + 'static) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            shape: Box::new(shape),
            members: Mutex::new(AHashSet::new()),
        }
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ZoneKind {
        self.kind
    }

    /// Delegates to the geometric test
    pub fn contains(&self, position: Position) -> bool {
        self.shape.contains(position)
    }

    pub fn has_member(&self, id: ObjectId) -> bool {
        self.members.lock().contains(&id)
    }

    pub fn member_count(&self) -> usize {
        self.members.lock().len()
    }

    pub fn members(&self) -> Vec<ObjectId> {
        self.members.lock().iter().copied().collect()
    }

    pub(crate) fn add_member(&self, id: ObjectId) -> bool {
        self.members.lock().insert(id)
    }

    /// Absent members are ignored
    pub(crate) fn remove_member(&self, id: ObjectId) -> bool {
        self.members.lock().remove(&id)
    }
}

impl fmt::Debug for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zone")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
