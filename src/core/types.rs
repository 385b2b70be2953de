//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for world objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a region cell in the world grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u32);

impl RegionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a zone loaded from static data
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

/// Identifier of a clan, used by structure-controlled objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClanId(pub u32);

/// Integer world position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Radius test against another point.
    ///
    /// `strict` excludes the boundary. Without `check_z` only the horizontal
    /// plane is considered.
    pub fn is_inside_radius(&self, other: Position, radius: i32, check_z: bool, strict: bool) -> bool {
        let dx = (other.x as i64) - (self.x as i64);
        let dy = (other.y as i64) - (self.y as i64);
        let dz = if check_z { (other.z as i64) - (self.z as i64) } else { 0 };
        let dist_sq = dx * dx + dy * dy + dz * dz;
        let radius_sq = (radius as i64) * (radius as i64);

        if strict {
            dist_sq < radius_sq
        } else {
            dist_sq <= radius_sq
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Kind of simulated object
///
/// Only players carry a client connection and activate regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Player,
    Npc,
    Pet,
    Structure,
}

impl ObjectKind {
    pub fn is_player(self) -> bool {
        matches!(self, ObjectKind::Player)
    }
}
