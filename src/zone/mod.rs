//! Zones and per-object zone classification

pub mod area;
pub mod classification;
pub mod registry;

pub use area::{ContainmentTest, Zone, ZoneBounds, ZoneKind};
pub use classification::{is_water_depth, Classification, ZoneState};
pub use registry::{ZoneDefinition, ZoneRegistry};
