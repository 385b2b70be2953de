pub mod config;
pub mod error;
pub mod types;

pub use config::{GridConfig, RegenConfig, WorldConfig};
pub use error::{ConfigError, RegenError, Result, WorldError};
pub use types::{ClanId, ObjectId, ObjectKind, Position, RegionId, ZoneId};
