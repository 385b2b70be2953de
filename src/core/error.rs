use thiserror::Error;

use crate::core::types::{ObjectId, RegionId, ZoneId};

#[derive(Error, Debug)]
pub enum WorldError {
    #[error("Unknown region: {0:?}")]
    UnknownRegion(RegionId),

    #[error("Unknown zone: {0:?}")]
    UnknownZone(ZoneId),

    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("Object already spawned: {0}")]
    AlreadySpawned(ObjectId),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Malformed static data. Fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid zone {id:?}: {reason}")]
    InvalidZone { id: ZoneId, reason: String },

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),
}

/// A single regeneration tick that could not be applied
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegenError {
    #[error("Object {0} is dead")]
    Dead(ObjectId),

    #[error("Object {0} has decayed")]
    Decayed(ObjectId),
}

pub type Result<T> = std::result::Result<T, WorldError>;
