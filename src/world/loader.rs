//! Load world static data from TOML
//!
//! One file carries the grid dimensions, scheduler timing and every zone:
//!
//! ```toml
//! [grid]
//! cell_size = 2048
//!
//! [regeneration]
//! status_interval_ms = 3000
//!
//! [[zones]]
//! id = 1
//! name = "Talking Island Village"
//! kind = "peace"
//! bounds = { min_x = -84000, max_x = -80000, min_y = 242000, max_y = 246000, min_z = -4000, max_z = -3000 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::config::{GridConfig, RegenConfig, WorldConfig};
use crate::core::error::ConfigError;
use crate::zone::{ZoneDefinition, ZoneRegistry};

/// Default location of the world data file
pub const DEFAULT_WORLD_FILE: &str = "data/world.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldData {
    pub grid: GridConfig,
    pub regeneration: RegenConfig,
    pub zones: Vec<ZoneDefinition>,
}

impl WorldData {
    /// Parse and validate
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let data: WorldData = toml::from_str(content)?;
        data.config().validate()?;
        for zone in &data.zones {
            zone.validate()?;
        }
        Ok(data)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let data = Self::from_toml(&content)?;
        tracing::info!(path = %path.display(), zones = data.zones.len(), "world data loaded");
        Ok(data)
    }

    pub fn config(&self) -> WorldConfig {
        WorldConfig {
            grid: self.grid.clone(),
            regeneration: self.regeneration.clone(),
        }
    }

    /// Build the zone registry; duplicate ids are rejected here
    pub fn zone_registry(&self) -> Result<ZoneRegistry, ConfigError> {
        ZoneRegistry::from_definitions(&self.zones)
    }
}

pub fn default_world_path() -> PathBuf {
    PathBuf::from(DEFAULT_WORLD_FILE)
}
