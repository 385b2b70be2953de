//! World configuration with documented constants
//!
//! All grid and timer numbers are collected here with explanations of their
//! purpose. Values are loaded once from static data and passed by reference.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::error::ConfigError;

/// Interval of the per-object resource regeneration tick.
///
/// Fixed; only the status push interval is configurable.
pub const REGEN_TICK: Duration = Duration::from_millis(1000);

/// Lower bound (exclusive) of the water band on the z axis
pub const WATER_Z_MIN: i32 = -4779;

/// Upper bound (exclusive) of the water band on the z axis
pub const WATER_Z_MAX: i32 = -3779;

/// Dimensions of the region grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Smallest x coordinate covered by the grid (world units)
    pub min_x: i32,
    /// Largest x coordinate covered by the grid (exclusive)
    pub max_x: i32,
    /// Smallest y coordinate covered by the grid
    pub min_y: i32,
    /// Largest y coordinate covered by the grid (exclusive)
    pub max_y: i32,

    /// Edge length of one square region (world units)
    ///
    /// Together with `neighbor_radius` this sets how far an object "sees":
    /// with radius 1 an object knows everything within one to two cells.
    pub cell_size: i32,

    /// How many cells in each direction count as neighbors
    ///
    /// 1 gives the classic 3x3 neighborhood. Fixed at world load.
    pub neighbor_radius: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min_x: -294_912,
            max_x: 229_376,
            min_y: -262_144,
            max_y: 262_144,
            cell_size: 2048,
            neighbor_radius: 1,
        }
    }
}

impl GridConfig {
    /// Number of columns, rounding a partial last cell up
    pub fn columns(&self) -> i64 {
        let span = self.max_x as i64 - self.min_x as i64;
        (span + self.cell_size as i64 - 1) / self.cell_size as i64
    }

    /// Number of rows, rounding a partial last cell up
    pub fn rows(&self) -> i64 {
        let span = self.max_y as i64 - self.min_y as i64;
        (span + self.cell_size as i64 - 1) / self.cell_size as i64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_size <= 0 {
            return Err(ConfigError::InvalidGrid(format!(
                "cell_size must be positive, got {}",
                self.cell_size
            )));
        }

        if self.min_x >= self.max_x || self.min_y >= self.max_y {
            return Err(ConfigError::InvalidGrid(format!(
                "bounds are empty or inverted: x {}..{}, y {}..{}",
                self.min_x, self.max_x, self.min_y, self.max_y
            )));
        }

        // Region indices are computed in i32, which also bounds columns and rows
        let cells = self.columns() * self.rows();
        if cells > i32::MAX as i64 {
            return Err(ConfigError::InvalidGrid(format!(
                "{} cells exceed the addressable region count",
                cells
            )));
        }

        Ok(())
    }
}

/// Timing of the regeneration scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegenConfig {
    /// How often aggregated status is pushed to the client (milliseconds)
    ///
    /// Slower than the regeneration tick so the client sees batched changes.
    pub status_interval_ms: u64,
}

impl Default for RegenConfig {
    fn default() -> Self {
        Self {
            status_interval_ms: 3000,
        }
    }
}

impl RegenConfig {
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.status_interval_ms == 0 {
            return Err(ConfigError::InvalidInterval(
                "status_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the world core
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub grid: GridConfig,
    pub regeneration: RegenConfig,
}

impl WorldConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        self.regeneration.validate()
    }
}
