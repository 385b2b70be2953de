//! Fixed region grid over the playable area

use std::sync::Arc;

use super::region::Region;
use crate::core::config::GridConfig;
use crate::core::error::{ConfigError, Result, WorldError};
use crate::core::types::{ObjectId, Position, RegionId};
use crate::entity::WorldObject;

/// Row-major grid of regions with precomputed neighborhoods
#[derive(Debug)]
pub struct RegionGrid {
    config: GridConfig,
    columns: i32,
    rows: i32,
    regions: Vec<Region>,
}

impl RegionGrid {
    pub fn new(config: &GridConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let columns = config.columns() as i32;
        let rows = config.rows() as i32;
        let radius = config.neighbor_radius.min(i32::MAX as u32) as i32;

        let mut regions = Vec::with_capacity(columns as usize * rows as usize);
        for row in 0..rows {
            for column in 0..columns {
                let id = RegionId((row * columns + column) as u32);
                let neighbors = neighborhood(column, row, columns, rows, radius);
                regions.push(Region::new(id, column, row, neighbors));
            }
        }

        tracing::debug!(columns, rows, radius, "region grid built");

        Ok(Self {
            config: config.clone(),
            columns,
            rows,
            regions,
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    /// Convert a world position to (column, row), clamped to the grid
    #[inline]
    pub fn cell_of(&self, position: Position) -> (i32, i32) {
        let cell = self.config.cell_size as i64;
        let column = (position.x as i64 - self.config.min_x as i64).div_euclid(cell);
        let row = (position.y as i64 - self.config.min_y as i64).div_euclid(cell);
        (
            column.clamp(0, self.columns as i64 - 1) as i32,
            row.clamp(0, self.rows as i64 - 1) as i32,
        )
    }

    /// Region containing `position`. Never fails.
    #[inline]
    pub fn lookup(&self, position: Position) -> &Region {
        let (column, row) = self.cell_of(position);
        &self.regions[(row * self.columns + column) as usize]
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.index())
    }

    pub fn try_region(&self, id: RegionId) -> Result<&Region> {
        self.region(id).ok_or(WorldError::UnknownRegion(id))
    }

    pub fn neighbors(&self, id: RegionId) -> Result<&[RegionId]> {
        Ok(self.try_region(id)?.neighbors())
    }

    pub fn add_member(&self, id: RegionId, object: &Arc<WorldObject>) -> Result<bool> {
        Ok(self.try_region(id)?.add_member(object))
    }

    pub fn remove_member(&self, id: RegionId, object: ObjectId) -> Result<bool> {
        Ok(self.try_region(id)?.remove_member(object))
    }

    /// True when no region around `id` (itself included) holds a player
    pub fn is_empty_neighborhood(&self, id: RegionId) -> bool {
        self.region(id).map_or(true, |region| {
            region
                .neighbors()
                .iter()
                .filter_map(|n| self.region(*n))
                .all(|n| n.player_count() == 0)
        })
    }

    pub fn active_regions(&self) -> usize {
        self.regions.iter().filter(|r| r.is_active()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Ids of every cell within `radius` of (column, row), ascending
fn neighborhood(column: i32, row: i32, columns: i32, rows: i32, radius: i32) -> Vec<RegionId> {
    let rows_range = row.saturating_sub(radius).max(0)..=row.saturating_add(radius).min(rows - 1);
    let columns_range = column.saturating_sub(radius).max(0)..=column.saturating_add(radius).min(columns - 1);

    rows_range
        .flat_map(|r| columns_range.clone().map(move |c| RegionId((r * columns + c) as u32)))
        .collect()
}
