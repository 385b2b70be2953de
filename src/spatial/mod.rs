//! Region grid partitioning the playable area

pub mod grid;
pub mod region;

pub use grid::RegionGrid;
pub use region::{MemberSet, Region};
