//! World lifecycle, object index and knowledge tracking

pub mod index;
pub mod knowledge;
pub mod lifecycle;
pub mod loader;

pub use index::WorldIndex;
pub use knowledge::KnowledgeTracker;
pub use lifecycle::World;
pub use loader::WorldData;
