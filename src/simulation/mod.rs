//! Systems running on their own timeline

pub mod regeneration;

pub use regeneration::{regeneration_tick, status_tick, RegenTimers, RegenerationScheduler};
