//! World Awareness - spatial knowledge and zone classification core

pub mod core;
pub mod entity;
pub mod simulation;
pub mod spatial;
pub mod transport;
pub mod world;
pub mod zone;
