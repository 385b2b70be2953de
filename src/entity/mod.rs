pub mod behavior;
pub mod object;
pub mod vitals;

pub use behavior::{DoormanBehavior, NpcBehavior, ObjectBehavior, PetBehavior, PlayerBehavior};
pub use object::{KnownObjects, ObjectState, WorldObject};
pub use vitals::Vitals;
