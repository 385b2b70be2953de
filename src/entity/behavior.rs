//! Per-variant behavior hooks
//!
//! Every object carries one `ObjectBehavior`. The world calls the hooks at
//! fixed points of the object's life; variants override only what they need.

use crate::core::error::RegenError;
use crate::core::types::{ClanId, ObjectId};
use crate::entity::object::WorldObject;
use crate::transport::{OutboundMessage, Transport};
use crate::zone::Zone;

pub trait ObjectBehavior: Send + Sync {
    /// Fired once the object is registered and placed in its region
    fn on_spawn(&self, _this: &WorldObject, _out: &dyn Transport) {}

    /// `actor` clicked or otherwise targeted this object
    fn on_action(&self, _this: &WorldObject, _actor: &WorldObject, _out: &dyn Transport) {}

    fn on_enter_zone(&self, _this: &WorldObject, _zone: &Zone, _out: &dyn Transport) {}

    /// `destroying` is set when the exit comes from decay
    fn on_exit_zone(&self, _this: &WorldObject, _zone: &Zone, _destroying: bool, _out: &dyn Transport) {}

    /// This object's visibility changed while `viewer` knows it
    fn on_set_visible(&self, _this: &WorldObject, _viewer: &WorldObject, _out: &dyn Transport) {}

    /// One regeneration tick. Takes only the object's state lock.
    fn regenerate(&self, this: &WorldObject) -> Result<(), RegenError> {
        this.with_state(|state| {
            if state.dead {
                return Err(RegenError::Dead(this.id()));
            }
            state.vitals.regenerate();
            Ok(())
        })
    }

    /// Who receives this object's periodic status, if anyone
    fn status_recipient(&self, _this: &WorldObject) -> Option<ObjectId> {
        None
    }

    fn describe(&self, this: &WorldObject) -> String {
        format!("Object: {}", this.id())
    }
}

/// Player-controlled character
#[derive(Debug, Clone)]
pub struct PlayerBehavior {
    pub name: String,
}

impl PlayerBehavior {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ObjectBehavior for PlayerBehavior {
    fn on_spawn(&self, this: &WorldObject, out: &dyn Transport) {
        // The client needs to see itself before anything else
        out.send(this.id(), this.info_message());
    }

    fn status_recipient(&self, this: &WorldObject) -> Option<ObjectId> {
        Some(this.id())
    }

    fn describe(&self, this: &WorldObject) -> String {
        format!("Player: {} ({})", self.name, this.id())
    }
}

/// Server-controlled character built from a template
#[derive(Debug, Clone)]
pub struct NpcBehavior {
    pub template_id: u32,
}

impl NpcBehavior {
    pub fn new(template_id: u32) -> Self {
        Self { template_id }
    }
}

impl ObjectBehavior for NpcBehavior {
    fn on_action(&self, this: &WorldObject, actor: &WorldObject, out: &dyn Transport) {
        if !actor.kind().is_player() {
            return;
        }
        out.send(
            actor.id(),
            OutboundMessage::NpcHtml {
                npc: this.id(),
                page: format!("{}.htm", self.template_id),
            },
        );
    }

    fn describe(&self, this: &WorldObject) -> String {
        format!("Npc: {}; id {}", self.template_id, this.id())
    }
}

/// Summoned companion; status goes to its owner
#[derive(Debug, Clone)]
pub struct PetBehavior {
    pub owner: ObjectId,
}

impl ObjectBehavior for PetBehavior {
    fn status_recipient(&self, _this: &WorldObject) -> Option<ObjectId> {
        Some(self.owner)
    }

    fn describe(&self, this: &WorldObject) -> String {
        format!("Pet: {} of {}", this.id(), self.owner)
    }
}

/// Structure-controlled NPC guarding a clan hall
///
/// Only members of the owning clan get an answer.
#[derive(Debug, Clone)]
pub struct DoormanBehavior {
    pub template_id: u32,
    pub hall_id: u32,
    pub owner_clan: Option<ClanId>,
}

impl ObjectBehavior for DoormanBehavior {
    fn on_action(&self, this: &WorldObject, actor: &WorldObject, out: &dyn Transport) {
        if self.owner_clan.is_none() || actor.clan() != self.owner_clan {
            return;
        }
        out.send(
            actor.id(),
            OutboundMessage::NpcHtml {
                npc: this.id(),
                page: "agitjanitorhi.htm".into(),
            },
        );
    }

    fn describe(&self, this: &WorldObject) -> String {
        format!(
            "Doorman: {}; id {}; hall {}",
            self.template_id,
            this.id(),
            self.hall_id
        )
    }
}
