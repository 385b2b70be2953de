//! Outbound notification surface
//!
//! The core never encodes packets. It hands closed `OutboundMessage` values to
//! a `Transport`, which owns client connections and wire encoding.

pub mod recording;

pub use recording::RecordingTransport;

use crate::core::types::{ObjectId, ObjectKind, Position};
use crate::entity::WorldObject;

/// Client-facing zone indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompassCode {
    Pvp,
    Peace,
    General,
}

impl CompassCode {
    /// Code carried on the wire
    pub fn code(self) -> u8 {
        match self {
            CompassCode::Peace => 0x0C,
            CompassCode::Pvp => 0x0E,
            CompassCode::General => 0x0F,
        }
    }
}

/// System messages raised by zone transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemMessageId {
    EnteredCombatZone,
    LeftCombatZone,
    EnterPeacefulZone,
    ExitPeacefulZone,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// The recipient should start drawing `object`
    ObjectInfo {
        object: ObjectId,
        kind: ObjectKind,
        position: Position,
        heading: i32,
    },
    /// The recipient should forget `object`
    DeleteObject { object: ObjectId },
    CompassZone(CompassCode),
    System(SystemMessageId),
    Text(String),
    StatusUpdate {
        object: ObjectId,
        hp: u32,
        mp: u32,
        cp: u32,
    },
    /// Dialogue page served by an NPC
    NpcHtml { npc: ObjectId, page: String },
}

/// Connection layer consumed by the core.
///
/// Sends are fire-and-forget and must not block the caller.
pub trait Transport: Send + Sync {
    fn send(&self, recipient: ObjectId, message: OutboundMessage);

    /// Fan `message` out to every player that currently knows `sender`.
    fn broadcast(&self, sender: &WorldObject, message: OutboundMessage, exclude_self: bool) {
        if !exclude_self && sender.kind().is_player() {
            self.send(sender.id(), message.clone());
        }

        for player in sender.known_players() {
            self.send(player.id(), message.clone());
        }
    }
}

/// Transport that only traces what it would have sent
#[derive(Debug, Default)]
pub struct LogTransport;

impl Transport for LogTransport {
    fn send(&self, recipient: ObjectId, message: OutboundMessage) {
        tracing::trace!(%recipient, ?message, "send");
    }
}
