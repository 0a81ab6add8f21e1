// Domain layer: round rules, world records and the ports the engine depends on.

pub mod entities;
pub mod errors;
pub mod obstacles;
pub mod ports;
pub mod timers;
pub mod tricks;
pub mod tuning;

pub use entities::{
    Announcement, AnnouncementKind, Entity, EntityId, EntityKind, EntityProperties, EntitySpec,
    GamePhase, Physics, PhysicsPatch, PlayerId, PlayerState, RoundRecord, RoundResult, Spell,
    SpellKind, StartOptions, Vec3, WorldPlayer,
};
pub use errors::{ConfigurationError, HistoryError, WorldError};
pub use ports::{HistoryStore, WorldPort};
