use std::time::Duration;

use crate::domain::entities::{
    Announcement, AnnouncementKind, Entity, EntityId, EntitySpec, GamePhase, Physics,
    PhysicsPatch, PlayerId, RoundRecord, RoundResult, Spell, SpellKind, StartOptions, Vec3,
    WorldPlayer,
};
use crate::domain::errors::{HistoryError, WorldError};

// Port for the authoritative shared world. The round engine only reaches the
// world through this trait; implementations own their own locking.
pub trait WorldPort: Send + Sync {
    fn players(&self) -> Vec<WorldPlayer>;
    fn player_name(&self, id: PlayerId) -> Option<String>;
    fn player_position(&self, id: PlayerId) -> Option<Vec3>;
    fn teleport_player(&self, id: PlayerId, position: Vec3);
    fn respawn_point(&self) -> Vec3;

    fn physics(&self) -> Physics;
    fn set_physics(&self, patch: PhysicsPatch) -> Physics;

    fn phase(&self) -> GamePhase;
    fn start_game(&self, game_type: &str, options: StartOptions);
    fn end_game(&self, result: &RoundResult, winner_id: Option<PlayerId>);
    fn enter_lobby(&self);
    // Advances world-owned clocks (countdown, spell expiry). Driven by the host.
    fn advance(&self, delta: Duration);

    fn spawn_entity(&self, spec: EntitySpec) -> Entity;
    fn destroy_entity(&self, id: EntityId) -> Result<(), WorldError>;

    fn announce(&self, text: &str, kind: AnnouncementKind) -> Announcement;
    fn cast_spell(&self, kind: SpellKind, duration_ms: u64) -> Spell;
    fn record_game_result(&self, player_id: PlayerId, won: bool, score: i64);
}

// Port for persisting completed round summaries. Must not block the tick.
pub trait HistoryStore: Send + Sync {
    fn save(&self, record: RoundRecord) -> Result<(), HistoryError>;
}
