// Use-case level outputs of the round engine: broadcast events and status views.

use crate::domain::{
    Announcement, Entity, EntityId, Physics, PlayerId, RoundResult, Spell, Vec3,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Fire-and-forget notifications handed to the network layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RoundEvent {
    PlayersTeleported { position: Vec3 },
    Announcement(Announcement),
    MinigameEnded(RoundEnded),
    EntitySpawned(Entity),
    EntityDestroyed { id: EntityId },
    PhysicsChanged(Physics),
    SpellCast(Spell),
}

impl RoundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlayersTeleported { .. } => "players_teleported",
            Self::Announcement(_) => "announcement",
            Self::MinigameEnded(_) => "minigame_ended",
            Self::EntitySpawned(_) => "entity_spawned",
            Self::EntityDestroyed { .. } => "entity_destroyed",
            Self::PhysicsChanged(_) => "physics_changed",
            Self::SpellCast(_) => "spell_cast",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundEnded {
    pub id: String,
    #[serde(rename = "type")]
    pub game_type: String,
    pub result: RoundResult,
    pub winners: Vec<PlayerId>,
    pub losers: Vec<PlayerId>,
    pub scores: BTreeMap<PlayerId, i64>,
}

/// Participant snapshot captured at `start()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub score: i64,
    pub alive: bool,
    pub position: Vec3,
}

/// Value returned by `end()` and handed to the completion callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSummary {
    pub id: String,
    pub result: RoundResult,
    pub winners: Vec<PlayerId>,
    pub scores: BTreeMap<PlayerId, i64>,
}

/// Returned by a game type's win-condition hook.
#[derive(Debug, Clone, PartialEq)]
pub struct WinOutcome {
    pub result: RoundResult,
    pub winner_id: Option<PlayerId>,
}

impl WinOutcome {
    pub fn winner(winner_id: PlayerId) -> Self {
        Self {
            result: RoundResult::Win,
            winner_id: Some(winner_id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundStatus {
    pub id: String,
    #[serde(rename = "type")]
    pub game_type: String,
    pub is_active: bool,
    pub time_remaining_ms: u64,
    pub participants: BTreeMap<PlayerId, Participant>,
    pub scores: BTreeMap<PlayerId, i64>,
    pub winners: Vec<PlayerId>,
    pub losers: Vec<PlayerId>,
    pub trick_count: usize,
    pub tricks_fired: usize,
}
