// HTTP request and response payloads.

use crate::domain::tricks::{TrickAction, TrickId, TrickTrigger};
use crate::domain::{Announcement, Entity, GamePhase, Physics, PlayerId, Spell, WorldPlayer};
use crate::interface_adapters::world::PlayerRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Request payload for joining the world.
#[derive(Debug, Deserialize)]
pub struct JoinPlayerRequest {
    pub name: String,
    #[serde(default)]
    pub spectating: bool,
}

#[derive(Debug, Serialize)]
pub struct JoinPlayerResponse {
    pub player_id: PlayerId,
}

// Request payload for starting a round.
#[derive(Debug, Deserialize)]
pub struct StartRoundRequest {
    pub game_type: String,
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
}

// Request payload for ending the current round; the result defaults to "cancelled".
#[derive(Debug, Default, Deserialize)]
pub struct EndRoundRequest {
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddTrickRequest {
    pub trigger: TrickTrigger,
    pub action: TrickAction,
}

#[derive(Debug, Serialize)]
pub struct AddTrickResponse {
    pub trick_id: TrickId,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub player_id: PlayerId,
    #[serde(default = "default_points")]
    pub points: i64,
}

fn default_points() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct EliminateRequest {
    pub player_id: PlayerId,
}

// Snapshot of the shared world for dashboards and late joiners.
#[derive(Debug, Serialize)]
pub struct WorldSnapshot {
    pub phase: GamePhase,
    pub physics: Physics,
    pub players: Vec<WorldPlayer>,
    pub entities: Vec<Entity>,
    pub announcements: Vec<Announcement>,
    pub spells: Vec<Spell>,
    pub records: BTreeMap<PlayerId, PlayerRecord>,
}
