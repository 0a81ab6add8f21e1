// Domain-level world and round records shared across the round engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type PlayerId = u64;
pub type EntityId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Distance on the ground plane (x/z), ignoring height.
    pub fn planar_distance(&self, other: &Vec3) -> f32 {
        (self.x - other.x).hypot(self.z - other.z)
    }

    pub fn distance(&self, other: &Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Playing,
    Spectating,
}

// Roster entry as reported by the world.
#[derive(Debug, Clone, Serialize)]
pub struct WorldPlayer {
    pub id: PlayerId,
    pub name: String,
    pub position: Vec3,
    pub state: PlayerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Lobby,
    Countdown,
    Playing,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Physics {
    pub gravity: f32,
    pub friction: f32,
    pub bounce: f32,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            gravity: -9.8,
            friction: 0.3,
            bounce: 0.5,
        }
    }
}

/// Partial physics update; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicsPatch {
    pub gravity: Option<f32>,
    pub friction: Option<f32>,
    pub bounce: Option<f32>,
}

impl PhysicsPatch {
    pub fn gravity(gravity: f32) -> Self {
        Self {
            gravity: Some(gravity),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Platform,
    Obstacle,
    Trigger,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityProperties {
    pub color: String,
    #[serde(skip_serializing_if = "is_false")]
    pub rotating: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub kinematic: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub falling: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_goal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Vec3>,
    // Owning round id, used to clean up round-scoped entities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

// Spawn request handed to the world; the world assigns the id.
#[derive(Debug, Clone)]
pub struct EntitySpec {
    pub kind: EntityKind,
    pub position: Vec3,
    pub size: Vec3,
    pub properties: EntityProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec3,
    pub size: Vec3,
    pub properties: EntityProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementKind {
    #[default]
    System,
    Challenge,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Announcement {
    pub id: u64,
    pub text: String,
    pub kind: AnnouncementKind,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellKind {
    SpeedBoost,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spell {
    pub id: u64,
    pub kind: SpellKind,
    pub duration_ms: u64,
    pub cast_at: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct StartOptions {
    pub time_limit_ms: u64,
    pub countdown_ms: u64,
}

/// How a round finished. `Other` carries game-specific tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundResult {
    Win,
    Timeout,
    Draw,
    Ended,
    Cancelled,
    Other(String),
}

impl RoundResult {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "win" => Self::Win,
            "timeout" => Self::Timeout,
            "draw" => Self::Draw,
            "ended" => Self::Ended,
            "cancelled" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Win => "win",
            Self::Timeout => "timeout",
            Self::Draw => "draw",
            Self::Ended => "ended",
            Self::Cancelled => "cancelled",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RoundResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RoundResult {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

// History record written once per completed round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub game_type: String,
    pub start_time: u64,
    pub result: RoundResult,
    pub winner_id: Option<PlayerId>,
    pub player_count: usize,
    pub scores: BTreeMap<PlayerId, i64>,
}
