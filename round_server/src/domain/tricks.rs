// Scripted round rules ("tricks"): trigger evaluation and bookkeeping.
//
// The scheduler only decides *when* a trick fires; executing the action is the
// round engine's job, since actions reach into the world and the strategy.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::domain::entities::{AnnouncementKind, PlayerId};

pub type TrickId = u32;

pub const DEFAULT_ANNOUNCE_TEXT: &str = "Something stirs...";
pub const DEFAULT_GRAVITY_MESSAGE: &str = "GRAVITY SHIFTS!";
pub const DEFAULT_LOW_GRAVITY: f32 = -3.0;
pub const DEFAULT_GRAVITY_DURATION_MS: u64 = 10_000;
pub const DEFAULT_SPEED_BURST_MS: u64 = 8_000;

/// Whose score a `Score` trigger watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTarget {
    Any,
    Player(PlayerId),
}

impl Serialize for ScoreTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Any => serializer.serialize_str("any"),
            Self::Player(id) => serializer.serialize_u64(*id),
        }
    }
}

impl<'de> Deserialize<'de> for ScoreTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(PlayerId),
            Tag(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Id(id) => Ok(Self::Player(id)),
            Raw::Tag(tag) if tag == "any" => Ok(Self::Any),
            Raw::Tag(tag) => tag
                .parse::<PlayerId>()
                .map(Self::Player)
                .map_err(|_| serde::de::Error::custom(format!("invalid score target: {tag}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrickTrigger {
    Time { at_ms: u64 },
    Score { player: ScoreTarget, value: i64 },
    Deaths { count: usize },
    Interval { every_ms: u64 },
}

impl TrickTrigger {
    pub fn is_interval(&self) -> bool {
        matches!(self, Self::Interval { .. })
    }
}

/// Game-type specific action routed to the strategy's handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTrick {
    pub name: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrickAction {
    Announce {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        kind: AnnouncementKind,
    },
    FlipGravity {
        #[serde(default = "default_low_gravity")]
        gravity: f32,
        #[serde(default = "default_gravity_duration")]
        duration_ms: u64,
        #[serde(default)]
        message: Option<String>,
    },
    SpeedBurst {
        #[serde(default = "default_speed_burst")]
        duration_ms: u64,
    },
    Custom(CustomTrick),
}

fn default_low_gravity() -> f32 {
    DEFAULT_LOW_GRAVITY
}

fn default_gravity_duration() -> u64 {
    DEFAULT_GRAVITY_DURATION_MS
}

fn default_speed_burst() -> u64 {
    DEFAULT_SPEED_BURST_MS
}

impl TrickAction {
    pub fn announce(text: impl Into<String>) -> Self {
        Self::Announce {
            text: Some(text.into()),
            kind: AnnouncementKind::System,
        }
    }

    pub fn flip_gravity() -> Self {
        Self::FlipGravity {
            gravity: DEFAULT_LOW_GRAVITY,
            duration_ms: DEFAULT_GRAVITY_DURATION_MS,
            message: None,
        }
    }

    pub fn speed_burst() -> Self {
        Self::SpeedBurst {
            duration_ms: DEFAULT_SPEED_BURST_MS,
        }
    }

    pub fn custom(name: impl Into<String>, params: serde_json::Value) -> Self {
        Self::Custom(CustomTrick {
            name: name.into(),
            params,
        })
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::Announce { .. } => "announce",
            Self::FlipGravity { .. } => "flip_gravity",
            Self::SpeedBurst { .. } => "speed_burst",
            Self::Custom(custom) => &custom.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trick {
    pub id: TrickId,
    pub trigger: TrickTrigger,
    pub action: TrickAction,
    pub fired: bool,
    pub last_fired_ms: u64,
}

// Round state a trigger may look at.
pub struct TriggerState<'a> {
    pub scores: &'a BTreeMap<PlayerId, i64>,
    pub deaths: usize,
}

#[derive(Debug, Default)]
pub struct TrickScheduler {
    tricks: Vec<Trick>,
    next_id: TrickId,
}

impl TrickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_trick(&mut self, trigger: TrickTrigger, action: TrickAction) -> TrickId {
        self.next_id += 1;
        let id = self.next_id;
        self.tricks.push(Trick {
            id,
            trigger,
            action,
            fired: false,
            last_fired_ms: 0,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.tricks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tricks.is_empty()
    }

    pub fn fired_count(&self) -> usize {
        self.tricks.iter().filter(|trick| trick.fired).count()
    }

    pub fn get(&self, id: TrickId) -> Option<&Trick> {
        self.tricks.iter().find(|trick| trick.id == id)
    }

    /// Evaluates the trick at `index` and arms it if its trigger holds.
    ///
    /// Returns the action to execute. Callers walk indices in insertion order
    /// so each trick sees mutations made by the ones before it.
    pub fn poll(
        &mut self,
        index: usize,
        elapsed_ms: u64,
        state: &TriggerState<'_>,
    ) -> Option<(TrickId, TrickAction)> {
        let trick = self.tricks.get_mut(index)?;
        if trick.fired && !trick.trigger.is_interval() {
            return None;
        }
        if !should_fire(trick, elapsed_ms, state) {
            return None;
        }
        trick.fired = true;
        trick.last_fired_ms = elapsed_ms;
        Some((trick.id, trick.action.clone()))
    }
}

fn should_fire(trick: &Trick, elapsed_ms: u64, state: &TriggerState<'_>) -> bool {
    match &trick.trigger {
        TrickTrigger::Time { at_ms } => elapsed_ms >= *at_ms,
        TrickTrigger::Score { player, value } => match player {
            ScoreTarget::Any => state.scores.values().any(|score| score >= value),
            ScoreTarget::Player(id) => state.scores.get(id).copied().unwrap_or(0) >= *value,
        },
        TrickTrigger::Deaths { count } => state.deaths >= *count,
        TrickTrigger::Interval { every_ms } => {
            elapsed_ms.saturating_sub(trick.last_fired_ms) >= *every_ms
        }
    }
}
