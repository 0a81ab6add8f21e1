// Recording fakes for exercising the round engine without a live world.

use crate::domain::{
    Announcement, AnnouncementKind, Entity, EntityId, EntitySpec, GamePhase, HistoryError, HistoryStore,
    Physics, PhysicsPatch, PlayerId, PlayerState, RoundRecord, RoundResult, Spell, SpellKind,
    StartOptions, Vec3, WorldError, WorldPlayer, WorldPort,
};
use crate::use_cases::games::GameStrategy;
use crate::use_cases::minigame::MiniGame;
use crate::use_cases::round::{Round, RoundConfig, RoundDeps};
use crate::use_cases::types::RoundEvent;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;

pub const RESPAWN: Vec3 = Vec3::new(0.0, 2.0, 0.0);

/// Mutating world calls, in the order the engine made them.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldCall {
    Teleport { player_id: PlayerId },
    StartGame { game_type: String, time_limit_ms: u64, countdown_ms: u64 },
    EndGame { result: RoundResult, winner_id: Option<PlayerId> },
    EnterLobby,
    SetPhysics,
    Spawn { id: EntityId },
    Destroy { id: EntityId },
    Announce { text: String },
    CastSpell { duration_ms: u64 },
    RecordResult { player_id: PlayerId, won: bool, score: i64 },
}

#[derive(Default)]
struct Inner {
    players: Vec<WorldPlayer>,
    phase: Option<GamePhase>,
    physics: Physics,
    next_id: u64,
    entities: Vec<EntityId>,
    failing: HashSet<EntityId>,
    destroyed: Vec<EntityId>,
    calls: Vec<WorldCall>,
}

#[derive(Default)]
pub struct RecordingWorld {
    inner: Mutex<Inner>,
}

impl RecordingWorld {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("recording world lock")
    }

    fn next_id(inner: &mut Inner) -> u64 {
        inner.next_id += 1;
        inner.next_id
    }

    pub fn add_player(&self, name: &str) -> PlayerId {
        self.push_player(name, PlayerState::Playing)
    }

    pub fn add_spectator(&self, name: &str) -> PlayerId {
        self.push_player(name, PlayerState::Spectating)
    }

    fn push_player(&self, name: &str, state: PlayerState) -> PlayerId {
        let mut inner = self.lock();
        let id = Self::next_id(&mut inner);
        inner.players.push(WorldPlayer {
            id,
            name: name.to_string(),
            position: Vec3::new(id as f32, 0.0, 0.0),
            state,
        });
        id
    }

    pub fn set_phase(&self, phase: GamePhase) {
        self.lock().phase = Some(phase);
    }

    pub fn set_position(&self, id: PlayerId, position: Vec3) {
        if let Some(player) = self.lock().players.iter_mut().find(|p| p.id == id) {
            player.position = position;
        }
    }

    /// Makes the next destroy of `id` fail as if the entity were already gone.
    pub fn fail_destroy(&self, id: EntityId) {
        self.lock().failing.insert(id);
    }

    pub fn physics_now(&self) -> Physics {
        self.lock().physics
    }

    pub fn calls(&self) -> Vec<WorldCall> {
        self.lock().calls.clone()
    }

    pub fn destroyed(&self) -> Vec<EntityId> {
        self.lock().destroyed.clone()
    }

    pub fn live_entities(&self) -> Vec<EntityId> {
        self.lock().entities.clone()
    }
}

impl WorldPort for RecordingWorld {
    fn players(&self) -> Vec<WorldPlayer> {
        self.lock().players.clone()
    }

    fn player_name(&self, id: PlayerId) -> Option<String> {
        self.lock()
            .players
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone())
    }

    fn player_position(&self, id: PlayerId) -> Option<Vec3> {
        self.lock().players.iter().find(|p| p.id == id).map(|p| p.position)
    }

    fn teleport_player(&self, id: PlayerId, position: Vec3) {
        let mut inner = self.lock();
        if let Some(player) = inner.players.iter_mut().find(|p| p.id == id) {
            player.position = position;
        }
        inner.calls.push(WorldCall::Teleport { player_id: id });
    }

    fn respawn_point(&self) -> Vec3 {
        RESPAWN
    }

    fn physics(&self) -> Physics {
        self.lock().physics
    }

    fn set_physics(&self, patch: PhysicsPatch) -> Physics {
        let mut inner = self.lock();
        if let Some(gravity) = patch.gravity {
            inner.physics.gravity = gravity;
        }
        if let Some(friction) = patch.friction {
            inner.physics.friction = friction;
        }
        if let Some(bounce) = patch.bounce {
            inner.physics.bounce = bounce;
        }
        inner.calls.push(WorldCall::SetPhysics);
        inner.physics
    }

    fn phase(&self) -> GamePhase {
        self.lock().phase.unwrap_or(GamePhase::Lobby)
    }

    fn start_game(&self, game_type: &str, options: StartOptions) {
        let mut inner = self.lock();
        inner.phase = Some(GamePhase::Countdown);
        inner.calls.push(WorldCall::StartGame {
            game_type: game_type.to_string(),
            time_limit_ms: options.time_limit_ms,
            countdown_ms: options.countdown_ms,
        });
    }

    fn end_game(&self, result: &RoundResult, winner_id: Option<PlayerId>) {
        let mut inner = self.lock();
        inner.phase = Some(GamePhase::Ended);
        inner.calls.push(WorldCall::EndGame {
            result: result.clone(),
            winner_id,
        });
    }

    fn enter_lobby(&self) {
        let mut inner = self.lock();
        inner.phase = Some(GamePhase::Lobby);
        inner.calls.push(WorldCall::EnterLobby);
    }

    fn advance(&self, _delta: Duration) {}

    fn spawn_entity(&self, spec: EntitySpec) -> Entity {
        let mut inner = self.lock();
        let id = Self::next_id(&mut inner);
        inner.entities.push(id);
        inner.calls.push(WorldCall::Spawn { id });
        Entity {
            id,
            kind: spec.kind,
            position: spec.position,
            size: spec.size,
            properties: spec.properties,
        }
    }

    fn destroy_entity(&self, id: EntityId) -> Result<(), WorldError> {
        let mut inner = self.lock();
        inner.calls.push(WorldCall::Destroy { id });
        if inner.failing.remove(&id) || !inner.entities.contains(&id) {
            return Err(WorldError::EntityNotFound { id });
        }
        inner.entities.retain(|entity| *entity != id);
        inner.destroyed.push(id);
        Ok(())
    }

    fn announce(&self, text: &str, kind: AnnouncementKind) -> Announcement {
        let mut inner = self.lock();
        let id = Self::next_id(&mut inner);
        inner.calls.push(WorldCall::Announce {
            text: text.to_string(),
        });
        Announcement {
            id,
            text: text.to_string(),
            kind,
            timestamp: 0,
        }
    }

    fn cast_spell(&self, kind: SpellKind, duration_ms: u64) -> Spell {
        let mut inner = self.lock();
        let id = Self::next_id(&mut inner);
        inner.calls.push(WorldCall::CastSpell { duration_ms });
        Spell {
            id,
            kind,
            duration_ms,
            cast_at: 0,
        }
    }

    fn record_game_result(&self, player_id: PlayerId, won: bool, score: i64) {
        self.lock().calls.push(WorldCall::RecordResult {
            player_id,
            won,
            score,
        });
    }
}

#[derive(Default)]
pub struct RecordingHistory {
    records: Mutex<Vec<RoundRecord>>,
    fail: Mutex<bool>,
}

impl RecordingHistory {
    pub fn records(&self) -> Vec<RoundRecord> {
        self.records.lock().expect("history lock").clone()
    }

    pub fn fail_saves(&self) {
        *self.fail.lock().expect("history lock") = true;
    }
}

impl HistoryStore for RecordingHistory {
    fn save(&self, record: RoundRecord) -> Result<(), HistoryError> {
        if *self.fail.lock().expect("history lock") {
            return Err(HistoryError::WriterStopped);
        }
        self.records.lock().expect("history lock").push(record);
        Ok(())
    }
}

/// Strategy with no tricks and no win condition of its own.
pub struct NoRules;

impl GameStrategy for NoRules {}

pub struct Harness {
    pub game: MiniGame,
    pub world: Arc<RecordingWorld>,
    pub history: Arc<RecordingHistory>,
    pub events: broadcast::Receiver<RoundEvent>,
    pub ids: Vec<PlayerId>,
}

pub fn deps() -> (RoundDeps, Arc<RecordingWorld>, Arc<RecordingHistory>, broadcast::Receiver<RoundEvent>) {
    let world = Arc::new(RecordingWorld::default());
    let history = Arc::new(RecordingHistory::default());
    let (events, rx) = broadcast::channel(1_024);
    let deps = RoundDeps {
        world: world.clone(),
        events,
        history: history.clone(),
    };
    (deps, world, history, rx)
}

pub fn harness(players: &[&str], strategy: Box<dyn GameStrategy>, config: RoundConfig) -> Harness {
    let (deps, world, history, events) = deps();
    let ids = players.iter().map(|name| world.add_player(name)).collect();
    let round = Round::new("test", "Test Game", None, deps, config);
    Harness {
        game: MiniGame::new(round, strategy),
        world,
        history,
        events,
        ids,
    }
}

pub fn drain(rx: &mut broadcast::Receiver<RoundEvent>) -> Vec<RoundEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
