// Round state and lifecycle: participants, scoring, termination and timers.
//
// `Round` holds everything a game-type strategy is allowed to touch. The
// per-tick driver lives in `MiniGame`, which pairs a round with its strategy.

use crate::domain::obstacles::{ObstaclePlacement, place_obstacle};
use crate::domain::timers::{TimerHandle, TimerQueue};
use crate::domain::tricks::{TrickAction, TrickId, TrickScheduler, TrickTrigger, TriggerState};
use crate::domain::tuning::arena::ArenaTuning;
use crate::domain::tuning::round::RoundTuning;
use crate::domain::{
    AnnouncementKind, Entity, EntityId, EntitySpec, GamePhase, HistoryStore, PhysicsPatch,
    PlayerId, PlayerState, RoundRecord, RoundResult, SpellKind, StartOptions, WorldPort,
};
use crate::use_cases::types::{Participant, RoundEnded, RoundEvent, RoundStatus, RoundSummary};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

const LOBBY_MESSAGE: &str = "Returning to lobby... Next game soon!";

/// Collaborators every round is wired to.
#[derive(Clone)]
pub struct RoundDeps {
    pub world: Arc<dyn WorldPort>,
    pub events: broadcast::Sender<RoundEvent>,
    pub history: Arc<dyn HistoryStore>,
}

/// Per-round settings, resolved once when the round is created.
#[derive(Debug, Clone, Default)]
pub struct RoundConfig {
    /// Fixed time limit; randomized per game type when `None`.
    pub time_limit_ms: Option<u64>,
    /// Countdown handed to the world; falls back to the tuning default.
    pub countdown_ms: Option<u64>,
    /// Seed for obstacle placement and time-limit randomization.
    pub seed: Option<u64>,
    pub tuning: RoundTuning,
    pub arena: ArenaTuning,
}

pub type EndCallback = Box<dyn FnOnce(&RoundSummary) + Send>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum RoundTimer {
    RestoreGravity { gravity: f32 },
    CleanupEntities,
    LobbyAnnouncement,
}

/// Picks a time limit uniformly from `[min, max)`.
pub fn randomize_time_limit<R: Rng + ?Sized>(range_ms: (u64, u64), rng: &mut R) -> u64 {
    let (min, max) = range_ms;
    if max <= min {
        return min;
    }
    rng.random_range(min..max)
}

pub struct Round {
    id: Arc<str>,
    game_type: String,
    game_name: String,
    time_limit_ms: u64,
    countdown_ms: u64,
    started_at: u64,
    started: bool,
    is_active: bool,

    participants: BTreeMap<PlayerId, Participant>,
    scores: BTreeMap<PlayerId, i64>,
    winners: Vec<PlayerId>,
    losers: Vec<PlayerId>,
    entities: Vec<EntityId>,
    tricks: TrickScheduler,

    // Round-local clock, advanced by the host's tick delta.
    now_ms: u64,
    run_origin_ms: Option<u64>,
    warnings_fired: Vec<bool>,
    timers: TimerQueue<RoundTimer>,
    gravity_restores: Vec<TimerHandle>,

    rng: StdRng,
    tuning: RoundTuning,
    arena: ArenaTuning,
    world: Arc<dyn WorldPort>,
    events: broadcast::Sender<RoundEvent>,
    history: Arc<dyn HistoryStore>,
    on_end: Option<EndCallback>,
}

impl Round {
    pub(crate) fn new(
        game_type: &str,
        game_name: &str,
        time_limit_range_ms: Option<(u64, u64)>,
        deps: RoundDeps,
        config: RoundConfig,
    ) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let range = time_limit_range_ms.unwrap_or(config.tuning.fallback_time_limit_range_ms);
        let time_limit_ms = config
            .time_limit_ms
            .unwrap_or_else(|| randomize_time_limit(range, &mut rng));
        let countdown_ms = config
            .countdown_ms
            .unwrap_or(config.tuning.default_countdown_ms);

        let uuid = Uuid::new_v4().simple().to_string();
        let id: Arc<str> = Arc::from(format!("minigame-{}", &uuid[..8]));

        Self {
            timers: TimerQueue::new(id.clone()),
            id,
            game_type: game_type.to_string(),
            game_name: game_name.to_string(),
            time_limit_ms,
            countdown_ms,
            started_at: 0,
            started: false,
            is_active: false,
            participants: BTreeMap::new(),
            scores: BTreeMap::new(),
            winners: Vec::new(),
            losers: Vec::new(),
            entities: Vec::new(),
            tricks: TrickScheduler::new(),
            now_ms: 0,
            run_origin_ms: None,
            warnings_fired: vec![false; config.tuning.time_warnings.len()],
            gravity_restores: Vec::new(),
            rng,
            tuning: config.tuning,
            arena: config.arena,
            world: deps.world,
            events: deps.events,
            history: deps.history,
            on_end: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn game_type(&self) -> &str {
        &self.game_type
    }

    pub fn time_limit_ms(&self) -> u64 {
        self.time_limit_ms
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn participants(&self) -> &BTreeMap<PlayerId, Participant> {
        &self.participants
    }

    pub fn scores(&self) -> &BTreeMap<PlayerId, i64> {
        &self.scores
    }

    pub fn winners(&self) -> &[PlayerId] {
        &self.winners
    }

    pub fn losers(&self) -> &[PlayerId] {
        &self.losers
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn tricks(&self) -> &TrickScheduler {
        &self.tricks
    }

    pub fn world(&self) -> &Arc<dyn WorldPort> {
        &self.world
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn alive_participants(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.participants
            .iter()
            .filter(|(_, participant)| participant.alive)
            .map(|(id, _)| *id)
    }

    /// Elapsed running time; zero until the countdown has finished.
    pub fn elapsed_ms(&self) -> u64 {
        self.run_origin_ms
            .map(|origin| self.now_ms.saturating_sub(origin))
            .unwrap_or(0)
    }

    pub fn remaining_ms(&self) -> u64 {
        if !self.is_active {
            return 0;
        }
        self.time_limit_ms.saturating_sub(self.elapsed_ms())
    }

    /// True once the round has ended and every deferred task has run.
    pub fn is_inert(&self) -> bool {
        self.started && !self.is_active && self.timers.is_empty()
    }

    pub(crate) fn set_on_end(&mut self, callback: EndCallback) {
        self.on_end = Some(callback);
    }

    /// Snapshots participants and moves the world into its countdown.
    pub(crate) fn begin(&mut self) -> bool {
        if self.started {
            warn!(round_id = %self.id, "round already started");
            return false;
        }
        self.started = true;
        self.is_active = true;
        self.started_at = current_epoch_millis();

        let respawn = self.world.respawn_point();
        for player in self.world.players() {
            if player.state == PlayerState::Spectating {
                continue;
            }
            self.participants.insert(
                player.id,
                Participant {
                    score: 0,
                    alive: true,
                    position: player.position,
                },
            );
            self.world.teleport_player(player.id, respawn);
        }
        self.broadcast(RoundEvent::PlayersTeleported { position: respawn });

        self.announce("GET READY!", AnnouncementKind::System);
        let starting = format!("{} starting!", self.game_name);
        self.announce(&starting, AnnouncementKind::System);

        self.world.start_game(
            &self.game_type,
            StartOptions {
                time_limit_ms: self.time_limit_ms,
                countdown_ms: self.countdown_ms,
            },
        );
        true
    }

    pub(crate) fn advance_clock(&mut self, delta: Duration) {
        self.now_ms = self.now_ms.saturating_add(delta.as_millis() as u64);
    }

    /// Returns elapsed running time, anchoring the origin on the first call.
    pub(crate) fn mark_running(&mut self) -> u64 {
        if self.run_origin_ms.is_none() {
            self.run_origin_ms = Some(self.now_ms);
            debug!(round_id = %self.id, "countdown finished; round clock started");
        }
        self.elapsed_ms()
    }

    pub(crate) fn all_eliminated(&self) -> bool {
        !self.participants.is_empty() && self.participants.values().all(|p| !p.alive)
    }

    pub fn add_trick(&mut self, trigger: TrickTrigger, action: TrickAction) -> TrickId {
        let id = self.tricks.add_trick(trigger, action);
        debug!(round_id = %self.id, trick_id = id, "trick added");
        id
    }

    pub(crate) fn poll_trick(&mut self, index: usize, elapsed_ms: u64) -> Option<(TrickId, TrickAction)> {
        let state = TriggerState {
            scores: &self.scores,
            deaths: self.losers.len(),
        };
        self.tricks.poll(index, elapsed_ms, &state)
    }

    /// Adds points to a participant; ids outside the roster are ignored.
    pub fn add_score(&mut self, player_id: PlayerId, points: i64) {
        if !self.is_active {
            return;
        }
        let Some(participant) = self.participants.get_mut(&player_id) else {
            return;
        };
        participant.score += points;
        *self.scores.entry(player_id).or_insert(0) += points;
    }

    pub fn eliminate_player(&mut self, player_id: PlayerId) {
        if !self.is_active {
            return;
        }
        let Some(participant) = self.participants.get_mut(&player_id) else {
            return;
        };
        if !participant.alive {
            return;
        }
        participant.alive = false;
        self.losers.push(player_id);
        info!(round_id = %self.id, player_id, "player eliminated");

        let alive: Vec<PlayerId> = self.alive_participants().collect();
        if alive.len() == 1 && self.participants.len() > 1 {
            self.end(RoundResult::Win, Some(alive[0]));
        }
    }

    pub(crate) fn announce_time_warnings(&mut self, elapsed_ms: u64) {
        let remaining = self.time_limit_ms.saturating_sub(elapsed_ms);
        for index in 0..self.tuning.time_warnings.len() {
            let warning = self.tuning.time_warnings[index];
            if remaining <= warning.remaining_ms && !self.warnings_fired[index] {
                self.warnings_fired[index] = true;
                self.announce(warning.message, AnnouncementKind::System);
            }
        }
    }

    /// Terminates the round. Only the first call has any effect.
    pub fn end(&mut self, result: RoundResult, winner_id: Option<PlayerId>) -> Option<RoundSummary> {
        if !self.is_active {
            return None;
        }
        self.is_active = false;

        let winner_id = winner_id.filter(|id| {
            let known = self.participants.contains_key(id);
            if !known {
                warn!(round_id = %self.id, winner_id = id, "ignoring winner outside the roster");
            }
            known
        });
        info!(round_id = %self.id, %result, ?winner_id, "round ended");

        if let Some(id) = winner_id {
            self.winners.push(id);
        }
        for handle in self.gravity_restores.drain(..) {
            self.timers.cancel(&handle);
        }

        let message = self.result_message(&result, winner_id);
        self.announce(&message, AnnouncementKind::Challenge);

        self.world.end_game(&result, winner_id);
        if let Some(id) = winner_id {
            self.world.record_game_result(id, true, self.final_score(id));
        }
        for id in self.participants.keys().copied() {
            if Some(id) != winner_id {
                self.world.record_game_result(id, false, self.final_score(id));
            }
        }

        let record = RoundRecord {
            id: self.id.to_string(),
            game_type: self.game_type.clone(),
            start_time: self.started_at,
            result: result.clone(),
            winner_id,
            player_count: self.participants.len(),
            scores: self.scores.clone(),
        };
        if let Err(error) = self.history.save(record) {
            warn!(round_id = %self.id, %error, "failed to persist round history");
        }

        self.broadcast(RoundEvent::MinigameEnded(RoundEnded {
            id: self.id.to_string(),
            game_type: self.game_type.clone(),
            result: result.clone(),
            winners: self.winners.clone(),
            losers: self.losers.clone(),
            scores: self.scores.clone(),
        }));

        self.timers.schedule(
            self.now_ms + self.tuning.cleanup_delay_ms,
            RoundTimer::CleanupEntities,
        );
        self.timers.schedule(
            self.now_ms + self.tuning.lobby_announcement_delay_ms,
            RoundTimer::LobbyAnnouncement,
        );

        let summary = RoundSummary {
            id: self.id.to_string(),
            result,
            winners: self.winners.clone(),
            scores: self.scores.clone(),
        };
        if let Some(callback) = self.on_end.take() {
            callback(&summary);
        }
        Some(summary)
    }

    fn final_score(&self, player_id: PlayerId) -> i64 {
        self.scores.get(&player_id).copied().unwrap_or(0)
    }

    fn result_message(&self, result: &RoundResult, winner_id: Option<PlayerId>) -> String {
        match (result, winner_id) {
            (RoundResult::Win, Some(id)) => {
                let name = self.world.player_name(id).unwrap_or_else(|| id.to_string());
                format!("WINNER: {name}!")
            }
            (RoundResult::Win, None) | (RoundResult::Ended, _) => "Game Over!".to_string(),
            (RoundResult::Timeout, _) => "TIME UP!".to_string(),
            (RoundResult::Draw, _) => "DRAW!".to_string(),
            (RoundResult::Cancelled, _) => "Game cancelled".to_string(),
            (RoundResult::Other(tag), _) => format!("Game Over: {tag}"),
        }
    }

    pub fn announce(&mut self, text: &str, kind: AnnouncementKind) {
        let announcement = self.world.announce(text, kind);
        self.broadcast(RoundEvent::Announcement(announcement));
    }

    /// Spawns a round-owned entity; it is destroyed during deferred cleanup.
    pub fn spawn_entity(&mut self, mut spec: EntitySpec) -> Entity {
        spec.properties.game_id = Some(self.id.to_string());
        let entity = self.world.spawn_entity(spec);
        self.entities.push(entity.id);
        self.broadcast(RoundEvent::EntitySpawned(entity.clone()));
        entity
    }

    pub fn spawn_random_obstacles(&mut self, count: usize) -> Vec<ObstaclePlacement> {
        let respawn = self.world.respawn_point();
        let mut placements = Vec::with_capacity(count);
        for _ in 0..count {
            let placement = place_obstacle(&mut self.rng, respawn, &self.arena);
            self.spawn_entity(placement.spec.clone());
            placements.push(placement);
        }
        info!(round_id = %self.id, count, "spawned random obstacles");
        placements
    }

    pub(crate) fn flip_gravity(&mut self, gravity: f32, duration_ms: u64, message: Option<&str>) {
        let original = self.world.physics().gravity;
        let physics = self.world.set_physics(PhysicsPatch::gravity(gravity));
        self.announce(
            message.unwrap_or(crate::domain::tricks::DEFAULT_GRAVITY_MESSAGE),
            AnnouncementKind::System,
        );
        self.broadcast(RoundEvent::PhysicsChanged(physics));

        let handle = self.timers.schedule(
            self.now_ms + duration_ms,
            RoundTimer::RestoreGravity { gravity: original },
        );
        self.gravity_restores.push(handle);
    }

    pub(crate) fn speed_burst(&mut self, duration_ms: u64) {
        let spell = self.world.cast_spell(SpellKind::SpeedBoost, duration_ms);
        self.broadcast(RoundEvent::SpellCast(spell));
        self.announce("SPEED SURGE!", AnnouncementKind::System);
    }

    pub(crate) fn run_due_timers(&mut self) {
        for task in self.timers.take_due(self.now_ms) {
            match task {
                RoundTimer::RestoreGravity { gravity } => {
                    let physics = self.world.set_physics(PhysicsPatch::gravity(gravity));
                    self.broadcast(RoundEvent::PhysicsChanged(physics));
                    debug!(round_id = %self.id, gravity, "gravity restored");
                }
                RoundTimer::CleanupEntities => self.cleanup_entities(),
                RoundTimer::LobbyAnnouncement => {
                    if matches!(self.world.phase(), GamePhase::Ended | GamePhase::Lobby) {
                        self.announce(LOBBY_MESSAGE, AnnouncementKind::System);
                    }
                }
            }
        }
    }

    fn cleanup_entities(&mut self) {
        if self.entities.is_empty() {
            return;
        }
        let entities = std::mem::take(&mut self.entities);
        let count = entities.len();
        for id in entities {
            match self.world.destroy_entity(id) {
                Ok(()) => self.broadcast(RoundEvent::EntityDestroyed { id }),
                // Entity may already be gone.
                Err(error) => debug!(round_id = %self.id, %error, "skipping entity cleanup"),
            }
        }
        info!(round_id = %self.id, count, "cleaned up round entities");
    }

    pub fn status(&self) -> RoundStatus {
        RoundStatus {
            id: self.id.to_string(),
            game_type: self.game_type.clone(),
            is_active: self.is_active,
            time_remaining_ms: self.remaining_ms(),
            participants: self.participants.clone(),
            scores: self.scores.clone(),
            winners: self.winners.clone(),
            losers: self.losers.clone(),
            trick_count: self.tricks.len(),
            tricks_fired: self.tricks.fired_count(),
        }
    }

    fn broadcast(&self, event: RoundEvent) {
        // No subscribers is fine; events are fire-and-forget.
        let _ = self.events.send(event);
    }
}

fn current_epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
