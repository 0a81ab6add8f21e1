// In-memory authoritative world: roster, entities, physics and round phase.

use crate::domain::{
    Announcement, AnnouncementKind, Entity, EntityId, EntitySpec, GamePhase, Physics,
    PhysicsPatch, PlayerId, PlayerState, RoundResult, Spell, SpellKind, StartOptions, Vec3,
    WorldError, WorldPlayer, WorldPort,
};
use crate::interface_adapters::utils::ids::next_id;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

// Recent announcements kept for late-joining clients.
const ANNOUNCEMENT_BACKLOG: usize = 50;

/// Lifetime win/loss tally per player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlayerRecord {
    pub wins: u32,
    pub losses: u32,
    pub total_score: i64,
}

struct ActiveSpell {
    spell: Spell,
    remaining: Duration,
}

struct WorldInner {
    players: BTreeMap<PlayerId, WorldPlayer>,
    entities: BTreeMap<EntityId, Entity>,
    records: BTreeMap<PlayerId, PlayerRecord>,
    announcements: VecDeque<Announcement>,
    spells: Vec<ActiveSpell>,
    physics: Physics,
    phase: GamePhase,
    countdown_remaining: Duration,
    game_type: Option<String>,
    next_entity_id: EntityId,
    next_announcement_id: u64,
    next_spell_id: u64,
}

pub struct InMemoryWorld {
    respawn: Vec3,
    inner: Mutex<WorldInner>,
}

impl InMemoryWorld {
    pub fn new(respawn: Vec3) -> Self {
        Self {
            respawn,
            inner: Mutex::new(WorldInner {
                players: BTreeMap::new(),
                entities: BTreeMap::new(),
                records: BTreeMap::new(),
                announcements: VecDeque::new(),
                spells: Vec::new(),
                physics: Physics::default(),
                phase: GamePhase::Lobby,
                countdown_remaining: Duration::ZERO,
                game_type: None,
                next_entity_id: 0,
                next_announcement_id: 0,
                next_spell_id: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WorldInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn join_player(&self, name: &str, spectating: bool) -> PlayerId {
        let id = next_id();
        let state = if spectating {
            PlayerState::Spectating
        } else {
            PlayerState::Playing
        };
        self.lock().players.insert(
            id,
            WorldPlayer {
                id,
                name: name.to_string(),
                position: self.respawn,
                state,
            },
        );
        info!(player_id = id, name, spectating, "player joined");
        id
    }

    /// Moves a player; returns false for unknown ids.
    pub fn set_player_position(&self, id: PlayerId, position: Vec3) -> bool {
        match self.lock().players.get_mut(&id) {
            Some(player) => {
                player.position = position;
                true
            }
            None => false,
        }
    }

    pub fn records(&self) -> BTreeMap<PlayerId, PlayerRecord> {
        self.lock().records.clone()
    }

    pub fn entities(&self) -> Vec<Entity> {
        self.lock().entities.values().cloned().collect()
    }

    pub fn recent_announcements(&self) -> Vec<Announcement> {
        self.lock().announcements.iter().cloned().collect()
    }

    pub fn active_spells(&self) -> Vec<Spell> {
        self.lock().spells.iter().map(|active| active.spell.clone()).collect()
    }

    pub fn game_type(&self) -> Option<String> {
        self.lock().game_type.clone()
    }
}

impl WorldPort for InMemoryWorld {
    fn players(&self) -> Vec<WorldPlayer> {
        self.lock().players.values().cloned().collect()
    }

    fn player_name(&self, id: PlayerId) -> Option<String> {
        self.lock().players.get(&id).map(|player| player.name.clone())
    }

    fn player_position(&self, id: PlayerId) -> Option<Vec3> {
        self.lock().players.get(&id).map(|player| player.position)
    }

    fn teleport_player(&self, id: PlayerId, position: Vec3) {
        self.set_player_position(id, position);
    }

    fn respawn_point(&self) -> Vec3 {
        self.respawn
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
        inner.physics
    }

    fn phase(&self) -> GamePhase {
        self.lock().phase
    }

    fn start_game(&self, game_type: &str, options: StartOptions) {
        let mut inner = self.lock();
        inner.game_type = Some(game_type.to_string());
        inner.countdown_remaining = Duration::from_millis(options.countdown_ms);
        inner.phase = if options.countdown_ms == 0 {
            GamePhase::Playing
        } else {
            GamePhase::Countdown
        };
        debug!(
            game_type,
            countdown_ms = options.countdown_ms,
            time_limit_ms = options.time_limit_ms,
            "world entering round"
        );
    }

    fn end_game(&self, result: &RoundResult, winner_id: Option<PlayerId>) {
        let mut inner = self.lock();
        inner.phase = GamePhase::Ended;
        debug!(%result, ?winner_id, "world round ended");
    }

    fn enter_lobby(&self) {
        let mut inner = self.lock();
        inner.phase = GamePhase::Lobby;
        inner.game_type = None;
    }

    fn advance(&self, delta: Duration) {
        let mut inner = self.lock();
        if inner.phase == GamePhase::Countdown {
            inner.countdown_remaining = inner.countdown_remaining.saturating_sub(delta);
            if inner.countdown_remaining.is_zero() {
                inner.phase = GamePhase::Playing;
                debug!("countdown finished");
            }
        }
        inner.spells.retain_mut(|active| {
            active.remaining = active.remaining.saturating_sub(delta);
            !active.remaining.is_zero()
        });
    }

    fn spawn_entity(&self, spec: EntitySpec) -> Entity {
        let mut inner = self.lock();
        inner.next_entity_id += 1;
        let entity = Entity {
            id: inner.next_entity_id,
            kind: spec.kind,
            position: spec.position,
            size: spec.size,
            properties: spec.properties,
        };
        inner.entities.insert(entity.id, entity.clone());
        entity
    }

    fn destroy_entity(&self, id: EntityId) -> Result<(), WorldError> {
        self.lock()
            .entities
            .remove(&id)
            .map(|_| ())
            .ok_or(WorldError::EntityNotFound { id })
    }

    fn announce(&self, text: &str, kind: AnnouncementKind) -> Announcement {
        let mut inner = self.lock();
        inner.next_announcement_id += 1;
        let announcement = Announcement {
            id: inner.next_announcement_id,
            text: text.to_string(),
            kind,
            timestamp: epoch_millis(),
        };
        if inner.announcements.len() == ANNOUNCEMENT_BACKLOG {
            inner.announcements.pop_front();
        }
        inner.announcements.push_back(announcement.clone());
        announcement
    }

    fn cast_spell(&self, kind: SpellKind, duration_ms: u64) -> Spell {
        let mut inner = self.lock();
        inner.next_spell_id += 1;
        let spell = Spell {
            id: inner.next_spell_id,
            kind,
            duration_ms,
            cast_at: epoch_millis(),
        };
        inner.spells.push(ActiveSpell {
            spell: spell.clone(),
            remaining: Duration::from_millis(duration_ms),
        });
        spell
    }

    fn record_game_result(&self, player_id: PlayerId, won: bool, score: i64) {
        let mut inner = self.lock();
        let record = inner.records.entry(player_id).or_default();
        if won {
            record.wins += 1;
        } else {
            record.losses += 1;
        }
        record.total_score += score;
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntityKind, EntityProperties};

    fn world() -> InMemoryWorld {
        InMemoryWorld::new(Vec3::new(0.0, 2.0, 0.0))
    }

    #[test]
    fn countdown_elapses_into_playing() {
        let world = world();
        world.start_game(
            "reach",
            StartOptions {
                time_limit_ms: 60_000,
                countdown_ms: 3_000,
            },
        );
        assert_eq!(world.phase(), GamePhase::Countdown);

        world.advance(Duration::from_millis(2_999));
        assert_eq!(world.phase(), GamePhase::Countdown);
        world.advance(Duration::from_millis(1));
        assert_eq!(world.phase(), GamePhase::Playing);
        assert_eq!(world.game_type().as_deref(), Some("reach"));
    }

    #[test]
    fn destroying_unknown_entity_fails() {
        let world = world();
        let entity = world.spawn_entity(EntitySpec {
            kind: EntityKind::Obstacle,
            position: Vec3::default(),
            size: Vec3::new(1.0, 1.0, 1.0),
            properties: EntityProperties::default(),
        });

        assert_eq!(world.destroy_entity(entity.id), Ok(()));
        assert_eq!(
            world.destroy_entity(entity.id),
            Err(WorldError::EntityNotFound { id: entity.id })
        );
    }

    #[test]
    fn results_accumulate_per_player() {
        let world = world();
        let id = world.join_player("ada", false);

        world.record_game_result(id, true, 3);
        world.record_game_result(id, false, 1);

        assert_eq!(
            world.records().get(&id).copied(),
            Some(PlayerRecord {
                wins: 1,
                losses: 1,
                total_score: 4
            })
        );
    }

    #[test]
    fn spells_expire_after_duration() {
        let world = world();
        world.cast_spell(SpellKind::SpeedBoost, 1_000);
        assert_eq!(world.active_spells().len(), 1);

        world.advance(Duration::from_millis(1_000));

        assert!(world.active_spells().is_empty());
    }

    #[test]
    fn announcement_backlog_is_bounded() {
        let world = world();
        for i in 0..(ANNOUNCEMENT_BACKLOG + 5) {
            world.announce(&format!("msg {i}"), AnnouncementKind::System);
        }

        let recent = world.recent_announcements();
        assert_eq!(recent.len(), ANNOUNCEMENT_BACKLOG);
        assert_eq!(recent[0].text, "msg 5");
    }
}
