// Arena orchestration: owns the active round and drives it on a fixed tick.

use crate::domain::tricks::{TrickAction, TrickId, TrickTrigger};
use crate::domain::{
    ConfigurationError, GamePhase, HistoryStore, PlayerId, PlayerState, RoundResult, WorldPort,
};
use crate::use_cases::games::GameRegistry;
use crate::use_cases::minigame::MiniGame;
use crate::use_cases::round::{RoundConfig, RoundDeps};
use crate::use_cases::types::{RoundEvent, RoundStatus, RoundSummary};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Shared configuration for the arena host.
#[derive(Debug, Clone)]
pub struct ArenaSettings {
    /// Fixed tick interval for the round loop.
    pub tick_interval: Duration,
    /// Lobby idle time before a round is started automatically (`None` disables).
    pub auto_start_delay: Option<Duration>,
    /// Game type used for automatic starts.
    pub default_game_type: String,
    /// Base settings applied to every round.
    pub round: RoundConfig,
}

/// Errors returned by arena operations.
#[derive(Debug)]
pub enum ArenaError {
    /// The requested game type is not registered.
    Configuration(ConfigurationError),
    /// A round is already running.
    RoundInProgress,
    /// There is no round to act on.
    NoActiveRound,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(err) => write!(f, "{err}"),
            Self::RoundInProgress => f.write_str("a round is already in progress"),
            Self::NoActiveRound => f.write_str("no active round"),
        }
    }
}

impl std::error::Error for ArenaError {}

impl From<ConfigurationError> for ArenaError {
    fn from(err: ConfigurationError) -> Self {
        Self::Configuration(err)
    }
}

#[derive(Default)]
struct ArenaState {
    /// Round currently accepting ticks and commands.
    active: Option<MiniGame>,
    /// Ended rounds still running their deferred cleanup.
    retiring: Vec<MiniGame>,
    /// Time spent idle in the lobby.
    idle: Duration,
}

pub struct Arena {
    settings: ArenaSettings,
    registry: GameRegistry,
    world: Arc<dyn WorldPort>,
    history: Arc<dyn HistoryStore>,
    events: broadcast::Sender<RoundEvent>,
    state: Mutex<ArenaState>,
    last_summary: Arc<watch::Sender<Option<RoundSummary>>>,
}

impl Arena {
    pub fn new(
        settings: ArenaSettings,
        registry: GameRegistry,
        world: Arc<dyn WorldPort>,
        history: Arc<dyn HistoryStore>,
        events: broadcast::Sender<RoundEvent>,
    ) -> Self {
        let (last_summary, _rx) = watch::channel(None);
        Self {
            settings,
            registry,
            world,
            history,
            events,
            state: Mutex::new(ArenaState::default()),
            last_summary: Arc::new(last_summary),
        }
    }

    pub fn world(&self) -> &Arc<dyn WorldPort> {
        &self.world
    }

    pub fn registry(&self) -> &GameRegistry {
        &self.registry
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.events.subscribe()
    }

    /// Watch receiver that sees every completed round summary.
    pub fn summaries(&self) -> watch::Receiver<Option<RoundSummary>> {
        self.last_summary.subscribe()
    }

    /// Creates and starts a round of `game_type`.
    pub async fn start_round(
        &self,
        game_type: &str,
        time_limit_ms: Option<u64>,
    ) -> Result<RoundStatus, ArenaError> {
        let mut state = self.state.lock().await;
        self.start_round_locked(&mut state, game_type, time_limit_ms)
    }

    fn start_round_locked(
        &self,
        state: &mut ArenaState,
        game_type: &str,
        time_limit_ms: Option<u64>,
    ) -> Result<RoundStatus, ArenaError> {
        retire_if_ended(state);
        if state.active.is_some() {
            return Err(ArenaError::RoundInProgress);
        }

        let deps = RoundDeps {
            world: self.world.clone(),
            events: self.events.clone(),
            history: self.history.clone(),
        };
        let mut config = self.settings.round.clone();
        if time_limit_ms.is_some() {
            config.time_limit_ms = time_limit_ms;
        }
        let mut game = self.registry.create_game(game_type, deps, config)?;

        let summaries = self.last_summary.clone();
        game.on_end(move |summary| {
            summaries.send_replace(Some(summary.clone()));
        });
        game.start();

        let status = game.status();
        state.active = Some(game);
        state.idle = Duration::ZERO;
        Ok(status)
    }

    /// Ends the active round with `result`.
    pub async fn end_round(&self, result: RoundResult) -> Result<RoundSummary, ArenaError> {
        let mut state = self.state.lock().await;
        let mut game = state.active.take().ok_or(ArenaError::NoActiveRound)?;
        let summary = game.end(result, None);
        state.retiring.push(game);
        summary.ok_or(ArenaError::NoActiveRound)
    }

    pub async fn status(&self) -> Option<RoundStatus> {
        let state = self.state.lock().await;
        state.active.as_ref().map(MiniGame::status)
    }

    pub fn last_summary(&self) -> Option<RoundSummary> {
        self.last_summary.borrow().clone()
    }

    pub async fn add_trick(
        &self,
        trigger: TrickTrigger,
        action: TrickAction,
    ) -> Result<TrickId, ArenaError> {
        let mut state = self.state.lock().await;
        let game = state.active.as_mut().ok_or(ArenaError::NoActiveRound)?;
        Ok(game.round_mut().add_trick(trigger, action))
    }

    pub async fn add_score(&self, player_id: PlayerId, points: i64) -> Result<(), ArenaError> {
        let mut state = self.state.lock().await;
        let game = state.active.as_mut().ok_or(ArenaError::NoActiveRound)?;
        game.round_mut().add_score(player_id, points);
        Ok(())
    }

    pub async fn eliminate_player(&self, player_id: PlayerId) -> Result<(), ArenaError> {
        let mut state = self.state.lock().await;
        let game = state.active.as_mut().ok_or(ArenaError::NoActiveRound)?;
        game.round_mut().eliminate_player(player_id);
        retire_if_ended(&mut state);
        Ok(())
    }

    /// Advances the world and every live round by one tick.
    pub async fn tick(&self, delta: Duration) {
        let mut state = self.state.lock().await;
        self.world.advance(delta);

        let previously_retiring = state.retiring.len();
        if let Some(game) = state.active.as_mut() {
            game.update(delta);
        }
        retire_if_ended(&mut state);

        // Rounds retired during this tick were already updated above.
        for game in state.retiring.iter_mut().take(previously_retiring) {
            game.update(delta);
        }
        let had_retiring = !state.retiring.is_empty();
        state.retiring.retain(|game| {
            let inert = game.is_inert();
            if inert {
                debug!(round_id = %game.id(), "round retired");
            }
            !inert
        });
        if had_retiring && state.retiring.is_empty() && state.active.is_none() {
            self.world.enter_lobby();
            info!("arena returned to lobby");
        }

        self.maybe_auto_start(&mut state, delta);
    }

    fn maybe_auto_start(&self, state: &mut ArenaState, delta: Duration) {
        let Some(delay) = self.settings.auto_start_delay else {
            return;
        };
        if state.active.is_some() || self.world.phase() != GamePhase::Lobby {
            state.idle = Duration::ZERO;
            return;
        }
        state.idle += delta;
        if state.idle < delay {
            return;
        }

        let game_type = self.settings.default_game_type.as_str();
        let min_players = self
            .registry
            .info(game_type)
            .map(|info| info.min_players)
            .unwrap_or(1);
        let ready = self
            .world
            .players()
            .iter()
            .filter(|player| player.state == PlayerState::Playing)
            .count();
        if ready < min_players {
            return;
        }

        match self.start_round_locked(state, game_type, None) {
            Ok(status) => {
                info!(round_id = %status.id, game_type, players = ready, "auto-started round")
            }
            Err(err) => {
                warn!(game_type, error = %err, "auto-start failed");
                state.idle = Duration::ZERO;
            }
        }
    }

    /// Runs `tick` on a fixed interval until `shutdown` fires.
    pub fn spawn_tick_loop(self: Arc<Self>, shutdown: Arc<Notify>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let tick_interval = self.settings.tick_interval;
            let mut interval = tokio::time::interval(tick_interval);
            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        info!("tick loop stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        self.tick(tick_interval).await;
                    }
                }
            }
        })
    }
}

fn retire_if_ended(state: &mut ArenaState) {
    if let Some(game) = state.active.take_if(|game| !game.is_active()) {
        info!(round_id = %game.id(), "round retiring");
        state.retiring.push(game);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{RecordingHistory, RecordingWorld, WorldCall};

    fn arena(
        auto_start_delay: Option<Duration>,
    ) -> (Arc<Arena>, Arc<RecordingWorld>, Arc<RecordingHistory>) {
        let world = Arc::new(RecordingWorld::default());
        let history = Arc::new(RecordingHistory::default());
        let (events, _rx) = broadcast::channel(256);
        let settings = ArenaSettings {
            tick_interval: Duration::from_millis(50),
            auto_start_delay,
            default_game_type: "reach".to_string(),
            round: RoundConfig {
                time_limit_ms: Some(60_000),
                countdown_ms: Some(0),
                seed: Some(2),
                ..RoundConfig::default()
            },
        };
        let arena = Arena::new(
            settings,
            GameRegistry::with_builtin_games(),
            world.clone(),
            history.clone(),
            events,
        );
        (Arc::new(arena), world, history)
    }

    #[tokio::test]
    async fn second_start_reports_round_in_progress() {
        let (arena, world, _history) = arena(None);
        world.add_player("a");

        let status = arena.start_round("reach", None).await.expect("first start");
        assert!(status.is_active);

        let err = arena.start_round("reach", None).await.expect_err("busy");
        assert!(matches!(err, ArenaError::RoundInProgress));
    }

    #[tokio::test]
    async fn unknown_type_is_a_configuration_error() {
        let (arena, _world, _history) = arena(None);

        let err = arena.start_round("parkour", None).await.expect_err("unknown");

        assert!(matches!(err, ArenaError::Configuration(_)));
        assert!(arena.status().await.is_none());
    }

    #[tokio::test]
    async fn ended_round_retires_then_world_returns_to_lobby() {
        let (arena, world, history) = arena(None);
        world.add_player("a");
        arena.start_round("reach", None).await.expect("start");

        let summary = arena.end_round(RoundResult::Cancelled).await.expect("end");
        assert_eq!(summary.result, RoundResult::Cancelled);
        assert_eq!(arena.last_summary(), Some(summary));
        assert!(arena.status().await.is_none());
        assert_eq!(history.records().len(), 1);

        arena.tick(Duration::from_millis(4_000)).await;
        assert!(!world.calls().contains(&WorldCall::EnterLobby));
        arena.tick(Duration::from_millis(1_000)).await;

        assert!(world.calls().contains(&WorldCall::EnterLobby));
        assert!(world.live_entities().is_empty());
    }

    #[tokio::test]
    async fn end_without_round_fails() {
        let (arena, _world, _history) = arena(None);
        let err = arena.end_round(RoundResult::Cancelled).await.expect_err("idle");
        assert!(matches!(err, ArenaError::NoActiveRound));
        assert!(matches!(
            arena.add_score(1, 1).await,
            Err(ArenaError::NoActiveRound)
        ));
    }

    #[tokio::test]
    async fn auto_start_waits_for_delay_and_players() {
        let (arena, world, _history) = arena(Some(Duration::from_millis(100)));

        arena.tick(Duration::from_millis(100)).await;
        assert!(arena.status().await.is_none(), "no players yet");

        world.add_spectator("watcher");
        arena.tick(Duration::from_millis(100)).await;
        assert!(arena.status().await.is_none(), "spectators do not count");

        world.add_player("a");
        arena.tick(Duration::from_millis(50)).await;
        let status = arena.status().await.expect("auto-started");
        assert_eq!(status.game_type, "reach");
        assert_eq!(status.participants.len(), 1);
    }

    #[tokio::test]
    async fn elimination_win_moves_round_out_of_active_slot() {
        let (arena, world, _history) = arena(None);
        let a = world.add_player("a");
        let b = world.add_player("b");
        arena.start_round("survival", None).await.expect("start");

        arena.eliminate_player(b).await.expect("eliminate");

        assert!(arena.status().await.is_none());
        let summary = arena.last_summary().expect("summary");
        assert_eq!(summary.winners, vec![a]);
        assert!(arena.start_round("reach", None).await.is_ok());
    }

    #[tokio::test]
    async fn tick_loop_drives_rounds_until_shutdown() {
        let (arena, world, history) = arena(None);
        world.add_player("a");
        arena.start_round("reach", Some(100)).await.expect("start");
        world.set_phase(GamePhase::Playing);

        let shutdown = Arc::new(Notify::new());
        let handle = arena.clone().spawn_tick_loop(shutdown.clone());
        let mut summaries = arena.summaries();
        tokio::time::timeout(Duration::from_secs(5), summaries.wait_for(Option::is_some))
            .await
            .expect("round finished in time")
            .expect("watch open");

        shutdown.notify_one();
        handle.await.expect("tick loop exits");
        assert_eq!(history.records()[0].result, RoundResult::Timeout);
    }
}
