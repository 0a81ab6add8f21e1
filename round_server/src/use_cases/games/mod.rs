// Game-type strategies and the registry that builds rounds from a type tag.

pub mod reach;
pub mod survival;

use crate::domain::ConfigurationError;
use crate::domain::tricks::CustomTrick;
use crate::use_cases::minigame::MiniGame;
use crate::use_cases::round::{Round, RoundConfig, RoundDeps};
use crate::use_cases::types::WinOutcome;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Game-type specific behavior injected into a round.
pub trait GameStrategy: Send {
    /// Installs the tricks a fresh round starts with.
    fn setup_default_tricks(&mut self, _round: &mut Round) {}

    /// Evaluated at the end of every running tick.
    fn check_win_condition(&mut self, _round: &mut Round) -> Option<WinOutcome> {
        None
    }

    /// Handles a `Custom` trick action. Returns false when the action is unknown.
    fn handle_custom_trick(&mut self, _trick: &CustomTrick, _round: &mut Round) -> bool {
        false
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameTypeInfo {
    pub tag: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub min_players: usize,
    pub has_timer: bool,
    pub default_time_limit_ms: u64,
    /// Range `[min, max)` a time limit is drawn from when none is configured.
    pub time_limit_range_ms: Option<(u64, u64)>,
}

pub type StrategyFactory = fn() -> Box<dyn GameStrategy>;

struct Registration {
    info: GameTypeInfo,
    factory: StrategyFactory,
}

#[derive(Default)]
pub struct GameRegistry {
    games: BTreeMap<&'static str, Registration>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin_games() -> Self {
        let mut registry = Self::new();
        registry.register(reach::info(), || Box::new(reach::ReachGoal::default()));
        registry.register(survival::info(), || Box::new(survival::Survival::default()));
        registry
    }

    /// Registers a game type, replacing any previous registration for its tag.
    pub fn register(&mut self, info: GameTypeInfo, factory: StrategyFactory) {
        self.games.insert(info.tag, Registration { info, factory });
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.games.contains_key(tag)
    }

    pub fn info(&self, tag: &str) -> Option<&GameTypeInfo> {
        self.games.get(tag).map(|registration| &registration.info)
    }

    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.games.keys().copied()
    }

    pub fn create_game(
        &self,
        tag: &str,
        deps: RoundDeps,
        config: RoundConfig,
    ) -> Result<MiniGame, ConfigurationError> {
        let registration = self
            .games
            .get(tag)
            .ok_or_else(|| ConfigurationError::UnknownGameType {
                game_type: tag.to_string(),
            })?;
        let info = &registration.info;
        let round = Round::new(info.tag, info.name, info.time_limit_range_ms, deps, config);
        info!(round_id = %round.id(), game_type = info.tag, "round created");
        Ok(MiniGame::new(round, (registration.factory)()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{NoRules, deps};

    #[test]
    fn unknown_type_names_the_tag() {
        let registry = GameRegistry::with_builtin_games();
        let (deps, _world, _history, _rx) = deps();

        let err = match registry.create_game("parkour", deps, RoundConfig::default()) {
            Err(err) => err,
            Ok(_) => panic!("parkour is not registered"),
        };

        assert_eq!(
            err,
            ConfigurationError::UnknownGameType {
                game_type: "parkour".into()
            }
        );
        assert!(err.to_string().contains("parkour"));
    }

    #[test]
    fn builtin_games_are_registered() {
        let registry = GameRegistry::with_builtin_games();
        assert_eq!(registry.tags().collect::<Vec<_>>(), vec!["reach", "survival"]);
        assert_eq!(registry.info("survival").map(|info| info.min_players), Some(2));
    }

    #[test]
    fn time_limits_fall_within_the_type_range() {
        let registry = GameRegistry::with_builtin_games();
        for seed in 0..50 {
            let (deps, _world, _history, _rx) = deps();
            let config = RoundConfig {
                seed: Some(seed),
                ..RoundConfig::default()
            };
            let game = registry
                .create_game("reach", deps, config)
                .expect("reach is registered");
            let limit = game.round().time_limit_ms();
            assert!((40_000..75_000).contains(&limit), "limit {limit}");
        }
    }

    #[test]
    fn configured_time_limit_wins_over_randomization() {
        let registry = GameRegistry::with_builtin_games();
        let (deps, _world, _history, _rx) = deps();
        let config = RoundConfig {
            time_limit_ms: Some(33_000),
            ..RoundConfig::default()
        };

        let game = registry
            .create_game("survival", deps, config)
            .expect("survival is registered");

        assert_eq!(game.round().time_limit_ms(), 33_000);
        assert_eq!(game.round().game_type(), "survival");
        assert!(game.id().starts_with("minigame-"));
    }

    #[test]
    fn custom_registration_without_range_uses_fallback() {
        let mut registry = GameRegistry::new();
        registry.register(
            GameTypeInfo {
                tag: "sandbox",
                name: "Sandbox",
                description: "No rules",
                min_players: 1,
                has_timer: true,
                default_time_limit_ms: 60_000,
                time_limit_range_ms: None,
            },
            || Box::new(NoRules),
        );
        let (deps, _world, _history, _rx) = deps();

        let game = registry
            .create_game("sandbox", deps, RoundConfig::default())
            .expect("sandbox is registered");

        assert!((45_000..75_000).contains(&game.round().time_limit_ms()));
    }
}
