use crate::domain::Vec3;
use crate::use_cases::{ArenaSettings, GameRegistry, RoundConfig};
use std::{env, fmt, path::PathBuf, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub const EVENT_BROADCAST_CAPACITY: usize = 256;
pub const HISTORY_CHANNEL_CAPACITY: usize = 64;
// Shortest time limit an operator may configure.
pub const MIN_GAME_DURATION_MS: u64 = 30_000;
pub const RESPAWN_POINT: Vec3 = Vec3::new(0.0, 2.0, 0.0);

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_TICK_RATE_HZ: u32 = 20;
const DEFAULT_COUNTDOWN_MS: u64 = 5_000;
const DEFAULT_AUTO_START_DELAY_MS: u64 = 20_000;
const DEFAULT_GAME_TYPE: &str = "reach";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub tick_rate_hz: u32,
    pub countdown_ms: u64,
    // Fixed time limit for every round; randomized per game type when unset.
    pub time_limit_ms: Option<u64>,
    // 0 disables automatic starts.
    pub auto_start_delay_ms: u64,
    pub default_game_type: String,
    // Append-only JSON lines file; the in-memory store is used when unset.
    pub history_path: Option<PathBuf>,
    pub seed: Option<u64>,
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
    ZeroTickRate,
    TimeLimitTooShort { time_limit_ms: u64 },
    UnknownDefaultGameType(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { key, value } => write!(f, "invalid value for {key}: {value:?}"),
            Self::ZeroTickRate => f.write_str("TICK_RATE_HZ must be greater than 0"),
            Self::TimeLimitTooShort { time_limit_ms } => write!(
                f,
                "ROUND_TIME_LIMIT_MS must be at least {MIN_GAME_DURATION_MS} (got {time_limit_ms})"
            ),
            Self::UnknownDefaultGameType(game_type) => {
                write!(f, "DEFAULT_GAME_TYPE {game_type:?} is not registered")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            countdown_ms: DEFAULT_COUNTDOWN_MS,
            time_limit_ms: None,
            auto_start_delay_ms: DEFAULT_AUTO_START_DELAY_MS,
            default_game_type: DEFAULT_GAME_TYPE.to_string(),
            history_path: None,
            seed: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            port: parse_or("ROUND_SERVER_PORT", &lookup, defaults.port)?,
            tick_rate_hz: parse_or("TICK_RATE_HZ", &lookup, defaults.tick_rate_hz)?,
            countdown_ms: parse_or("ROUND_COUNTDOWN_MS", &lookup, defaults.countdown_ms)?,
            time_limit_ms: parse_opt("ROUND_TIME_LIMIT_MS", &lookup)?,
            auto_start_delay_ms: parse_or(
                "AUTO_START_DELAY_MS",
                &lookup,
                defaults.auto_start_delay_ms,
            )?,
            default_game_type: lookup("DEFAULT_GAME_TYPE")
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.default_game_type),
            history_path: lookup("ROUND_HISTORY_PATH")
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
            seed: parse_opt("ROUND_SEED", &lookup)?,
        })
    }

    pub fn validate(&self, registry: &GameRegistry) -> Result<(), ConfigError> {
        if self.tick_rate_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if let Some(time_limit_ms) = self
            .time_limit_ms
            .filter(|limit| *limit < MIN_GAME_DURATION_MS)
        {
            return Err(ConfigError::TimeLimitTooShort { time_limit_ms });
        }
        if !registry.contains(&self.default_game_type) {
            return Err(ConfigError::UnknownDefaultGameType(
                self.default_game_type.clone(),
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate_hz.max(1)
    }

    pub fn arena_settings(&self) -> ArenaSettings {
        ArenaSettings {
            tick_interval: self.tick_interval(),
            auto_start_delay: (self.auto_start_delay_ms > 0)
                .then(|| Duration::from_millis(self.auto_start_delay_ms)),
            default_game_type: self.default_game_type.clone(),
            round: RoundConfig {
                time_limit_ms: self.time_limit_ms,
                countdown_ms: Some(self.countdown_ms),
                seed: self.seed,
                ..RoundConfig::default()
            },
        }
    }
}

fn parse_opt<T: std::str::FromStr>(
    key: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        _ => Ok(None),
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    Ok(parse_opt(key, lookup)?.unwrap_or(default))
}
