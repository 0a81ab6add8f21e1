// Use cases layer: round engine, game strategies and the arena host.

pub mod arena;
pub mod games;
pub mod minigame;
pub mod round;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use arena::{Arena, ArenaError, ArenaSettings};
pub use games::{GameRegistry, GameStrategy, GameTypeInfo};
pub use minigame::MiniGame;
pub use round::{Round, RoundConfig, RoundDeps};
pub use types::{RoundEvent, RoundStatus, RoundSummary, WinOutcome};
