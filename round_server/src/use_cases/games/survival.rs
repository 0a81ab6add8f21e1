// "Last One Standing": fall below the floor and you are out.

use super::{GameStrategy, GameTypeInfo};
use crate::domain::tricks::{
    CustomTrick, DEFAULT_LOW_GRAVITY, ScoreTarget, TrickAction, TrickTrigger,
};
use crate::domain::{PlayerId, RoundResult};
use crate::use_cases::round::Round;
use crate::use_cases::types::WinOutcome;

pub const TAG: &str = "survival";
pub const SURVIVAL_BONUS: &str = "survival_bonus";

/// Participants below this height are eliminated.
pub const FLOOR_THRESHOLD: f32 = -10.0;
const BONUS_INTERVAL_MS: u64 = 10_000;

pub fn info() -> GameTypeInfo {
    GameTypeInfo {
        tag: TAG,
        name: "Last One Standing",
        description: "Stay on the arena; the last player standing wins",
        min_players: 2,
        has_timer: true,
        default_time_limit_ms: 60_000,
        time_limit_range_ms: Some((45_000, 75_000)),
    }
}

#[derive(Debug, Default)]
pub struct Survival;

impl GameStrategy for Survival {
    fn setup_default_tricks(&mut self, round: &mut Round) {
        round.add_trick(
            TrickTrigger::Interval {
                every_ms: BONUS_INTERVAL_MS,
            },
            TrickAction::custom(SURVIVAL_BONUS, serde_json::json!({ "points": 1 })),
        );
        round.add_trick(
            TrickTrigger::Deaths { count: 1 },
            TrickAction::announce("First one down!"),
        );
        round.add_trick(
            TrickTrigger::Score {
                player: ScoreTarget::Any,
                value: 3,
            },
            TrickAction::announce("Someone is holding on!"),
        );
        round.add_trick(
            TrickTrigger::Interval { every_ms: 20_000 },
            TrickAction::FlipGravity {
                gravity: DEFAULT_LOW_GRAVITY,
                duration_ms: 5_000,
                message: None,
            },
        );
    }

    fn check_win_condition(&mut self, round: &mut Round) -> Option<WinOutcome> {
        let world = round.world().clone();
        let alive: Vec<PlayerId> = round.alive_participants().collect();
        let fallen: Vec<PlayerId> = alive
            .iter()
            .copied()
            .filter(|id| {
                world
                    .player_position(*id)
                    .is_some_and(|position| position.y < FLOOR_THRESHOLD)
            })
            .collect();
        if fallen.is_empty() {
            return None;
        }

        // Everyone still standing went down in the same tick: nobody wins.
        if fallen.len() == alive.len() {
            let result = if round.participants().len() == 1 {
                RoundResult::Other("fell_off".to_string())
            } else {
                RoundResult::Draw
            };
            return Some(WinOutcome {
                result,
                winner_id: None,
            });
        }

        for id in fallen {
            if !round.is_active() {
                break;
            }
            round.eliminate_player(id);
        }
        None
    }

    fn handle_custom_trick(&mut self, trick: &CustomTrick, round: &mut Round) -> bool {
        if trick.name != SURVIVAL_BONUS {
            return false;
        }
        let points = trick
            .params
            .get("points")
            .and_then(|points| points.as_i64())
            .unwrap_or(1);
        let alive: Vec<PlayerId> = round.alive_participants().collect();
        for id in alive {
            round.add_score(id, points);
        }
        true
    }
}
