// "Reach the Goal": first participant to touch the goal trigger wins.

use super::{GameStrategy, GameTypeInfo};
use crate::domain::tricks::{CustomTrick, TrickAction, TrickTrigger};
use crate::domain::{EntityKind, EntityProperties, EntitySpec, Vec3};
use crate::use_cases::round::Round;
use crate::use_cases::types::WinOutcome;
use rand::Rng;

pub const TAG: &str = "reach";
pub const SPAWN_OBSTACLES: &str = "spawn_obstacles";

const GOAL_COLOR: &str = "#f1c40f";
const GOAL_SIZE: f32 = 3.0;
const GOAL_DEPTH: f32 = -20.0;
const GOAL_HEIGHT: f32 = 3.0;
const GOAL_LATERAL_SPREAD: f32 = 10.0;
/// Distance from the goal centre that counts as touching it.
pub const GOAL_RADIUS: f32 = 2.5;
const STARTING_OBSTACLES: usize = 3;

pub fn info() -> GameTypeInfo {
    GameTypeInfo {
        tag: TAG,
        name: "Reach the Goal",
        description: "First player to touch the target wins",
        min_players: 1,
        has_timer: true,
        default_time_limit_ms: 60_000,
        time_limit_range_ms: Some((40_000, 75_000)),
    }
}

#[derive(Debug, Default)]
pub struct ReachGoal {
    goal: Option<Vec3>,
}

impl ReachGoal {
    fn spawn_goal(&mut self, round: &mut Round) {
        let x = round
            .rng()
            .random_range(-GOAL_LATERAL_SPREAD..GOAL_LATERAL_SPREAD);
        let entity = round.spawn_entity(EntitySpec {
            kind: EntityKind::Trigger,
            position: Vec3::new(x, GOAL_HEIGHT, GOAL_DEPTH),
            size: Vec3::new(GOAL_SIZE, GOAL_SIZE, GOAL_SIZE),
            properties: EntityProperties {
                color: GOAL_COLOR.to_string(),
                rotating: true,
                is_goal: true,
                speed: Some(2.0),
                ..EntityProperties::default()
            },
        });
        self.goal = Some(entity.position);
    }
}

impl GameStrategy for ReachGoal {
    fn setup_default_tricks(&mut self, round: &mut Round) {
        self.spawn_goal(round);
        round.spawn_random_obstacles(STARTING_OBSTACLES);

        round.add_trick(
            TrickTrigger::Time { at_ms: 15_000 },
            TrickAction::announce("Halfway there? Keep moving!"),
        );
        round.add_trick(TrickTrigger::Time { at_ms: 20_000 }, TrickAction::flip_gravity());
        round.add_trick(
            TrickTrigger::Interval { every_ms: 25_000 },
            TrickAction::speed_burst(),
        );
        round.add_trick(
            TrickTrigger::Time { at_ms: 30_000 },
            TrickAction::custom(SPAWN_OBSTACLES, serde_json::json!({ "count": 2 })),
        );
    }

    fn check_win_condition(&mut self, round: &mut Round) -> Option<WinOutcome> {
        let goal = self.goal?;
        let world = round.world().clone();
        round
            .alive_participants()
            .find(|id| {
                world
                    .player_position(*id)
                    .is_some_and(|position| position.distance(&goal) <= GOAL_RADIUS)
            })
            .map(WinOutcome::winner)
    }

    fn handle_custom_trick(&mut self, trick: &CustomTrick, round: &mut Round) -> bool {
        if trick.name != SPAWN_OBSTACLES {
            return false;
        }
        let count = trick
            .params
            .get("count")
            .and_then(|count| count.as_u64())
            .unwrap_or(1) as usize;
        round.spawn_random_obstacles(count);
        true
    }
}
