// Procedural obstacle placement around the respawn keep-out zone.

use rand::Rng;
use serde::Serialize;

use crate::domain::entities::{EntityKind, EntityProperties, EntitySpec, Vec3};
use crate::domain::tuning::arena::ArenaTuning;

const HAZARD_COLOR: &str = "#e74c3c";
const PLATFORM_COLOR: &str = "#9b59b6";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstaclePattern {
    Sweeper,
    MovingWall,
    Pendulum,
    FallingBlock,
}

impl ObstaclePattern {
    pub const ALL: [ObstaclePattern; 4] = [
        ObstaclePattern::Sweeper,
        ObstaclePattern::MovingWall,
        ObstaclePattern::Pendulum,
        ObstaclePattern::FallingBlock,
    ];

    /// Speed band `[min, max)` the pattern draws from.
    pub fn speed_band(self) -> (f32, f32) {
        match self {
            Self::Sweeper => (2.0, 5.0),
            Self::MovingWall => (1.0, 3.0),
            Self::Pendulum => (1.0, 2.5),
            Self::FallingBlock => (3.0, 7.0),
        }
    }
}

/// One planned obstacle: the accepted sample plus the entity to spawn.
#[derive(Debug, Clone)]
pub struct ObstaclePlacement {
    pub pattern: ObstaclePattern,
    /// Accepted planar sample (x, z).
    pub sample: (f32, f32),
    /// Samples drawn, including the accepted one.
    pub attempts: u32,
    pub spec: EntitySpec,
}

pub fn place_obstacle<R: Rng + ?Sized>(
    rng: &mut R,
    respawn: Vec3,
    tuning: &ArenaTuning,
) -> ObstaclePlacement {
    let pattern = ObstaclePattern::ALL[rng.random_range(0..ObstaclePattern::ALL.len())];

    // Rejection sampling; the last sample is kept once attempts run out.
    let max_attempts = tuning.max_placement_attempts.max(1);
    let mut attempts = 0;
    let (x, z) = loop {
        let x = (rng.random::<f32>() - 0.5) * tuning.spread;
        let z = (rng.random::<f32>() - 0.5) * tuning.spread;
        attempts += 1;
        let clear = Vec3::new(x, respawn.y, z).planar_distance(&respawn)
            >= tuning.spawn_exclusion_radius;
        if clear || attempts >= max_attempts {
            break (x, z);
        }
    };

    let (min_speed, max_speed) = pattern.speed_band();
    let speed = min_speed + rng.random::<f32>() * (max_speed - min_speed);

    ObstaclePlacement {
        pattern,
        sample: (x, z),
        attempts,
        spec: shape_for(pattern, x, z, speed),
    }
}

fn shape_for(pattern: ObstaclePattern, x: f32, z: f32, speed: f32) -> EntitySpec {
    match pattern {
        ObstaclePattern::Sweeper => EntitySpec {
            kind: EntityKind::Obstacle,
            position: Vec3::new(x, 1.0, z),
            size: Vec3::new(8.0, 1.0, 1.0),
            properties: EntityProperties {
                color: HAZARD_COLOR.to_string(),
                rotating: true,
                speed: Some(speed),
                ..EntityProperties::default()
            },
        },
        ObstaclePattern::MovingWall => EntitySpec {
            kind: EntityKind::Obstacle,
            position: Vec3::new(-15.0, 1.0, z),
            size: Vec3::new(2.0, 3.0, 2.0),
            properties: EntityProperties {
                color: HAZARD_COLOR.to_string(),
                kinematic: true,
                path: vec![Vec3::new(-15.0, 1.0, z), Vec3::new(15.0, 1.0, z)],
                speed: Some(speed),
                ..EntityProperties::default()
            },
        },
        ObstaclePattern::Pendulum => EntitySpec {
            kind: EntityKind::Platform,
            position: Vec3::new(x, 5.0, z),
            size: Vec3::new(4.0, 0.5, 4.0),
            properties: EntityProperties {
                color: PLATFORM_COLOR.to_string(),
                kinematic: true,
                path: vec![Vec3::new(x, 5.0, z), Vec3::new(x + 10.0, 5.0, z - 10.0)],
                speed: Some(speed),
                ..EntityProperties::default()
            },
        },
        ObstaclePattern::FallingBlock => EntitySpec {
            kind: EntityKind::Obstacle,
            position: Vec3::new(x, 20.0, z),
            size: Vec3::new(2.0, 2.0, 2.0),
            properties: EntityProperties {
                color: HAZARD_COLOR.to_string(),
                falling: true,
                speed: Some(speed),
                ..EntityProperties::default()
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn placements_respect_exclusion_radius_or_exhaust_attempts() {
        let tuning = ArenaTuning::default();
        let respawn = Vec3::new(0.0, 2.0, 0.0);
        for seed in 0..200u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..5 {
                let placement = place_obstacle(&mut rng, respawn, &tuning);
                let (x, z) = placement.sample;
                let distance = Vec3::new(x, 0.0, z).planar_distance(&respawn);
                assert!(
                    distance >= tuning.spawn_exclusion_radius
                        || placement.attempts == tuning.max_placement_attempts,
                    "seed {seed}: distance {distance} after {} attempts",
                    placement.attempts
                );
                assert!(placement.attempts <= tuning.max_placement_attempts);
                assert!(x.abs() <= tuning.spread / 2.0 && z.abs() <= tuning.spread / 2.0);
            }
        }
    }

    #[test]
    fn unreachable_exclusion_zone_accepts_last_sample() {
        let tuning = ArenaTuning {
            spawn_exclusion_radius: 1_000.0,
            ..ArenaTuning::default()
        };
        let mut rng = StdRng::seed_from_u64(7);

        let placement = place_obstacle(&mut rng, Vec3::default(), &tuning);

        assert_eq!(placement.attempts, tuning.max_placement_attempts);
    }

    #[test]
    fn speeds_stay_within_pattern_band() {
        let tuning = ArenaTuning::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let placement = place_obstacle(&mut rng, Vec3::default(), &tuning);
            let (min, max) = placement.pattern.speed_band();
            let speed = placement.spec.properties.speed.expect("obstacles carry a speed");
            assert!(speed >= min && speed < max + f32::EPSILON);
        }
    }

    #[test]
    fn moving_wall_spans_the_arena_at_sampled_depth() {
        let spec = shape_for(ObstaclePattern::MovingWall, 3.0, -4.0, 1.5);
        assert_eq!(spec.position, Vec3::new(-15.0, 1.0, -4.0));
        assert_eq!(
            spec.properties.path,
            vec![Vec3::new(-15.0, 1.0, -4.0), Vec3::new(15.0, 1.0, -4.0)]
        );
        assert!(spec.properties.kinematic);
    }
}
