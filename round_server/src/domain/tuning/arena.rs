/// Gameplay tuning for procedural obstacle placement.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).

#[derive(Debug, Clone, Copy)]
pub struct ArenaTuning {
    /// Width of the square sampling area centred on the origin, in world units.
    pub spread: f32,

    /// Minimum planar distance between an obstacle sample and the respawn point.
    pub spawn_exclusion_radius: f32,

    /// Samples drawn before the last one is accepted regardless of distance.
    pub max_placement_attempts: u32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            spread: 30.0,
            spawn_exclusion_radius: 5.0,
            max_placement_attempts: 10,
        }
    }
}
