/// Timing tuning for the round lifecycle.

#[derive(Debug, Clone, Copy)]
pub struct TimeWarning {
    /// Remaining time at or below which the warning is announced.
    pub remaining_ms: u64,
    pub message: &'static str,
}

#[derive(Debug, Clone)]
pub struct RoundTuning {
    /// Pre-round countdown handed to the world when no override is configured.
    pub default_countdown_ms: u64,

    /// Delay between `end()` and destruction of round-owned entities.
    pub cleanup_delay_ms: u64,

    /// Delay between `end()` and the "returning to lobby" announcement.
    pub lobby_announcement_delay_ms: u64,

    /// Remaining-time thresholds, each announced once per round.
    pub time_warnings: Vec<TimeWarning>,

    /// Time-limit range for game types that do not declare their own.
    pub fallback_time_limit_range_ms: (u64, u64),
}

impl Default for RoundTuning {
    fn default() -> Self {
        Self {
            default_countdown_ms: 5_000,
            cleanup_delay_ms: 5_000,
            lobby_announcement_delay_ms: 3_000,
            time_warnings: vec![
                TimeWarning {
                    remaining_ms: 30_000,
                    message: "30 SECONDS!",
                },
                TimeWarning {
                    remaining_ms: 10_000,
                    message: "10 SECONDS!",
                },
                TimeWarning {
                    remaining_ms: 5_000,
                    message: "FINAL 5 SECONDS!",
                },
            ],
            fallback_time_limit_range_ms: (45_000, 75_000),
        }
    }
}
