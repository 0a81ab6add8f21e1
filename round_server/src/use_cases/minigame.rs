// Per-tick driver pairing a round with its game-type strategy.

use crate::domain::tricks::{DEFAULT_ANNOUNCE_TEXT, TrickAction, TrickId};
use crate::domain::{GamePhase, RoundResult};
use crate::use_cases::games::GameStrategy;
use crate::use_cases::round::{EndCallback, Round};
use crate::use_cases::types::{RoundStatus, RoundSummary};
use std::time::Duration;
use tracing::{info, warn};

pub struct MiniGame {
    round: Round,
    strategy: Box<dyn GameStrategy>,
}

impl MiniGame {
    pub(crate) fn new(round: Round, strategy: Box<dyn GameStrategy>) -> Self {
        Self { round, strategy }
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn round_mut(&mut self) -> &mut Round {
        &mut self.round
    }

    pub fn id(&self) -> &str {
        self.round.id()
    }

    pub fn is_active(&self) -> bool {
        self.round.is_active()
    }

    pub fn is_inert(&self) -> bool {
        self.round.is_inert()
    }

    pub fn status(&self) -> RoundStatus {
        self.round.status()
    }

    /// Registers a callback invoked once with the summary when the round ends.
    pub fn on_end(&mut self, callback: impl FnOnce(&RoundSummary) + Send + 'static) {
        let callback: EndCallback = Box::new(callback);
        self.round.set_on_end(callback);
    }

    /// Captures participants, starts the world countdown and installs default tricks.
    pub fn start(&mut self) {
        if !self.round.begin() {
            return;
        }
        self.strategy.setup_default_tricks(&mut self.round);
        info!(
            round_id = %self.round.id(),
            game_type = %self.round.game_type(),
            participants = self.round.participants().len(),
            time_limit_ms = self.round.time_limit_ms(),
            tricks = self.round.tricks().len(),
            "round started"
        );
    }

    pub fn end(&mut self, result: RoundResult, winner_id: Option<u64>) -> Option<RoundSummary> {
        self.round.end(result, winner_id)
    }

    pub fn update(&mut self, delta: Duration) {
        self.round.advance_clock(delta);
        self.round.run_due_timers();

        if !self.round.is_active() || self.round.world().phase() == GamePhase::Countdown {
            return;
        }
        let elapsed_ms = self.round.mark_running();

        if elapsed_ms >= self.round.time_limit_ms() {
            self.round.end(RoundResult::Timeout, None);
            return;
        }
        if self.round.all_eliminated() {
            self.round.end(RoundResult::Draw, None);
            return;
        }

        self.process_tricks(elapsed_ms);
        if !self.round.is_active() {
            return;
        }

        self.round.announce_time_warnings(elapsed_ms);

        if let Some(outcome) = self.strategy.check_win_condition(&mut self.round) {
            self.round.end(outcome.result, outcome.winner_id);
        }
    }

    fn process_tricks(&mut self, elapsed_ms: u64) {
        let mut index = 0;
        while index < self.round.tricks().len() && self.round.is_active() {
            if let Some((trick_id, action)) = self.round.poll_trick(index, elapsed_ms) {
                self.execute_trick(trick_id, action);
            }
            index += 1;
        }
    }

    fn execute_trick(&mut self, trick_id: TrickId, action: TrickAction) {
        info!(round_id = %self.round.id(), trick_id, action = action.tag(), "trick fired");
        match action {
            TrickAction::Announce { text, kind } => {
                let text = text.as_deref().unwrap_or(DEFAULT_ANNOUNCE_TEXT);
                self.round.announce(text, kind);
            }
            TrickAction::FlipGravity {
                gravity,
                duration_ms,
                message,
            } => self
                .round
                .flip_gravity(gravity, duration_ms, message.as_deref()),
            TrickAction::SpeedBurst { duration_ms } => self.round.speed_burst(duration_ms),
            TrickAction::Custom(custom) => {
                if !self.strategy.handle_custom_trick(&custom, &mut self.round) {
                    warn!(
                        round_id = %self.round.id(),
                        trick_id,
                        action = %custom.name,
                        "unhandled trick action"
                    );
                }
            }
        }
    }
}
