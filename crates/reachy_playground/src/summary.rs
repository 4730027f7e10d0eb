//! Running totals over many games.

use reachy_tictactoe::{GameReport, Mover, Outcome};
use serde::Serialize;
use std::fmt;

/// Totals printed at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Games finished.
    pub games: u64,
    /// Robot wins.
    pub robot_wins: u64,
    /// Human wins.
    pub human_wins: u64,
    /// Draws.
    pub draws: u64,
    /// Games restarted after a rule violation.
    pub restarts: u64,
    /// Cooldown pauses between games.
    pub cooldowns: u64,
}

impl Summary {
    /// Adds a finished game.
    pub fn record(&mut self, report: &GameReport) {
        self.games += 1;
        self.restarts += u64::from(*report.restarts());
        match report.outcome() {
            Outcome::Won(Mover::Robot) => self.robot_wins += 1,
            Outcome::Won(Mover::Human) => self.human_wins += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::InProgress => {}
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} games: robot {} / human {} / draw {} ({} restarts, {} cooldowns)",
            self.games, self.robot_wins, self.human_wins, self.draws, self.restarts, self.cooldowns
        )
    }
}
