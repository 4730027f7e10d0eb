//! Structured game events.
//!
//! The core publishes plain data; the binary decides where it goes.

use super::orchestrator::TurnState;
use super::transition::{Transition, Violation};
use super::{Board, Move, Mover, Outcome, Validity};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::trace;

/// Something observable that happened at the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum GameEvent {
    /// The orchestrator entered a new state.
    StateChanged {
        /// Previous state.
        from: TurnState,
        /// New state.
        to: TurnState,
    },
    /// A frame was decoded.
    BoardRead {
        /// Decoded canonical board.
        board: Board,
        /// Whether the frame passed the validity check.
        sane: bool,
        /// Top validity label.
        validity: Validity,
        /// Its confidence.
        confidence: f32,
    },
    /// A sane read, or the board confirmed after a robot move, was compared
    /// against the last accepted board. Emitted for every decision,
    /// `NoChange` included.
    TransitionDecided {
        /// Last accepted board.
        prev: Board,
        /// New read.
        curr: Board,
        /// Side on turn.
        expected: Mover,
        /// Validator verdict.
        transition: Transition,
    },
    /// The engine picked the robot's move.
    MoveChosen {
        /// The move.
        #[serde(rename = "move")]
        mv: Move,
        /// Its minimax value.
        value: i8,
    },
    /// The actuator confirmed a move.
    MoveExecuted {
        /// The move.
        #[serde(rename = "move")]
        mv: Move,
        /// Board reported after the move.
        board: Board,
    },
    /// A game began on a clear board.
    GameStarted {
        /// Coin-flip winner.
        first_mover: Mover,
    },
    /// A rule violation ended the game early.
    GameAborted {
        /// What happened.
        violation: Violation,
        /// Last accepted board.
        board: Board,
    },
    /// A game reached a result.
    GameOver {
        /// The result.
        outcome: Outcome,
        /// Final board.
        board: Board,
        /// Number of moves played.
        moves: usize,
    },
    /// Play paused for a cooldown.
    CooldownStarted {
        /// Readings that triggered it.
        temperatures: BTreeMap<String, f64>,
    },
    /// Play resumed after a cooldown.
    CooldownFinished {
        /// Readings that ended it.
        temperatures: BTreeMap<String, f64>,
        /// Time spent cooling.
        waited_ms: u64,
    },
}

/// Where the core sends events. A sink with no receiver drops them.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<GameEvent>>,
}

impl EventSink {
    /// A sink feeding `tx`.
    pub fn new(tx: mpsc::UnboundedSender<GameEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that discards everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// A connected sink and its receiver.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GameEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Publishes an event. A closed receiver is ignored.
    pub fn emit(&self, event: GameEvent) {
        if let Some(tx) = &self.tx
            && tx.send(event).is_err()
        {
            trace!("Event receiver closed, dropping event");
        }
    }
}
