//! Per-game state owned by the orchestrator.

use super::invariants::InvariantViolation;
#[cfg(debug_assertions)]
use super::invariants::{InvariantSet, SessionInvariants};
use super::rules::{self, ContestedBoard};
use super::{Board, Move, MoveError, Mover, Outcome};
use derive_more::{Display, Error};
use serde::Serialize;
use tracing::{debug, instrument};

/// Errors from [`GameSession::accept`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    /// The game already has a result.
    #[display("Game is already over: {outcome}")]
    GameOver {
        /// The recorded result.
        #[error(not(source))]
        outcome: Outcome,
    },
    /// The move belongs to the side that is not on turn.
    #[display("{found} moved while {expected} was on turn")]
    WrongMover {
        /// Side on turn.
        expected: Mover,
        /// Side in the move.
        found: Mover,
    },
    /// The target cell is taken.
    #[display("{source}")]
    Move {
        /// Underlying move error.
        source: MoveError,
    },
    /// The observed board is not the last board plus the move.
    #[display("Board {actual} does not match {expected} after the move")]
    BoardMismatch {
        /// Last accepted board with the move applied.
        #[error(not(source))]
        expected: Board,
        /// Board that was observed.
        actual: Board,
    },
    /// The new board has winning lines for both sides.
    #[display("{source}")]
    Contested {
        /// The evaluator's finding.
        source: ContestedBoard,
    },
    /// A session invariant failed after the move (debug builds only).
    #[display("Session invariants violated: {}", violations.len())]
    InvariantViolated {
        /// Every failed invariant.
        #[error(not(source))]
        violations: Vec<InvariantViolation>,
    },
}

impl From<MoveError> for SessionError {
    fn from(source: MoveError) -> Self {
        SessionError::Move { source }
    }
}

impl From<ContestedBoard> for SessionError {
    fn from(source: ContestedBoard) -> Self {
        SessionError::Contested { source }
    }
}

/// One game from coin flip to result.
///
/// `board` is the last accepted board: every accepted move extends it by
/// exactly one piece, so it only ever grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSession {
    board: Board,
    to_move: Mover,
    first_mover: Mover,
    history: Vec<Move>,
    outcome: Outcome,
}

impl GameSession {
    /// A fresh game on an empty board.
    pub fn start(first_mover: Mover) -> Self {
        debug!(%first_mover, "Session started");
        Self {
            board: Board::EMPTY,
            to_move: first_mover,
            first_mover,
            history: Vec::new(),
            outcome: Outcome::InProgress,
        }
    }

    /// Last accepted board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side whose move is awaited.
    pub fn to_move(&self) -> Mover {
        self.to_move
    }

    /// Side that won the coin flip.
    pub fn first_mover(&self) -> Mover {
        self.first_mover
    }

    /// Accepted moves in order.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Current result.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// True once the game has a result.
    pub fn is_over(&self) -> bool {
        self.outcome.is_terminal()
    }

    /// Records `mv`, observed as `board`, and returns the new outcome.
    ///
    /// The board must be exactly the last accepted board with the move
    /// applied. On error nothing changes.
    #[instrument(skip_all, fields(mv = %mv, board = %board))]
    pub fn accept(&mut self, mv: Move, board: Board) -> Result<Outcome, SessionError> {
        if self.is_over() {
            return Err(SessionError::GameOver {
                outcome: self.outcome,
            });
        }
        if mv.mover != self.to_move {
            return Err(SessionError::WrongMover {
                expected: self.to_move,
                found: mv.mover,
            });
        }
        let expected = self.board.apply(mv)?;
        if expected != board {
            return Err(SessionError::BoardMismatch {
                expected,
                actual: board,
            });
        }
        let outcome = rules::evaluate(&board)?;

        #[cfg(debug_assertions)]
        let before = self.clone();

        self.board = board;
        self.history.push(mv);
        self.to_move = self.to_move.opponent();
        self.outcome = outcome;

        #[cfg(debug_assertions)]
        if let Err(violations) = SessionInvariants::check_all(self) {
            *self = before;
            return Err(SessionError::InvariantViolated { violations });
        }

        debug!(%outcome, moves = self.history.len(), "Move accepted");
        Ok(outcome)
    }

    /// Builds a session from raw parts without any checks.
    #[cfg(test)]
    pub(crate) fn from_parts(
        board: Board,
        to_move: Mover,
        first_mover: Mover,
        history: Vec<Move>,
    ) -> Self {
        let outcome = rules::evaluate(&board).unwrap_or(Outcome::InProgress);
        Self {
            board,
            to_move,
            first_mover,
            history,
            outcome,
        }
    }
}
