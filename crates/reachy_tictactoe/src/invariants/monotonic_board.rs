//! Monotonic board invariant: cells never change once set.

use super::super::{Board, GameSession};
use super::Invariant;

/// Invariant: replaying the move history from an empty board reproduces
/// the current board, and no move ever lands on an occupied cell.
pub struct MonotonicBoardInvariant;

impl Invariant<GameSession> for MonotonicBoardInvariant {
    fn holds(session: &GameSession) -> bool {
        let mut replayed = Board::EMPTY;
        for mv in session.history() {
            match replayed.apply(*mv) {
                Ok(next) => replayed = next,
                Err(_) => return false,
            }
        }
        replayed == *session.board()
    }

    fn description() -> &'static str {
        "Board cells are monotonic (never overwritten or cleared)"
    }
}
