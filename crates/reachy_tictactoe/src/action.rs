//! Moves as first-class values.
//!
//! A move is an intent (a side placing a piece on a cell). It is only legal
//! against a particular board, which [`Board::apply`](crate::Board::apply)
//! checks.

use super::{Mover, Position};
use serde::{Deserialize, Serialize};

/// A side placing one piece at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_new::new)]
pub struct Move {
    /// Target cell.
    pub position: Position,
    /// Side placing the piece.
    pub mover: Mover,
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.mover, self.position.label())
    }
}

/// Error that can occur when applying a move to a board.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum MoveError {
    /// The square at the position is already occupied.
    #[display("Square {} is already occupied", _0)]
    SquareOccupied(#[error(not(source))] Position),
}
