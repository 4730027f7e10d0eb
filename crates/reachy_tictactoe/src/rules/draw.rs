//! Draw detection.

use super::super::Board;
use super::win::winner;

/// A full board with no complete line.
pub fn is_draw(board: &Board) -> bool {
    board.is_full() && winner(board).is_none()
}
