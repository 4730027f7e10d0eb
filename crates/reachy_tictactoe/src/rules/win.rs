//! Win detection.

use super::super::{Board, Mover, Position};

/// The 8 winning lines: rows, columns, diagonals.
pub const LINES: [[Position; 3]; 8] = [
    // Rows
    [Position::TopLeft, Position::TopCenter, Position::TopRight],
    [Position::MiddleLeft, Position::Center, Position::MiddleRight],
    [Position::BottomLeft, Position::BottomCenter, Position::BottomRight],
    // Columns
    [Position::TopLeft, Position::MiddleLeft, Position::BottomLeft],
    [Position::TopCenter, Position::Center, Position::BottomCenter],
    [Position::TopRight, Position::MiddleRight, Position::BottomRight],
    // Diagonals
    [Position::TopLeft, Position::Center, Position::BottomRight],
    [Position::TopRight, Position::Center, Position::BottomLeft],
];

/// Owner of each complete line on the board, one entry per line.
pub fn line_owners(board: &Board) -> Vec<Mover> {
    LINES
        .iter()
        .filter_map(|line| line_owner(board, line))
        .collect()
}

/// Returns the first side found owning a complete line.
///
/// Does not detect contested boards; use [`evaluate`](super::evaluate)
/// for that.
pub fn winner(board: &Board) -> Option<Mover> {
    LINES.iter().find_map(|line| line_owner(board, line))
}

fn line_owner(board: &Board, [a, b, c]: &[Position; 3]) -> Option<Mover> {
    let value = board.get(*a);
    if value == board.get(*b) && value == board.get(*c) {
        value.mover()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_winner_empty_board() {
        assert_eq!(winner(&Board::EMPTY), None);
        assert!(line_owners(&Board::EMPTY).is_empty());
    }

    #[test]
    fn test_winner_column() {
        let board: Board = ".R./.R./.R.".parse().unwrap();
        assert_eq!(winner(&board), Some(Mover::Robot));
    }

    #[test]
    fn test_double_line_reported_twice() {
        // Human completes a row and a column with the same corner.
        let board: Board = "HHH/HRR/HR.".parse().unwrap();
        assert_eq!(line_owners(&board), vec![Mover::Human, Mover::Human]);
    }

    #[test]
    fn test_no_winner_incomplete() {
        let board: Board = "HH./R.R/...".parse().unwrap();
        assert_eq!(winner(&board), None);
    }
}
