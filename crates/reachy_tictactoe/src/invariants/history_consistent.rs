//! History consistency invariant.

use super::super::{CellValue, GameSession};
use super::Invariant;

/// Invariant: one history entry per occupied cell, and per-side piece
/// counts match the number of moves each side made.
pub struct HistoryConsistentInvariant;

impl Invariant<GameSession> for HistoryConsistentInvariant {
    fn holds(session: &GameSession) -> bool {
        let board = session.board();
        let occupied = 9 - board.count(CellValue::Empty);
        if session.history().len() != occupied {
            return false;
        }
        [CellValue::Human, CellValue::Robot].into_iter().all(|piece| {
            let moves = session
                .history()
                .iter()
                .filter(|mv| mv.mover.piece() == piece)
                .count();
            moves == board.count(piece)
        })
    }

    fn description() -> &'static str {
        "Move history matches the pieces on the board"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Move, Mover, Position};

    #[test]
    fn test_matching_history_holds() {
        let session = GameSession::from_parts(
            "H../.R./...".parse().unwrap(),
            Mover::Human,
            Mover::Human,
            vec![
                Move::new(Position::TopLeft, Mover::Human),
                Move::new(Position::Center, Mover::Robot),
            ],
        );
        assert!(HistoryConsistentInvariant::holds(&session));
    }

    #[test]
    fn test_piece_missing_from_history_violates() {
        let session = GameSession::from_parts(
            "H../.R./...".parse().unwrap(),
            Mover::Robot,
            Mover::Human,
            vec![Move::new(Position::TopLeft, Mover::Human)],
        );
        assert!(!HistoryConsistentInvariant::holds(&session));
    }

    #[test]
    fn test_swapped_pieces_violate() {
        let session = GameSession::from_parts(
            "RR./.../...".parse().unwrap(),
            Mover::Human,
            Mover::Human,
            vec![
                Move::new(Position::TopLeft, Mover::Human),
                Move::new(Position::TopCenter, Mover::Robot),
            ],
        );
        assert!(!HistoryConsistentInvariant::holds(&session));
    }
}
