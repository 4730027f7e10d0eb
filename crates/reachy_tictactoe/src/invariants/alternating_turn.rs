//! Alternating turn invariant.

use super::super::GameSession;
use super::Invariant;

/// Invariant: sides alternate, starting with the coin-flip winner.
///
/// The side on turn is the first mover after an even number of moves and
/// the other side after an odd number.
pub struct AlternatingTurnInvariant;

impl Invariant<GameSession> for AlternatingTurnInvariant {
    fn holds(session: &GameSession) -> bool {
        let history = session.history();

        if let Some(first) = history.first()
            && first.mover != session.first_mover()
        {
            return false;
        }

        if history.windows(2).any(|w| w[0].mover == w[1].mover) {
            return false;
        }

        let expected_next = if history.len() % 2 == 0 {
            session.first_mover()
        } else {
            session.first_mover().opponent()
        };
        session.to_move() == expected_next
    }

    fn description() -> &'static str {
        "Sides alternate turns starting with the first mover"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Board, Move, Mover, Position};

    #[test]
    fn test_accepted_moves_alternate() {
        let mut session = GameSession::start(Mover::Robot);
        let mv = Move::new(Position::Center, Mover::Robot);
        session.accept(mv, Board::EMPTY.apply(mv).unwrap()).unwrap();
        assert!(AlternatingTurnInvariant::holds(&session));
        assert_eq!(session.to_move(), Mover::Human);
    }

    #[test]
    fn test_wrong_first_mover_violates() {
        let session = GameSession::from_parts(
            ".../.H./...".parse().unwrap(),
            Mover::Robot,
            Mover::Robot,
            vec![Move::new(Position::Center, Mover::Human)],
        );
        assert!(!AlternatingTurnInvariant::holds(&session));
    }

    #[test]
    fn test_repeated_mover_violates() {
        let session = GameSession::from_parts(
            "H../.H./...".parse().unwrap(),
            Mover::Robot,
            Mover::Human,
            vec![
                Move::new(Position::TopLeft, Mover::Human),
                Move::new(Position::Center, Mover::Human),
            ],
        );
        assert!(!AlternatingTurnInvariant::holds(&session));
    }
}
