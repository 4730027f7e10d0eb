//! Simulated human strategies.

use rand::Rng;
use rand::seq::IndexedRandom;
use reachy_tictactoe::{Board, CellValue, Mover, Position, choose_move};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the simulated human plays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Opponent {
    /// Always plays the optimal human move.
    Perfect,
    /// Plays a random free cell.
    Random,
    /// Mostly random, sometimes tampers with the board.
    Cheater,
}

/// Probability that the cheater tampers instead of moving.
const CHEAT_PROBABILITY: f64 = 0.2;

/// What the simulated human does with the board on their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumanAction {
    /// Places one cube.
    Place(Position),
    /// Replaces the board with one that breaks the rules.
    Tamper(Board),
}

impl Opponent {
    /// Decides the human's action on `board`.
    ///
    /// Returns `None` when there is nothing to do, which only happens on a
    /// full board.
    pub fn act<R: Rng>(&self, board: &Board, rng: &mut R) -> Option<HumanAction> {
        let vacant: Vec<Position> = board.vacant_positions().collect();
        if vacant.is_empty() {
            return None;
        }

        let action = match self {
            Opponent::Perfect => match choose_move(board, Mover::Human) {
                Ok(decision) => HumanAction::Place(decision.mv.position),
                Err(_) => HumanAction::Place(*vacant.choose(rng)?),
            },
            Opponent::Random => HumanAction::Place(*vacant.choose(rng)?),
            Opponent::Cheater => {
                if rng.random_bool(CHEAT_PROBABILITY) {
                    tamper(board, &vacant, rng)
                } else {
                    HumanAction::Place(*vacant.choose(rng)?)
                }
            }
        };
        debug!(opponent = %self, ?action, "Human acts");
        Some(action)
    }
}

/// Either lifts a robot piece or drops two cubes at once.
fn tamper<R: Rng>(board: &Board, vacant: &[Position], rng: &mut R) -> HumanAction {
    let robot: Vec<Position> = Position::ALL
        .into_iter()
        .filter(|p| board.get(*p).mover() == Some(Mover::Robot))
        .collect();

    let mut cells = *board.cells();
    match robot.choose(rng) {
        Some(taken) if vacant.len() < 2 || rng.random_bool(0.5) => {
            cells[taken.to_index()] = CellValue::Empty;
        }
        _ => {
            for position in vacant.choose_multiple(rng, 2) {
                cells[position.to_index()] = Mover::Human.piece();
            }
        }
    }
    HumanAction::Tamper(Board::from_cells(cells))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use reachy_tictactoe::{Transition, validate};

    #[test]
    fn test_perfect_blocks() {
        let board: Board = "RR./.H./...".parse().unwrap();
        let mut rng = Pcg64::seed_from_u64(1);
        assert_eq!(
            Opponent::Perfect.act(&board, &mut rng),
            Some(HumanAction::Place(Position::TopRight))
        );
    }

    #[test]
    fn test_random_only_picks_vacant_cells() {
        let board: Board = "RHR/HR./...".parse().unwrap();
        let mut rng = Pcg64::seed_from_u64(2);
        for _ in 0..50 {
            match Opponent::Random.act(&board, &mut rng) {
                Some(HumanAction::Place(p)) => assert!(board.is_vacant(p)),
                other => panic!("Unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_tampering_is_always_a_violation() {
        let board: Board = "R../.H./...".parse().unwrap();
        let mut rng = Pcg64::seed_from_u64(3);
        let vacant: Vec<Position> = board.vacant_positions().collect();
        for _ in 0..50 {
            let HumanAction::Tamper(tampered) = tamper(&board, &vacant, &mut rng) else {
                panic!("Expected tamper");
            };
            assert!(matches!(
                validate(&board, &tampered, Mover::Human),
                Transition::Violation { .. }
            ));
        }
    }

    #[test]
    fn test_full_board_has_no_action() {
        let board: Board = "HRH/HRR/RHH".parse().unwrap();
        let mut rng = Pcg64::seed_from_u64(4);
        assert_eq!(Opponent::Cheater.act(&board, &mut rng), None);
    }
}
