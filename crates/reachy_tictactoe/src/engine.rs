//! Exhaustive game-tree search.
//!
//! At most nine plies remain on a 3x3 board, so the whole tree is searched
//! on every call. Values are from the robot's side: `+1` robot win, `-1`
//! human win, `0` draw. Internally a win is also scored by how many cells
//! were still empty when it happened, so among moves of equal value the
//! engine takes the quickest win and postpones a loss as long as it can.
//! Remaining ties go to [`PREFERENCE`] order.

use super::rules::{self, ContestedBoard};
use super::{Board, CellValue, Move, Mover, Outcome, Position};
use derive_more::{Display, Error};
use serde::Serialize;
use tracing::{debug, instrument};

/// Tie-break order: center, corners, then edges.
pub const PREFERENCE: [Position; 9] = [
    Position::Center,
    Position::TopLeft,
    Position::TopRight,
    Position::BottomLeft,
    Position::BottomRight,
    Position::TopCenter,
    Position::MiddleLeft,
    Position::MiddleRight,
    Position::BottomCenter,
];

/// A chosen move together with its game-theoretic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// The move to play.
    pub mv: Move,
    /// Minimax value of the position after the move: -1, 0 or +1.
    pub value: i8,
}

/// Why no move can be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum EngineError {
    /// The board already has a result.
    #[display("Game is already over: {outcome}")]
    GameOver {
        /// The existing result.
        #[error(not(source))]
        outcome: Outcome,
    },
    /// Both sides own a line; there is nothing sensible to play.
    #[display("{source}")]
    Contested {
        /// The evaluator's finding.
        source: ContestedBoard,
    },
}

impl From<ContestedBoard> for EngineError {
    fn from(source: ContestedBoard) -> Self {
        EngineError::Contested { source }
    }
}

/// Returns an optimal move for `mover` on `board`.
///
/// A pure function of its inputs: no state is kept between calls and the
/// board is only read, so it may be called from any thread.
#[instrument(skip_all, fields(board = %board, mover = %mover))]
pub fn choose_move(board: &Board, mover: Mover) -> Result<Decision, EngineError> {
    let outcome = rules::evaluate(board)?;
    if outcome.is_terminal() {
        return Err(EngineError::GameOver { outcome });
    }

    let mut best: Option<(Position, i32)> = None;
    for position in PREFERENCE.into_iter().filter(|p| board.is_vacant(*p)) {
        let child = board.with(position, mover.piece());
        let score = search(&child, mover.opponent(), i32::MIN, i32::MAX);
        let better = match best {
            None => true,
            Some((_, best_score)) => match mover {
                Mover::Robot => score > best_score,
                Mover::Human => score < best_score,
            },
        };
        if better {
            best = Some((position, score));
        }
    }

    // A non-terminal board always has a vacant cell.
    let (position, score) = best.ok_or(EngineError::GameOver { outcome })?;
    let decision = Decision {
        mv: Move::new(position, mover),
        value: value_of(score),
    };
    debug!(mv = %decision.mv, value = decision.value, "Move chosen");
    Ok(decision)
}

/// Minimax value of `board` with `to_move` on turn, from the robot's side.
pub fn minimax_value(board: &Board, to_move: Mover) -> Result<i8, ContestedBoard> {
    rules::evaluate(board)?;
    Ok(value_of(search(board, to_move, i32::MIN, i32::MAX)))
}

fn value_of(score: i32) -> i8 {
    score.signum() as i8
}

/// Alpha-beta search returning an exact score within `(alpha, beta)`.
///
/// Scores are `±(1 + empty cells)` for decided games and `0` for draws.
fn search(board: &Board, to_move: Mover, mut alpha: i32, mut beta: i32) -> i32 {
    if let Some(winner) = rules::winner(board) {
        let margin = 1 + board.count(CellValue::Empty) as i32;
        return match winner {
            Mover::Robot => margin,
            Mover::Human => -margin,
        };
    }
    if board.is_full() {
        return 0;
    }

    match to_move {
        Mover::Robot => {
            let mut best = i32::MIN;
            for position in board.vacant_positions() {
                let child = board.with(position, Mover::Robot.piece());
                best = best.max(search(&child, Mover::Human, alpha, beta));
                alpha = alpha.max(best);
                if alpha >= beta {
                    break;
                }
            }
            best
        }
        Mover::Human => {
            let mut best = i32::MAX;
            for position in board.vacant_positions() {
                let child = board.with(position, Mover::Human.piece());
                best = best.min(search(&child, Mover::Robot, alpha, beta));
                beta = beta.min(best);
                if alpha >= beta {
                    break;
                }
            }
            best
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_board_is_a_draw_and_opens_center() {
        let decision = choose_move(&Board::EMPTY, Mover::Robot).unwrap();
        assert_eq!(decision.value, 0);
        assert_eq!(decision.mv, Move::new(Position::Center, Mover::Robot));
    }

    #[test]
    fn test_takes_immediate_win_over_block() {
        // Robot can win on the middle row; human threatens the top row.
        let b = board("HH./RR./H..");
        let decision = choose_move(&b, Mover::Robot).unwrap();
        assert_eq!(decision.mv.position, Position::MiddleRight);
        assert_eq!(decision.value, 1);
    }

    #[test]
    fn test_blocks_immediate_threat() {
        let b = board("HH./.R./...");
        let decision = choose_move(&b, Mover::Robot).unwrap();
        assert_eq!(decision.mv.position, Position::TopRight);
    }

    #[test]
    fn test_human_side_minimizes() {
        let b = board("RR./.H./...");
        let decision = choose_move(&b, Mover::Human).unwrap();
        assert_eq!(decision.mv.position, Position::TopRight);
    }

    #[test]
    fn test_terminal_board_rejected() {
        let b = board("HHH/RR./...");
        assert_eq!(
            choose_move(&b, Mover::Robot),
            Err(EngineError::GameOver {
                outcome: Outcome::Won(Mover::Human)
            })
        );
    }

    #[test]
    fn test_contested_board_rejected() {
        let b = board("HHH/RRR/...");
        assert!(matches!(
            choose_move(&b, Mover::Robot),
            Err(EngineError::Contested { .. })
        ));
    }

    #[test]
    fn test_minimax_value_of_won_board() {
        assert_eq!(minimax_value(&board("RRR/HH./..."), Mover::Human), Ok(1));
        assert_eq!(minimax_value(&Board::EMPTY, Mover::Human), Ok(0));
    }
}
