//! Transition validation between consecutive board reads.
//!
//! The physical board can be disturbed at any time: pieces get bumped,
//! removed, or a second piece is dropped while the robot looks away. The
//! validator classifies the difference between the last accepted board and
//! a new read so the orchestrator can accept a move, keep waiting, or abort
//! the game.

use super::{Board, CellValue, Mover, Position};
use derive_more::Display;
use serde::Serialize;
use tracing::{debug, instrument, warn};

/// Why a transition cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Violation {
    /// A side has fewer pieces on the board than before.
    #[display("{mover} piece count dropped from {before} to {after}")]
    PieceCountDecreased {
        /// Side that lost pieces.
        mover: Mover,
        /// Count on the previous board.
        before: usize,
        /// Count on the current board.
        after: usize,
    },
    /// More than one cell changed in a single read.
    #[display("{} cells changed at once", cells.len())]
    MultipleChanges {
        /// Every changed cell.
        cells: Vec<Position>,
    },
    /// A piece was lifted off the board.
    #[display("{was:?} piece removed from {position}")]
    PieceRemoved {
        /// Cell that became empty.
        position: Position,
        /// What used to be there.
        was: CellValue,
    },
    /// A piece turned into a different piece.
    #[display("{position} changed from {was:?} to {now:?}")]
    PieceReplaced {
        /// Cell that changed.
        position: Position,
        /// Value on the previous board.
        was: CellValue,
        /// Value on the current board.
        now: CellValue,
    },
    /// The new piece belongs to the side that is not on turn.
    #[display("{found} played at {position} while {expected} was on turn")]
    WrongMover {
        /// Cell that was filled.
        position: Position,
        /// Side whose turn it was.
        expected: Mover,
        /// Side whose piece appeared.
        found: Mover,
    },
    /// Both sides own a winning line.
    #[display("both players own a winning line")]
    ContestedBoard,
    /// The robot's piece was not seen on the cell it was placed on.
    #[display("robot piece placed at {commanded} but seen at {found:?}")]
    MisplacedPiece {
        /// Cell the actuator was commanded to fill.
        commanded: Position,
        /// Cell that actually received the piece, if any.
        found: Option<Position>,
    },
}

/// Classification of a board-to-board transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "transition")]
pub enum Transition {
    /// Boards are identical.
    NoChange,
    /// Exactly one empty cell received the expected side's piece.
    LegalMove {
        /// The filled cell.
        position: Position,
    },
    /// Anything else.
    Violation {
        /// What went wrong.
        violation: Violation,
    },
}

impl Transition {
    fn violation(violation: Violation) -> Self {
        Transition::Violation { violation }
    }

    /// Checks a robot transition against the cell it was commanded to fill.
    ///
    /// Returns `None` when exactly that cell received the robot's piece.
    /// Anything else means the board was disturbed during the move.
    pub fn placement_violation(&self, commanded: Position) -> Option<Violation> {
        match self {
            Transition::LegalMove { position } if *position == commanded => None,
            Transition::LegalMove { position } => Some(Violation::MisplacedPiece {
                commanded,
                found: Some(*position),
            }),
            Transition::NoChange => Some(Violation::MisplacedPiece {
                commanded,
                found: None,
            }),
            Transition::Violation { violation } => Some(violation.clone()),
        }
    }
}

/// Classifies the change from `prev` to `curr` given whose turn it was.
///
/// Rules, in order: identical boards are `NoChange`; more than one changed
/// cell is a violation (reported as a piece-count drop when a side lost
/// pieces); the single changed cell must go from empty to `expected`'s
/// piece. A side can never lose pieces through any accepted transition.
#[instrument(skip_all, fields(prev = %prev, curr = %curr, expected = %expected))]
pub fn validate(prev: &Board, curr: &Board, expected: Mover) -> Transition {
    let changed = prev.diff(curr);

    if changed.is_empty() {
        return Transition::NoChange;
    }

    let position = match changed.as_slice() {
        [single] => *single,
        _ => {
            let violation = count_drop(prev, curr)
                .unwrap_or(Violation::MultipleChanges { cells: changed });
            warn!(%violation, "Multiple cells changed in one read");
            return Transition::violation(violation);
        }
    };

    let was = prev.get(position);
    let now = curr.get(position);

    let violation = match (was, now.mover()) {
        (CellValue::Empty, Some(found)) if found == expected => {
            debug!(%position, %found, "Legal move detected");
            return Transition::LegalMove { position };
        }
        (CellValue::Empty, Some(found)) => Violation::WrongMover {
            position,
            expected,
            found,
        },
        (_, None) => Violation::PieceRemoved { position, was },
        (_, Some(_)) => Violation::PieceReplaced { position, was, now },
    };

    warn!(%violation, "Illegal transition");
    Transition::violation(violation)
}

/// First side whose piece count went down, if any.
fn count_drop(prev: &Board, curr: &Board) -> Option<Violation> {
    [Mover::Human, Mover::Robot].into_iter().find_map(|mover| {
        let before = prev.count(mover.piece());
        let after = curr.count(mover.piece());
        (after < before).then_some(Violation::PieceCountDecreased {
            mover,
            before,
            after,
        })
    })
}
