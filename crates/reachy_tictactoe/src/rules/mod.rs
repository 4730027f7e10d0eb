//! Terminal evaluation.
//!
//! Pure functions over a [`Board`]: which side owns a line, whether the
//! board is full, and the combined [`evaluate`] used by the orchestrator.

pub mod draw;
pub mod win;

pub use draw::is_draw;
pub use win::{LINES, line_owners, winner};

use super::{Board, Mover, Outcome};
use derive_more::{Display, Error};
use serde::Serialize;
use tracing::{instrument, warn};

/// Both sides own a complete line at once.
///
/// Unreachable through legal single-piece transitions, so a read like this
/// means the board was tampered with or misread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error, Serialize)]
#[display("Both players own a winning line on {board}")]
pub struct ContestedBoard {
    /// The offending board.
    #[error(not(source))]
    pub board: Board,
}

/// Determines whether a board is won, drawn or still in progress.
#[instrument(skip_all, fields(board = %board))]
pub fn evaluate(board: &Board) -> Result<Outcome, ContestedBoard> {
    let owners = line_owners(board);
    let human = owners.contains(&Mover::Human);
    let robot = owners.contains(&Mover::Robot);

    match (human, robot) {
        (true, true) => {
            warn!(board = %board, "Both players own a winning line");
            Err(ContestedBoard { board: *board })
        }
        (true, false) => Ok(Outcome::Won(Mover::Human)),
        (false, true) => Ok(Outcome::Won(Mover::Robot)),
        (false, false) if board.is_full() => Ok(Outcome::Draw),
        (false, false) => Ok(Outcome::InProgress),
    }
}
