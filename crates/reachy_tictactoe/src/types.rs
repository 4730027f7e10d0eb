//! Core domain types for the robot's tic-tac-toe.

use super::action::{Move, MoveError};
use super::position::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::instrument;

/// One of the two sides at the table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mover {
    /// The person sitting across the board (plays cubes).
    Human,
    /// The robot arm (plays cylinders).
    Robot,
}

impl Mover {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Mover::Human => Mover::Robot,
            Mover::Robot => Mover::Human,
        }
    }

    /// The cell value this side's pieces show up as.
    pub fn piece(self) -> CellValue {
        match self {
            Mover::Human => CellValue::Human,
            Mover::Robot => CellValue::Robot,
        }
    }
}

/// Content of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellValue {
    /// No piece.
    #[default]
    Empty,
    /// A human cube.
    Human,
    /// A robot cylinder.
    Robot,
}

impl CellValue {
    /// Returns the owner of the piece, if any.
    pub fn mover(self) -> Option<Mover> {
        match self {
            CellValue::Empty => None,
            CellValue::Human => Some(Mover::Human),
            CellValue::Robot => Some(Mover::Robot),
        }
    }

    /// Single-character notation used by [`Board`]'s `Display`/`FromStr`.
    pub fn symbol(self) -> char {
        match self {
            CellValue::Empty => '.',
            CellValue::Human => 'H',
            CellValue::Robot => 'R',
        }
    }

    fn from_symbol(c: char) -> Option<Self> {
        match c {
            '.' | '_' => Some(CellValue::Empty),
            'H' | 'h' => Some(CellValue::Human),
            'R' | 'r' => Some(CellValue::Robot),
            _ => None,
        }
    }
}

impl From<Mover> for CellValue {
    fn from(mover: Mover) -> Self {
        mover.piece()
    }
}

/// Canonical 3x3 board seen from the human's side, row-major.
///
/// Boards are immutable snapshots. New boards come from a decoded camera
/// frame or from [`Board::apply`] on a prior board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Board {
    cells: [CellValue; 9],
}

impl Board {
    /// A board with no pieces.
    pub const EMPTY: Board = Board {
        cells: [CellValue::Empty; 9],
    };

    /// Builds a board from nine cells in canonical row-major order.
    pub fn from_cells(cells: [CellValue; 9]) -> Self {
        Self { cells }
    }

    /// Returns the value at a position.
    pub fn get(&self, pos: Position) -> CellValue {
        self.cells[pos.to_index()]
    }

    /// All cells in canonical order.
    pub fn cells(&self) -> &[CellValue; 9] {
        &self.cells
    }

    /// True when the cell holds no piece.
    pub fn is_vacant(&self, pos: Position) -> bool {
        self.get(pos) == CellValue::Empty
    }

    /// True when no cell holds a piece.
    pub fn is_clear(&self) -> bool {
        self.cells.iter().all(|c| *c == CellValue::Empty)
    }

    /// True when every cell holds a piece.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| *c != CellValue::Empty)
    }

    /// Number of cells holding `value`.
    pub fn count(&self, value: CellValue) -> usize {
        self.cells.iter().filter(|c| **c == value).count()
    }

    /// Empty positions, in canonical order.
    pub fn vacant_positions(&self) -> impl Iterator<Item = Position> + '_ {
        Position::ALL.into_iter().filter(|pos| self.is_vacant(*pos))
    }

    /// Positions whose value differs between `self` and `other`.
    pub fn diff(&self, other: &Board) -> Vec<Position> {
        Position::ALL
            .into_iter()
            .filter(|pos| self.get(*pos) != other.get(*pos))
            .collect()
    }

    /// Returns the board that results from playing `mv` on this one.
    #[instrument(level = "trace")]
    pub fn apply(&self, mv: Move) -> Result<Board, MoveError> {
        if !self.is_vacant(mv.position) {
            return Err(MoveError::SquareOccupied(mv.position));
        }
        Ok(self.with(mv.position, mv.mover.piece()))
    }

    /// Unchecked placement for the search, which only ever targets vacant cells.
    pub(crate) fn with(&self, pos: Position, value: CellValue) -> Board {
        let mut cells = self.cells;
        cells[pos.to_index()] = value;
        Board { cells }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            if row > 0 {
                f.write_str("/")?;
            }
            for col in 0..3 {
                write!(f, "{}", self.cells[row * 3 + col].symbol())?;
            }
        }
        Ok(())
    }
}

/// Error parsing the compact board notation.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseBoardError {
    /// A character other than `H`, `R`, `.`, `/` or whitespace.
    #[display("Unexpected board symbol {symbol:?}")]
    UnexpectedSymbol {
        /// The offending character.
        symbol: char,
    },
    /// Not exactly nine cells.
    #[display("Expected 9 cells, found {found}")]
    WrongLength {
        /// Number of cells read.
        found: usize,
    },
}

impl FromStr for Board {
    type Err = ParseBoardError;

    /// Parses `"HR./.H./..R"`-style notation; `/` and whitespace are separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cells = [CellValue::Empty; 9];
        let mut found = 0;
        for c in s.chars().filter(|c| *c != '/' && !c.is_whitespace()) {
            let value = CellValue::from_symbol(c)
                .ok_or(ParseBoardError::UnexpectedSymbol { symbol: c })?;
            if found < 9 {
                cells[found] = value;
            }
            found += 1;
        }
        if found != 9 {
            return Err(ParseBoardError::WrongLength { found });
        }
        Ok(Board { cells })
    }
}

/// Result of evaluating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "winner")]
pub enum Outcome {
    /// No line is complete and cells remain.
    InProgress,
    /// Exactly one side owns a full line.
    Won(Mover),
    /// Full board, no line.
    Draw,
}

impl Outcome {
    /// True for `Won` and `Draw`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Mover> {
        match self {
            Outcome::Won(mover) => Some(*mover),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::InProgress => write!(f, "in progress"),
            Outcome::Won(mover) => write!(f, "{mover} wins"),
            Outcome::Draw => write!(f, "draw"),
        }
    }
}
