//! Reachy tic-tac-toe core.
//!
//! Everything a robot needs to play tic-tac-toe against a person across a
//! physical board, minus the hardware itself.
//!
//! # Architecture
//!
//! - **Codec**: camera frame to canonical board, with confidence thresholds
//!   and the 180° viewpoint transform
//! - **Transition**: classifies the change between two board reads
//! - **Rules**: win, draw and contested-board detection
//! - **Engine**: exhaustive game-tree search with a fixed tie-break order
//! - **Orchestrator**: the turn state machine that sequences perception,
//!   decisions and actuation
//! - **Safety**: thermal cooldown gating between games
//!
//! Hardware is reached only through the traits in [`collaborators`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod position;
mod types;

pub mod codec;
pub mod collaborators;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod invariants;
pub mod orchestrator;
pub mod rules;
pub mod safety;
pub mod session;
pub mod transition;

// Crate-level exports - Board model
pub use action::{Move, MoveError};
pub use position::Position;
pub use types::{Board, CellValue, Mover, Outcome, ParseBoardError};

// Crate-level exports - Perception
pub use codec::{
    BoardCodec, CellClassifier, Classification, CodecConfig, CodecError, DecodedFrame, Frame,
    FrameError, Region, Validity, ValidityClassifier,
};

// Crate-level exports - Decisions
pub use engine::{Decision, EngineError, choose_move, minimax_value};
pub use rules::{ContestedBoard, evaluate};
pub use transition::{Transition, Violation, validate};

// Crate-level exports - Orchestration
pub use collaborators::{Actuator, Camera, KeepAlive, Telemetry};
pub use config::{ConfigError, PlaygroundConfig};
pub use error::{CollaboratorError, OrchestratorError};
pub use events::{EventSink, GameEvent};
pub use orchestrator::{GameReport, Orchestrator, TurnConfig, TurnState};
pub use safety::{SafetyConfig, SafetyGovernor};
pub use session::{GameSession, SessionError};
