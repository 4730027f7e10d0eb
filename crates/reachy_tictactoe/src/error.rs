//! Fatal errors surfaced by the turn orchestrator.

use super::codec::CodecError;
use super::engine::EngineError;
use super::session::SessionError;
use derive_more::{Display, Error};
use tracing::instrument;

/// An external collaborator broke its contract, with location tracking.
///
/// Covers camera, actuator and telemetry failures alike. Never recovered
/// from inside the core.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Collaborator error: {} at {}:{}", message, file, line)]
pub struct CollaboratorError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl CollaboratorError {
    /// Creates a new collaborator error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Any failure that stops the orchestrator.
///
/// Rule violations never show up here; they restart the game instead.
#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum OrchestratorError {
    /// The codec rejected a frame or a classifier result.
    #[display("{source}")]
    Codec {
        /// Underlying codec error.
        source: CodecError,
    },
    /// Camera, actuator or telemetry failed.
    #[display("{source}")]
    Collaborator {
        /// Underlying collaborator error.
        source: CollaboratorError,
    },
    /// The decision engine was asked about a finished board.
    #[display("{source}")]
    Engine {
        /// Underlying engine error.
        source: EngineError,
    },
    /// The session refused an update the orchestrator believed valid.
    #[display("{source}")]
    Session {
        /// Underlying session error.
        source: SessionError,
    },
}

impl From<CodecError> for OrchestratorError {
    fn from(source: CodecError) -> Self {
        OrchestratorError::Codec { source }
    }
}

impl From<CollaboratorError> for OrchestratorError {
    fn from(source: CollaboratorError) -> Self {
        OrchestratorError::Collaborator { source }
    }
}

impl From<EngineError> for OrchestratorError {
    fn from(source: EngineError) -> Self {
        OrchestratorError::Engine { source }
    }
}

impl From<SessionError> for OrchestratorError {
    fn from(source: SessionError) -> Self {
        OrchestratorError::Session { source }
    }
}
