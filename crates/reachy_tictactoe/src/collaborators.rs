//! Interfaces to the hardware around the core.
//!
//! The core never talks to a camera, motor or thermometer directly. The
//! binary (or a test) supplies implementations of these traits, configured
//! at construction time.

use super::{Board, CollaboratorError, Frame, Move, Mover};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Source of camera frames.
#[async_trait]
pub trait Camera: Send {
    /// Captures the current view of the board.
    async fn capture(&mut self) -> Result<Frame, CollaboratorError>;
}

/// The robot arm and its scripted behaviors.
///
/// Behaviors other than [`Actuator::execute`] have no board effects the
/// core can observe.
#[async_trait]
pub trait Actuator: Send {
    /// Physically places the robot's piece and returns the confirmed board.
    async fn execute(&mut self, mv: Move) -> Result<Board, CollaboratorError>;

    /// Sweeps the board so the human can reset it after a violation.
    async fn reshuffle(&mut self) -> Result<(), CollaboratorError>;

    /// Plays an idle animation while waiting.
    async fn run_idle(&mut self) -> Result<(), CollaboratorError>;

    /// Plays the robot-wins behavior.
    async fn run_celebration(&mut self) -> Result<(), CollaboratorError>;

    /// Plays the human-wins behavior.
    async fn run_defeat(&mut self) -> Result<(), CollaboratorError>;

    /// Plays the draw behavior.
    async fn run_draw(&mut self) -> Result<(), CollaboratorError>;

    /// Signals whose turn begins ("my turn" or "your turn").
    async fn announce_turn(&mut self, mover: Mover) -> Result<(), CollaboratorError>;

    /// Moves to the rest posture, used before a cooldown.
    async fn rest(&mut self) -> Result<(), CollaboratorError>;

    /// Background behavior to keep alive during a cooldown, if any.
    fn keep_alive(&self) -> Option<Arc<dyn KeepAlive>> {
        None
    }
}

/// Actuator temperature readings.
#[async_trait]
pub trait Telemetry: Send {
    /// Temperature per actuator id, in °C. Must not be empty.
    async fn actuator_temperatures(&mut self) -> Result<BTreeMap<String, f64>, CollaboratorError>;
}

/// A small background motion run on the cooldown keep-alive task.
///
/// Must not touch any game state.
#[async_trait]
pub trait KeepAlive: Send + Sync {
    /// One step of the keep-alive motion.
    async fn tick(&self);
}
