//! A simulated table: camera, classifiers, arm, thermal telemetry and a
//! human opponent sharing one world.
//!
//! The camera renders the world from the robot's side using the configured
//! cell regions, so the codec's mirroring is exercised for real. The human
//! only acts between captures: after the robot announces "your turn" they
//! reach in (a few frames with a hand over the board), then take their
//! action. After a game ends or the robot sweeps the board they clear it.

mod arm;
mod camera;
mod opponent;

pub use arm::{AntennaWiggle, PAWN_RACK, SimArm};
pub use camera::{IntensityCells, IntensityValidity, SimCamera, render};
pub use opponent::{HumanAction, Opponent};

use rand_pcg::Pcg64;
use reachy_tictactoe::{Board, CodecConfig, Move, Mover};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Frames showing a hand before the human's action lands.
pub const HAND_FRAMES: u32 = 2;

/// Starting motor temperature, in °C.
pub const AMBIENT_CELSIUS: f64 = 35.0;

/// Motors on the simulated arm.
pub const MOTORS: [&str; 4] = ["shoulder_pitch", "shoulder_roll", "elbow_pitch", "wrist_roll"];

/// What the human is busy with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumanTask {
    /// Watching.
    Idle,
    /// Reaching in to play their turn.
    Moving {
        /// Hand frames left before the action.
        frames_left: u32,
    },
    /// Reaching in to clear the board.
    Clearing {
        /// Hand frames left before the board is empty.
        frames_left: u32,
    },
}

/// Shared state of the simulated table.
#[derive(Debug)]
pub struct World {
    /// Pieces on the table, canonical orientation.
    pub board: Board,
    /// The human's current task.
    pub task: HumanTask,
    /// How the human plays.
    pub opponent: Opponent,
    /// Randomness for the human.
    pub rng: Pcg64,
    /// Pawns still in the robot's rack.
    pub pawns_left: usize,
    /// Motor temperatures.
    pub temperatures: BTreeMap<String, f64>,
    /// True while the arm is in its rest posture.
    pub resting: bool,
    /// Frames captured so far.
    pub frames: u64,
}

impl World {
    /// A clear table with a full rack and cold motors.
    pub fn new(opponent: Opponent, rng: Pcg64) -> Self {
        Self {
            board: Board::EMPTY,
            task: HumanTask::Idle,
            opponent,
            rng,
            pawns_left: PAWN_RACK,
            temperatures: MOTORS
                .iter()
                .map(|m| (m.to_string(), AMBIENT_CELSIUS))
                .collect(),
            resting: false,
            frames: 0,
        }
    }

    /// Advances the human by one camera frame. Returns true while a hand
    /// is over the board.
    pub fn step_human(&mut self) -> bool {
        match self.task {
            HumanTask::Idle => false,
            HumanTask::Moving { frames_left } if frames_left > 0 => {
                self.task = HumanTask::Moving {
                    frames_left: frames_left - 1,
                };
                true
            }
            HumanTask::Clearing { frames_left } if frames_left > 0 => {
                self.task = HumanTask::Clearing {
                    frames_left: frames_left - 1,
                };
                true
            }
            HumanTask::Moving { .. } => {
                let action = self.opponent.act(&self.board, &mut self.rng);
                match action {
                    Some(HumanAction::Place(position)) => {
                        self.board = self
                            .board
                            .apply(Move::new(position, Mover::Human))
                            .unwrap_or(self.board);
                    }
                    Some(HumanAction::Tamper(board)) => self.board = board,
                    None => {}
                }
                debug!(board = %self.board, "Human done");
                self.task = HumanTask::Idle;
                false
            }
            HumanTask::Clearing { .. } => {
                self.board = Board::EMPTY;
                self.pawns_left = PAWN_RACK;
                debug!("Human cleared the board");
                self.task = HumanTask::Idle;
                false
            }
        }
    }

    /// Asks the human to play their turn.
    pub fn request_move(&mut self) {
        self.task = HumanTask::Moving {
            frames_left: HAND_FRAMES,
        };
    }

    /// Asks the human to clear the board.
    pub fn request_clear(&mut self) {
        self.task = HumanTask::Clearing {
            frames_left: HAND_FRAMES,
        };
    }

    /// Hottest motor reading.
    pub fn hottest(&self) -> f64 {
        self.temperatures
            .values()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Handle to the shared world.
#[derive(Debug, Clone)]
pub struct SharedWorld(Arc<Mutex<World>>);

impl SharedWorld {
    /// Wraps a world.
    pub fn new(world: World) -> Self {
        Self(Arc::new(Mutex::new(world)))
    }

    /// Locks the world. A poisoned lock still yields the state.
    pub fn lock(&self) -> MutexGuard<'_, World> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A complete simulated table.
pub struct SimTable {
    /// The camera.
    pub camera: SimCamera,
    /// The arm, also the telemetry source.
    pub arm: SimArm,
    /// Cell classifier for the codec.
    pub cells: IntensityCells,
    /// Validity classifier for the codec.
    pub validity: IntensityValidity,
    /// Shared state, for inspection.
    pub world: SharedWorld,
}

impl SimTable {
    /// Builds a table whose camera renders with `codec`'s layout.
    pub fn new(codec: &CodecConfig, opponent: Opponent, rng: Pcg64) -> Self {
        let world = SharedWorld::new(World::new(opponent, rng));
        Self {
            camera: SimCamera::new(world.clone(), codec.clone()),
            arm: SimArm::new(world.clone()),
            cells: IntensityCells,
            validity: IntensityValidity,
            world,
        }
    }
}
