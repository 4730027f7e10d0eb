//! Simulated arm: pawn rack, scripted behaviors and motor heating.

use super::{AMBIENT_CELSIUS, SharedWorld};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reachy_tictactoe::{Actuator, Board, CollaboratorError, KeepAlive, Move, Mover, Telemetry};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, instrument, trace};

/// Pawns the robot starts each game with.
pub const PAWN_RACK: usize = 5;

/// Heat added to every motor by a grab-and-place motion.
const HEAT_PER_MOVE: f64 = 0.6;

/// Heat added by a gesture or idle animation.
const HEAT_PER_GESTURE: f64 = 0.05;

/// Cooling per telemetry read while resting.
const COOLING_PER_POLL: f64 = 2.5;

/// The simulated arm. Also reports its own motor temperatures.
pub struct SimArm {
    world: SharedWorld,
    antennas: Arc<AntennaWiggle>,
}

impl SimArm {
    /// Creates an arm acting on `world`.
    pub fn new(world: SharedWorld) -> Self {
        Self {
            world,
            antennas: Arc::new(AntennaWiggle::default()),
        }
    }

    /// The keep-alive behavior, for inspection.
    pub fn antennas(&self) -> &AntennaWiggle {
        &self.antennas
    }

    fn play(&self, trajectory: &str, heat: f64) {
        let mut world = self.world.lock();
        world.resting = false;
        for t in world.temperatures.values_mut() {
            *t += heat;
        }
        trace!(trajectory, hottest = world.hottest(), "Trajectory played");
    }
}

#[async_trait]
impl Actuator for SimArm {
    #[instrument(skip(self), fields(mv = %mv))]
    async fn execute(&mut self, mv: Move) -> Result<Board, CollaboratorError> {
        if mv.mover != Mover::Robot {
            return Err(CollaboratorError::new(format!(
                "Arm asked to place a {} piece",
                mv.mover
            )));
        }

        let (pawn, slot) = {
            let mut world = self.world.lock();
            if world.pawns_left == 0 {
                return Err(CollaboratorError::new("Pawn rack is empty"));
            }
            let pawn = PAWN_RACK - world.pawns_left + 1;
            // Slots are numbered 1-9 from the robot's side of the table.
            let slot = mv.position.mirrored().to_index() + 1;
            world.board = world
                .board
                .apply(mv)
                .map_err(|e| CollaboratorError::new(format!("Cannot place pawn: {}", e)))?;
            world.pawns_left -= 1;
            (pawn, slot)
        };

        self.play(&format!("grab_{pawn}"), HEAT_PER_MOVE / 2.0);
        self.play(&format!("put_{slot}"), HEAT_PER_MOVE / 2.0);
        self.play("back_to_base", 0.0);
        let board = self.world.lock().board;
        debug!(pawn, slot, board = %board, "Pawn placed");
        Ok(board)
    }

    #[instrument(skip(self))]
    async fn reshuffle(&mut self) -> Result<(), CollaboratorError> {
        {
            let mut world = self.world.lock();
            let mut cells = *world.board.cells();
            cells.shuffle(&mut world.rng);
            world.board = Board::from_cells(cells);
            world.request_clear();
        }
        self.play("shuffle_board", HEAT_PER_MOVE);
        info!("Board shuffled");
        Ok(())
    }

    async fn run_idle(&mut self) -> Result<(), CollaboratorError> {
        self.play("idle", HEAT_PER_GESTURE);
        Ok(())
    }

    async fn run_celebration(&mut self) -> Result<(), CollaboratorError> {
        self.play("win", HEAT_PER_GESTURE);
        self.world.lock().request_clear();
        Ok(())
    }

    async fn run_defeat(&mut self) -> Result<(), CollaboratorError> {
        self.play("defeat", HEAT_PER_GESTURE);
        self.world.lock().request_clear();
        Ok(())
    }

    async fn run_draw(&mut self) -> Result<(), CollaboratorError> {
        self.play("draw", HEAT_PER_GESTURE);
        self.world.lock().request_clear();
        Ok(())
    }

    async fn announce_turn(&mut self, mover: Mover) -> Result<(), CollaboratorError> {
        match mover {
            Mover::Robot => self.play("my_turn", HEAT_PER_GESTURE),
            Mover::Human => {
                self.play("your_turn", HEAT_PER_GESTURE);
                self.world.lock().request_move();
            }
        }
        Ok(())
    }

    async fn rest(&mut self) -> Result<(), CollaboratorError> {
        self.play("rest", 0.0);
        self.world.lock().resting = true;
        Ok(())
    }

    fn keep_alive(&self) -> Option<Arc<dyn KeepAlive>> {
        Some(self.antennas.clone())
    }
}

#[async_trait]
impl Telemetry for SimArm {
    async fn actuator_temperatures(&mut self) -> Result<BTreeMap<String, f64>, CollaboratorError> {
        let mut world = self.world.lock();
        if world.resting {
            for t in world.temperatures.values_mut() {
                *t = (*t - COOLING_PER_POLL).max(AMBIENT_CELSIUS);
            }
        }
        Ok(world.temperatures.clone())
    }
}

/// Antenna motion kept alive while the arm rests.
#[derive(Debug, Default)]
pub struct AntennaWiggle {
    ticks: AtomicU64,
}

impl AntennaWiggle {
    /// Number of ticks played so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl KeepAlive for AntennaWiggle {
    async fn tick(&self) {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        trace!(tick, "Antenna wiggle");
    }
}
