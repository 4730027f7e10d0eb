//! Scripted fake table shared by the orchestrator tests.
//!
//! Frames are 9x2 pixels: the top row holds one pixel per camera cell
//! (0 empty, 1 human, 2 robot) and the bottom row is the validity region
//! (1 valid, 0 hand in view).

#![allow(dead_code)]

use async_trait::async_trait;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use reachy_tictactoe::{
    Actuator, Board, BoardCodec, Camera, CellClassifier, CellValue, Classification, CodecConfig,
    CollaboratorError, EventSink, Frame, KeepAlive, Move, Mover, Orchestrator, Position, Region,
    Telemetry, TurnConfig, Validity, ValidityClassifier, choose_move,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What the camera sees on its next capture.
#[derive(Debug, Clone)]
pub enum Scene {
    /// Current board, unchanged.
    Show,
    /// A hand covers the board.
    Hand,
    /// The human places a cube.
    Place(Position),
    /// The board is rearranged by hand.
    Set(Board),
}

#[derive(Debug, Default)]
pub struct TableState {
    pub board: Board,
    pub script: VecDeque<Scene>,
    pub human_on_turn: bool,
    pub calls: Vec<String>,
    pub captures: usize,
    pub lift_on_execute: bool,
    pub temperatures: VecDeque<BTreeMap<String, f64>>,
}

pub type Table = Arc<Mutex<TableState>>;

pub fn table(board: Board, script: Vec<Scene>) -> Table {
    Arc::new(Mutex::new(TableState {
        board,
        script: script.into(),
        ..TableState::default()
    }))
}

pub fn calls(table: &Table, name: &str) -> usize {
    table
        .lock()
        .unwrap()
        .calls
        .iter()
        .filter(|c| c.as_str() == name)
        .count()
}

const MAX_CAPTURES: usize = 1_000;

pub struct FakeCamera(pub Table);

#[async_trait]
impl Camera for FakeCamera {
    async fn capture(&mut self) -> Result<Frame, CollaboratorError> {
        let mut state = self.0.lock().unwrap();
        state.captures += 1;
        if state.captures > MAX_CAPTURES {
            return Err(CollaboratorError::new("camera script ran away"));
        }

        let scene = match state.script.pop_front() {
            Some(scene) => scene,
            None if state.human_on_turn => {
                let decision = choose_move(&state.board, Mover::Human)
                    .map_err(|e| CollaboratorError::new(e.to_string()))?;
                Scene::Place(decision.mv.position)
            }
            None => Scene::Show,
        };

        let mut valid = true;
        match scene {
            Scene::Show => {}
            Scene::Hand => valid = false,
            Scene::Place(position) => {
                state.board = state
                    .board
                    .apply(Move::new(position, Mover::Human))
                    .map_err(|e| CollaboratorError::new(e.to_string()))?;
                state.human_on_turn = false;
            }
            Scene::Set(board) => {
                state.board = board;
                state.human_on_turn = false;
            }
        }
        Ok(render(&state.board, valid))
    }
}

/// Draws `board` as the robot's camera sees it.
pub fn render(board: &Board, valid: bool) -> Frame {
    let mut pixels = vec![0u8; 18];
    for position in Position::ALL {
        let code = match board.get(position) {
            CellValue::Empty => 0,
            CellValue::Human => 1,
            CellValue::Robot => 2,
        };
        pixels[position.mirrored().to_index()] = code;
    }
    pixels[9..].fill(u8::from(valid));
    Frame::new(9, 2, pixels).unwrap()
}

pub fn codec_config() -> CodecConfig {
    let cell = |index: usize| Region::new(index, index + 1, 0, 1);
    CodecConfig::new(
        0.9,
        0.65,
        [
            [cell(0), cell(1), cell(2)],
            [cell(3), cell(4), cell(5)],
            [cell(6), cell(7), cell(8)],
        ],
        Region::new(0, 9, 1, 2),
    )
}

pub struct PixelCells;

impl CellClassifier for PixelCells {
    fn classify_cell(&self, image: &Frame) -> Vec<Classification<CellValue>> {
        let label = match image.pixels()[0] {
            1 => CellValue::Human,
            2 => CellValue::Robot,
            _ => CellValue::Empty,
        };
        vec![
            Classification::new(CellValue::Empty, 0.01),
            Classification::new(label, 0.98),
        ]
    }
}

pub struct PixelValidity;

impl ValidityClassifier for PixelValidity {
    fn classify_validity(&self, image: &Frame) -> Vec<Classification<Validity>> {
        if image.pixels().iter().all(|p| *p == 1) {
            vec![Classification::new(Validity::Valid, 0.97)]
        } else {
            vec![Classification::new(Validity::Invalid, 0.97)]
        }
    }
}

pub struct FakeArm {
    pub table: Table,
    pub ticks: Arc<AtomicUsize>,
    pub with_keep_alive: bool,
}

impl FakeArm {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            ticks: Arc::new(AtomicUsize::new(0)),
            with_keep_alive: false,
        }
    }

    fn log(&self, call: &str) {
        self.table.lock().unwrap().calls.push(call.to_string());
    }
}

#[async_trait]
impl Actuator for FakeArm {
    async fn execute(&mut self, mv: Move) -> Result<Board, CollaboratorError> {
        self.log("execute");
        let mut state = self.table.lock().unwrap();
        state.board = state
            .board
            .apply(mv)
            .map_err(|e| CollaboratorError::new(e.to_string()))?;
        if state.lift_on_execute {
            // Someone lifts the piece before the arm confirms it.
            state.lift_on_execute = false;
            return Ok(Board::EMPTY);
        }
        Ok(state.board)
    }

    async fn reshuffle(&mut self) -> Result<(), CollaboratorError> {
        self.log("reshuffle");
        // The human resets the board after the sweep.
        self.table.lock().unwrap().script.push_front(Scene::Set(Board::EMPTY));
        Ok(())
    }

    async fn run_idle(&mut self) -> Result<(), CollaboratorError> {
        self.log("idle");
        Ok(())
    }

    async fn run_celebration(&mut self) -> Result<(), CollaboratorError> {
        self.log("celebration");
        Ok(())
    }

    async fn run_defeat(&mut self) -> Result<(), CollaboratorError> {
        self.log("defeat");
        Ok(())
    }

    async fn run_draw(&mut self) -> Result<(), CollaboratorError> {
        self.log("draw");
        Ok(())
    }

    async fn announce_turn(&mut self, mover: Mover) -> Result<(), CollaboratorError> {
        self.log(&format!("announce_{mover}"));
        if mover == Mover::Human {
            self.table.lock().unwrap().human_on_turn = true;
        }
        Ok(())
    }

    async fn rest(&mut self) -> Result<(), CollaboratorError> {
        self.log("rest");
        Ok(())
    }

    fn keep_alive(&self) -> Option<Arc<dyn KeepAlive>> {
        self.with_keep_alive
            .then(|| Arc::new(Ticker(self.ticks.clone())) as Arc<dyn KeepAlive>)
    }
}

#[async_trait]
impl Telemetry for FakeArm {
    async fn actuator_temperatures(&mut self) -> Result<BTreeMap<String, f64>, CollaboratorError> {
        let mut state = self.table.lock().unwrap();
        match state.temperatures.len() {
            0 => Ok(BTreeMap::new()),
            1 => Ok(state.temperatures[0].clone()),
            _ => Ok(state.temperatures.pop_front().unwrap_or_default()),
        }
    }
}

pub struct Ticker(pub Arc<AtomicUsize>);

#[async_trait]
impl KeepAlive for Ticker {
    async fn tick(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub type FakeOrchestrator = Orchestrator<FakeCamera, FakeArm, PixelCells, PixelValidity, Pcg64>;

/// An orchestrator over a fresh table; `robot_first` fixes the coin flip.
pub fn orchestrator(table: &Table, robot_first: bool, events: EventSink) -> FakeOrchestrator {
    let probability = if robot_first { 1.0 } else { 0.0 };
    Orchestrator::new(
        FakeCamera(table.clone()),
        FakeArm::new(table.clone()),
        BoardCodec::new(PixelCells, PixelValidity, codec_config()),
        TurnConfig::new(probability),
        Pcg64::seed_from_u64(7),
        events,
    )
}
