//! Turn orchestrator: the state machine that runs one game at the table.
//!
//! ```text
//! WaitingForClear -> CoinFlip -> Evaluating <-> {HumanTurnWait, RobotTurnAct}
//!                                    |
//!                                 Terminal -> (next game) WaitingForClear
//! ```
//!
//! The orchestrator is the only writer of the [`GameSession`]. A rule
//! violation discards the session, commands a reshuffle and starts over
//! from `WaitingForClear` without returning to the caller. That includes
//! a board disturbed while the robot was placing its piece. Collaborator
//! and codec failures stop the run.

use super::codec::{BoardCodec, CellClassifier, DecodedFrame, ValidityClassifier};
use super::collaborators::{Actuator, Camera};
use super::events::{EventSink, GameEvent};
use super::session::{GameSession, SessionError};
use super::transition::{self, Transition, Violation};
use super::{Board, Move, Mover, OrchestratorError, Outcome, engine};
use derive_getters::Getters;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// States of the turn orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TurnState {
    /// Waiting for a clear board and a sane frame.
    WaitingForClear,
    /// Picking the first mover.
    CoinFlip,
    /// Waiting for the human's piece to appear.
    HumanTurnWait,
    /// Choosing and placing the robot's piece.
    RobotTurnAct,
    /// Checking for a result.
    Evaluating,
    /// The game has a result.
    Terminal,
}

fn default_robot_first_probability() -> f64 {
    0.5
}

/// Coin-flip settings.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Probability that the robot moves first.
    #[serde(default = "default_robot_first_probability")]
    robot_first_probability: f64,
}

impl TurnConfig {
    /// Creates a configuration with the given robot-first probability.
    pub fn new(robot_first_probability: f64) -> Self {
        Self {
            robot_first_probability,
        }
    }
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self::new(default_robot_first_probability())
    }
}

/// Summary of one finished game.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct GameReport {
    /// Final result; never `InProgress`.
    outcome: Outcome,
    /// Coin-flip winner of the game that finished.
    first_mover: Mover,
    /// Moves of the game that finished.
    moves: Vec<Move>,
    /// Final board.
    board: Board,
    /// Games aborted by rule violations before this one finished.
    restarts: u32,
}

/// How a session ended.
enum SessionEnd {
    Finished(Outcome),
    Aborted(Violation),
}

/// Drives games against a camera and an actuator.
pub struct Orchestrator<Cam, A, C, V, R> {
    camera: Cam,
    actuator: A,
    codec: BoardCodec<C, V>,
    turns: TurnConfig,
    rng: R,
    events: EventSink,
    state: TurnState,
}

impl<Cam, A, C, V, R> Orchestrator<Cam, A, C, V, R>
where
    Cam: Camera,
    A: Actuator,
    C: CellClassifier,
    V: ValidityClassifier,
    R: Rng + Send,
{
    /// Creates an orchestrator in `WaitingForClear`.
    pub fn new(
        camera: Cam,
        actuator: A,
        codec: BoardCodec<C, V>,
        turns: TurnConfig,
        rng: R,
        events: EventSink,
    ) -> Self {
        Self {
            camera,
            actuator,
            codec,
            turns,
            rng,
            events,
            state: TurnState::WaitingForClear,
        }
    }

    /// Current state.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// The actuator.
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Mutable access to the actuator, for the safety gate between games.
    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    /// The camera.
    pub fn camera(&self) -> &Cam {
        &self.camera
    }

    /// Plays one game to a result, restarting after every rule violation.
    #[instrument(skip(self))]
    pub async fn play_game(&mut self) -> Result<GameReport, OrchestratorError> {
        let mut restarts = 0;
        loop {
            self.enter(TurnState::WaitingForClear);
            self.wait_for_clear().await?;

            self.enter(TurnState::CoinFlip);
            let first_mover = self.coin_flip();
            let mut session = GameSession::start(first_mover);
            info!(%first_mover, restarts, "Game started");
            self.events.emit(GameEvent::GameStarted { first_mover });

            match self.run_session(&mut session).await? {
                SessionEnd::Finished(outcome) => {
                    self.enter(TurnState::Terminal);
                    self.finish(&session, outcome).await?;
                    return Ok(GameReport {
                        outcome,
                        first_mover,
                        moves: session.history().to_vec(),
                        board: *session.board(),
                        restarts,
                    });
                }
                SessionEnd::Aborted(violation) => {
                    warn!(
                        %violation,
                        board = %session.board(),
                        "Rule violation, reshuffling and restarting"
                    );
                    self.events.emit(GameEvent::GameAborted {
                        violation,
                        board: *session.board(),
                    });
                    self.actuator.reshuffle().await?;
                    restarts += 1;
                }
            }
        }
    }

    fn enter(&mut self, to: TurnState) {
        if self.state == to {
            return;
        }
        debug!(from = %self.state, %to, "State change");
        self.events.emit(GameEvent::StateChanged {
            from: self.state,
            to,
        });
        self.state = to;
    }

    fn coin_flip(&mut self) -> Mover {
        let draw: f64 = self.rng.random();
        if draw < *self.turns.robot_first_probability() {
            Mover::Robot
        } else {
            Mover::Human
        }
    }

    /// Captures and decodes one frame.
    async fn read(&mut self) -> Result<DecodedFrame, OrchestratorError> {
        let frame = self.camera.capture().await?;
        let decoded = self.codec.decode(&frame)?;
        self.events.emit(GameEvent::BoardRead {
            board: decoded.board,
            sane: decoded.sane,
            validity: decoded.validity.label,
            confidence: decoded.validity.confidence,
        });
        Ok(decoded)
    }

    async fn wait_for_clear(&mut self) -> Result<(), OrchestratorError> {
        loop {
            let decoded = self.read().await?;
            if decoded.sane && decoded.board.is_clear() {
                debug!("Board is clear");
                return Ok(());
            }
            self.actuator.run_idle().await?;
        }
    }

    async fn run_session(
        &mut self,
        session: &mut GameSession,
    ) -> Result<SessionEnd, OrchestratorError> {
        loop {
            self.enter(TurnState::Evaluating);
            let outcome = session.outcome();
            if outcome.is_terminal() {
                return Ok(SessionEnd::Finished(outcome));
            }

            let step = match session.to_move() {
                Mover::Human => {
                    self.enter(TurnState::HumanTurnWait);
                    self.human_turn(session).await?
                }
                Mover::Robot => {
                    self.enter(TurnState::RobotTurnAct);
                    self.robot_turn(session).await?
                }
            };
            if let Some(violation) = step {
                return Ok(SessionEnd::Aborted(violation));
            }
        }
    }

    /// Polls until the human's move is seen. Returns a violation if the
    /// board changed in any other way.
    async fn human_turn(
        &mut self,
        session: &mut GameSession,
    ) -> Result<Option<Violation>, OrchestratorError> {
        self.actuator.announce_turn(Mover::Human).await?;
        loop {
            let decoded = self.read().await?;
            if !decoded.sane {
                continue;
            }

            let transition = transition::validate(session.board(), &decoded.board, Mover::Human);
            self.events.emit(GameEvent::TransitionDecided {
                prev: *session.board(),
                curr: decoded.board,
                expected: Mover::Human,
                transition: transition.clone(),
            });

            match transition {
                Transition::NoChange => self.actuator.run_idle().await?,
                Transition::LegalMove { position } => {
                    let mv = Move::new(position, Mover::Human);
                    return accept(session, mv, decoded.board);
                }
                Transition::Violation { violation } => return Ok(Some(violation)),
            }
        }
    }

    /// Chooses, executes and records the robot's move.
    ///
    /// The board confirmed by the actuator is the ground truth. If it is
    /// not the last board plus the commanded piece, the board was disturbed
    /// during the move and the game is aborted.
    async fn robot_turn(
        &mut self,
        session: &mut GameSession,
    ) -> Result<Option<Violation>, OrchestratorError> {
        self.actuator.announce_turn(Mover::Robot).await?;

        let decision = engine::choose_move(session.board(), Mover::Robot)?;
        self.events.emit(GameEvent::MoveChosen {
            mv: decision.mv,
            value: decision.value,
        });

        let board = self.actuator.execute(decision.mv).await?;
        self.events.emit(GameEvent::MoveExecuted {
            mv: decision.mv,
            board,
        });

        let transition = transition::validate(session.board(), &board, Mover::Robot);
        self.events.emit(GameEvent::TransitionDecided {
            prev: *session.board(),
            curr: board,
            expected: Mover::Robot,
            transition: transition.clone(),
        });

        if let Some(violation) = transition.placement_violation(decision.mv.position) {
            warn!(%violation, mv = %decision.mv, %board, "Board disturbed during robot move");
            return Ok(Some(violation));
        }
        accept(session, decision.mv, board)
    }

    async fn finish(
        &mut self,
        session: &GameSession,
        outcome: Outcome,
    ) -> Result<(), OrchestratorError> {
        info!(%outcome, moves = session.history().len(), "Game over");
        self.events.emit(GameEvent::GameOver {
            outcome,
            board: *session.board(),
            moves: session.history().len(),
        });
        match outcome {
            Outcome::Won(Mover::Robot) => self.actuator.run_celebration().await?,
            Outcome::Won(Mover::Human) => self.actuator.run_defeat().await?,
            Outcome::Draw => self.actuator.run_draw().await?,
            Outcome::InProgress => {}
        }
        Ok(())
    }
}

/// Records a validated move; a contested board counts as a violation.
fn accept(
    session: &mut GameSession,
    mv: Move,
    board: Board,
) -> Result<Option<Violation>, OrchestratorError> {
    match session.accept(mv, board) {
        Ok(_) => Ok(None),
        Err(SessionError::Contested { .. }) => Ok(Some(Violation::ContestedBoard)),
        Err(e) => Err(e.into()),
    }
}
