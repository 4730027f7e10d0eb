//! The multi-game loop around the orchestrator.

use crate::sim::{Opponent, SimTable};
use crate::summary::Summary;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use reachy_tictactoe::{
    BoardCodec, EventSink, Orchestrator, OrchestratorError, PlaygroundConfig, SafetyGovernor,
};
use tokio::sync::watch;
use tracing::{info, instrument};

/// Options for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayOptions {
    /// Games to play; `None` plays until shut down.
    pub games: Option<u64>,
    /// How the simulated human plays.
    pub opponent: Opponent,
    /// Seed for all randomness; `None` picks one.
    pub seed: Option<u64>,
}

/// Plays games on a simulated table until `games` are done or `shutdown`
/// turns true. Shutdown is checked between games.
#[instrument(skip_all, fields(opponent = %options.opponent, games = ?options.games))]
pub async fn run(
    config: &PlaygroundConfig,
    options: &PlayOptions,
    events: EventSink,
    shutdown: watch::Receiver<bool>,
) -> Result<Summary, OrchestratorError> {
    let seed = options.seed.unwrap_or_else(|| rand::rng().random());
    info!(seed, "Seeding run");

    let table = SimTable::new(
        config.codec(),
        options.opponent,
        Pcg64::seed_from_u64(seed.wrapping_add(1)),
    );
    let codec = BoardCodec::new(table.cells, table.validity, config.codec().clone());
    let governor = SafetyGovernor::new(config.safety().clone());
    let mut orchestrator = Orchestrator::new(
        table.camera,
        table.arm,
        codec,
        config.turns().clone(),
        Pcg64::seed_from_u64(seed),
        events.clone(),
    );

    let mut summary = Summary::default();
    while options.games.is_none_or(|n| summary.games < n) {
        if *shutdown.borrow() {
            info!("Shutdown requested");
            break;
        }
        if governor
            .gate(orchestrator.actuator_mut(), &events)
            .await?
            .is_some()
        {
            summary.cooldowns += 1;
        }

        let report = orchestrator.play_game().await?;
        summary.record(&report);
        info!(
            game = summary.games,
            outcome = %report.outcome(),
            restarts = report.restarts(),
            "Game finished"
        );
    }
    Ok(summary)
}
