//! Thermal safety gating between games.
//!
//! Play pauses when any actuator runs hotter than the pause threshold and
//! resumes only once every actuator is below the lower resume threshold.
//! While paused the arm rests and an optional keep-alive behavior runs on
//! a background task that is stopped and joined before play continues.

use super::CollaboratorError;
use super::collaborators::{Actuator, KeepAlive, Telemetry};
use super::events::{EventSink, GameEvent};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

fn default_pause_above() -> f64 {
    50.0
}

fn default_resume_below() -> f64 {
    45.0
}

fn default_poll_interval_ms() -> u64 {
    30_000
}

fn default_keep_alive_interval_ms() -> u64 {
    10
}

/// Hysteresis band and polling cadence.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Cooldown starts when any actuator is above this, in °C.
    #[serde(default = "default_pause_above")]
    pause_above_celsius: f64,

    /// Cooldown ends when every actuator is below this, in °C.
    #[serde(default = "default_resume_below")]
    resume_below_celsius: f64,

    /// Telemetry polling interval while cooling.
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,

    /// Keep-alive tick interval while cooling.
    #[serde(default = "default_keep_alive_interval_ms")]
    keep_alive_interval_ms: u64,
}

impl SafetyConfig {
    /// Creates a configuration from explicit values.
    pub fn new(
        pause_above_celsius: f64,
        resume_below_celsius: f64,
        poll_interval_ms: u64,
        keep_alive_interval_ms: u64,
    ) -> Self {
        Self {
            pause_above_celsius,
            resume_below_celsius,
            poll_interval_ms,
            keep_alive_interval_ms,
        }
    }

    /// Polling interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Keep-alive interval as a duration.
    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_millis(self.keep_alive_interval_ms)
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self::new(
            default_pause_above(),
            default_resume_below(),
            default_poll_interval_ms(),
            default_keep_alive_interval_ms(),
        )
    }
}

/// Decides when play must pause for the motors to cool.
#[derive(Debug, Clone, Default)]
pub struct SafetyGovernor {
    config: SafetyConfig,
}

impl SafetyGovernor {
    /// Creates a governor with the given thresholds.
    pub fn new(config: SafetyConfig) -> Self {
        Self { config }
    }

    /// The governor's configuration.
    pub fn config(&self) -> &SafetyConfig {
        &self.config
    }

    /// True if any actuator is strictly above the pause threshold.
    pub fn needs_cooldown(&self, temperatures: &BTreeMap<String, f64>) -> bool {
        temperatures
            .values()
            .any(|t| *t > self.config.pause_above_celsius)
    }

    /// True if every actuator is strictly below the resume threshold.
    pub fn is_cooled(&self, temperatures: &BTreeMap<String, f64>) -> bool {
        temperatures
            .values()
            .all(|t| *t < self.config.resume_below_celsius)
    }

    /// Blocks until the arm is cool enough to start another game.
    ///
    /// Returns how long play was paused, or `None` if no cooldown was
    /// needed.
    #[instrument(skip_all)]
    pub async fn gate<H>(
        &self,
        hardware: &mut H,
        events: &EventSink,
    ) -> Result<Option<Duration>, CollaboratorError>
    where
        H: Actuator + Telemetry,
    {
        let temperatures = read(hardware).await?;
        if !self.needs_cooldown(&temperatures) {
            debug!(?temperatures, "Temperatures nominal");
            return Ok(None);
        }

        warn!(?temperatures, "Actuators too hot, pausing play");
        events.emit(GameEvent::CooldownStarted {
            temperatures: temperatures.clone(),
        });
        hardware.rest().await?;

        let started = Instant::now();
        let (stop, stopped) = watch::channel(false);
        let keep_alive = hardware
            .keep_alive()
            .map(|behavior| spawn_keep_alive(behavior, self.config.keep_alive_interval(), stopped));

        let result = self.wait_until_cooled(hardware).await;

        // Stop and join the keep-alive task before anything else moves.
        let _ = stop.send(true);
        if let Some(handle) = keep_alive
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Keep-alive task ended abnormally");
        }

        let temperatures = result?;
        let waited = started.elapsed();
        info!(?temperatures, waited_ms = waited.as_millis() as u64, "Cooldown finished");
        events.emit(GameEvent::CooldownFinished {
            temperatures,
            waited_ms: waited.as_millis() as u64,
        });
        Ok(Some(waited))
    }

    async fn wait_until_cooled<T: Telemetry>(
        &self,
        telemetry: &mut T,
    ) -> Result<BTreeMap<String, f64>, CollaboratorError> {
        loop {
            tokio::time::sleep(self.config.poll_interval()).await;
            let temperatures = read(telemetry).await?;
            if self.is_cooled(&temperatures) {
                return Ok(temperatures);
            }
            debug!(?temperatures, "Still cooling");
        }
    }
}

/// Reads telemetry, rejecting empty or non-finite readings.
async fn read<T: Telemetry>(telemetry: &mut T) -> Result<BTreeMap<String, f64>, CollaboratorError> {
    let temperatures = telemetry.actuator_temperatures().await?;
    if temperatures.is_empty() {
        return Err(CollaboratorError::new("Telemetry returned no actuators"));
    }
    if let Some((id, t)) = temperatures.iter().find(|(_, t)| !t.is_finite()) {
        return Err(CollaboratorError::new(format!(
            "Telemetry returned {t} for actuator {id}"
        )));
    }
    Ok(temperatures)
}

fn spawn_keep_alive(
    behavior: Arc<dyn KeepAlive>,
    interval: Duration,
    mut stopped: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("Keep-alive started");
        loop {
            tokio::select! {
                changed = stopped.changed() => {
                    if changed.is_err() || *stopped.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(interval) => behavior.tick().await,
            }
        }
        debug!("Keep-alive stopped");
    })
}
