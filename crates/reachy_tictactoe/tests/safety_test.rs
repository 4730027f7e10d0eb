//! Cooldown gating against fake telemetry.

mod common;

use common::{FakeArm, calls, table};
use reachy_tictactoe::{Board, EventSink, GameEvent, SafetyConfig, SafetyGovernor};
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn reading(values: &[(&str, f64)]) -> BTreeMap<String, f64> {
    values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn governor() -> SafetyGovernor {
    SafetyGovernor::new(SafetyConfig::new(50.0, 45.0, 20, 1))
}

#[tokio::test]
async fn test_cool_arm_passes_straight_through() {
    let table = table(Board::EMPTY, vec![]);
    table
        .lock()
        .unwrap()
        .temperatures
        .push_back(reading(&[("shoulder", 41.0), ("elbow", 38.5)]));
    let mut arm = FakeArm::new(table.clone());

    let paused = governor()
        .gate(&mut arm, &EventSink::disabled())
        .await
        .unwrap();
    assert_eq!(paused, None);
    assert_eq!(calls(&table, "rest"), 0);
}

#[tokio::test]
async fn test_hot_arm_rests_until_below_resume_threshold() {
    let table = table(Board::EMPTY, vec![]);
    {
        let mut state = table.lock().unwrap();
        for t in [55.0, 52.0, 47.5, 44.0] {
            state
                .temperatures
                .push_back(reading(&[("shoulder", t), ("elbow", 30.0)]));
        }
    }
    let mut arm = FakeArm::new(table.clone());
    arm.with_keep_alive = true;
    let ticks = arm.ticks.clone();
    let (events, mut rx) = EventSink::channel();

    let paused = governor().gate(&mut arm, &events).await.unwrap();
    assert!(paused.is_some_and(|d| d >= Duration::from_millis(60)));
    assert_eq!(calls(&table, "rest"), 1);

    // The keep-alive ran while cooling and is stopped afterwards.
    let after_gate = ticks.load(Ordering::SeqCst);
    assert!(after_gate > 0);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), after_gate);

    assert!(matches!(rx.try_recv(), Ok(GameEvent::CooldownStarted { .. })));
    match rx.try_recv() {
        Ok(GameEvent::CooldownFinished { temperatures, .. }) => {
            assert_eq!(temperatures["shoulder"], 44.0);
        }
        other => panic!("Expected CooldownFinished, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_telemetry_is_a_contract_breach() {
    let table = table(Board::EMPTY, vec![]);
    let mut arm = FakeArm::new(table);

    let result = governor().gate(&mut arm, &EventSink::disabled()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_nan_reading_is_a_contract_breach() {
    let table = table(Board::EMPTY, vec![]);
    table
        .lock()
        .unwrap()
        .temperatures
        .push_back(reading(&[("wrist", f64::NAN)]));
    let mut arm = FakeArm::new(table);

    let result = governor().gate(&mut arm, &EventSink::disabled()).await;
    assert!(result.is_err());
}
