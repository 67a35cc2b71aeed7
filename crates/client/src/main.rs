//! Headless battle client.
//!
//! Composition root: loads configuration, sets up logging, builds the
//! runtime around the scenario map and lets the default AI play both sides
//! to the end.
//!
//! ```bash
//! BATTLE_LOG_DIR=./logs RUST_LOG=battle_runtime=debug cargo run -p battle-client
//! ```
mod logging;
mod scenario;

use anyhow::Result;
use battle_runtime::{
    BattleEvent, BattleRuntime, Event, RuntimeConfig, SkirmishProvider, Topic, TurnEvent,
    drive_battle,
};
use tokio::sync::broadcast::error::RecvError;

use scenario::Scenario;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = RuntimeConfig::from_env();
    let _log_guard = logging::setup_logging()?;

    tracing::info!("Starting battle client");
    tracing::info!("Max ticks: {}", config.max_ticks);

    let scenario = Scenario::load()?;
    let mut runtime = BattleRuntime::builder()
        .config(config.clone())
        .map(scenario.map)
        .build()?;

    let mut battle_events = runtime.subscribe(Topic::Battle);
    let mut turn_events = runtime.subscribe(Topic::Turn);
    let reporter = tokio::spawn(async move {
        loop {
            tokio::select! {
                event = battle_events.recv() => match event {
                    Ok(event) => {
                        let finished = matches!(event, Event::Battle(BattleEvent::Finished { .. }));
                        report(&event);
                        if finished {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => tracing::warn!("Skipped {} battle events", skipped),
                    Err(RecvError::Closed) => break,
                },
                event = turn_events.recv() => match event {
                    Ok(event) => report(&event),
                    Err(RecvError::Lagged(skipped)) => tracing::warn!("Skipped {} turn events", skipped),
                    Err(RecvError::Closed) => break,
                },
            }
        }
    });

    runtime.start(scenario.roster)?;
    let outcome = drive_battle(&mut runtime, &SkirmishProvider::new(), config.max_ticks).await?;
    reporter.await?;

    tracing::info!(
        "Battle over: {} after {} turns ({} ticks)",
        outcome,
        runtime.turn_number(),
        runtime.clock()
    );
    Ok(())
}

fn report(event: &Event) {
    match event {
        Event::Battle(BattleEvent::Started { units }) => {
            tracing::info!("Battle started with {} units", units)
        }
        Event::Battle(BattleEvent::UnitDied { unit, team, .. }) => {
            tracing::info!("Unit {} of team {} fell", unit, team)
        }
        Event::Battle(BattleEvent::Finished { outcome, turns }) => {
            tracing::info!("Outcome: {} in {} turns", outcome, turns)
        }
        Event::Turn(TurnEvent::Started { unit, turn }) => {
            tracing::info!("Turn {}: unit {}", turn, unit)
        }
        Event::Turn(TurnEvent::UnitMoved { unit, from, to, cost }) => {
            tracing::info!("  {} moves {} -> {} (cost {})", unit, from, to, cost)
        }
        Event::Turn(TurnEvent::AbilityUsed { unit, ability, hits }) => {
            for hit in hits {
                tracing::info!(
                    "  {} uses {} on {} for {:.1}{}",
                    unit,
                    ability,
                    hit.target,
                    hit.damage,
                    if hit.killed { " (killed)" } else { "" }
                );
            }
        }
        Event::Turn(TurnEvent::Ended { .. }) => {}
        Event::Turn(TurnEvent::QueueRecalculated { pass, entries }) => {
            tracing::debug!("Turn queue recalculated (pass {}, {} units)", pass, entries)
        }
    }
}
