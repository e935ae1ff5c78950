//! Headless playout driver for the Hexport rules engine.
//!
//! Smoke-tests the engine end to end: builds a seeded game from env-var
//! configuration and feeds `process_action` legal actions until somebody
//! wins or the action cap runs out. Configuration:
//!
//! - `SEED`: RNG seed (default 0)
//! - `PLAYERS`: seat count, 2-6 (default 4)
//! - `TARGET_VP`: victory-point target (default 10)
//! - `MAX_ACTIONS`: safety cap on driven actions (default 5000)
//! - `RUST_LOG`: tracing filter (default `info`)

use anyhow::{bail, Context, Result};
use hexport_engine::{
    initialize_game, process_action, GameAction, GamePhase, GameSettings, GameState, PlayerId,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("could not parse {key}={raw}")),
        Err(_) => Ok(default),
    }
}

/// Build-first action policy: grow the board position when possible,
/// otherwise take whatever the phase demands, ending the turn last.
fn priority(action: &GameAction) -> u8 {
    match action {
        GameAction::BuildCity(_) => 0,
        GameAction::BuildSettlement(_) => 1,
        GameAction::BuildRoad(_) => 2,
        GameAction::BuyDevCard => 3,
        GameAction::EndTurn => 9,
        _ => 8,
    }
}

/// Pick the next (player, action) pair, honoring phases where a player
/// other than the turn owner must act.
fn choose(state: &GameState) -> Option<(PlayerId, GameAction)> {
    if let GamePhase::Discard { remaining } = &state.phase {
        return remaining.first().map(|p| (*p, GameAction::AutoDiscard));
    }
    let player = state.current_player;
    let action = state
        .valid_actions(player)
        .into_iter()
        .min_by_key(priority)?;
    Some((player, action))
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let seed: u64 = env_or("SEED", 0)?;
    let players: usize = env_or("PLAYERS", 4)?;
    let target: u32 = env_or("TARGET_VP", 10)?;
    let max_actions: u32 = env_or("MAX_ACTIONS", 5000)?;

    let settings = GameSettings {
        victory_target: target,
        ring_count: if players > 4 { 3 } else { 2 },
        ..GameSettings::default()
    };
    let names = (0..players).map(|i| format!("Bot {}", i + 1)).collect();
    let mut state =
        initialize_game(settings, names, seed).context("could not initialize the game")?;

    let opened = process_action(&state, 0, GameAction::StartGame);
    if let Some(err) = opened.error {
        bail!("could not start the game: {err}");
    }
    state = opened.state;
    info!(seed, players, target, "game started");

    for step in 0..max_actions {
        if let GamePhase::Ended { winner } = &state.phase {
            let name = &state.players[*winner as usize].name;
            info!(
                winner = name.as_str(),
                points = state.victory_points(*winner),
                turns = state.turn,
                steps = step,
                "game over"
            );
            return Ok(());
        }

        let Some((player, action)) = choose(&state) else {
            bail!("no legal action available in phase {:?}", state.phase);
        };
        debug!(player, ?action, "dispatch");

        let outcome = process_action(&state, player, action);
        if let Some(err) = outcome.error {
            bail!("engine rejected an enumerated action at step {step}: {err}");
        }
        state = outcome.state;
    }

    warn!(turns = state.turn, "action cap reached without a winner");
    for p in &state.players {
        info!(
            player = p.name.as_str(),
            points = state.victory_points(p.id),
            roads = p.longest_road_len,
            army = p.army_size,
            "final standing"
        );
    }
    Ok(())
}
