#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a scripted hex battle in the terminal.

mod render;
mod script;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use hex_battle_core::Event;
use hex_battle_system_locomotion::{Locomotion, PositionUpdate};
use hex_battle_system_turns::{Battle, BattleConfig};
use hex_battle_world::query;

const FRAME: Duration = Duration::from_millis(100);

/// Runs a hex battle with a scripted player and prints the grid every turn.
#[derive(Debug, Parser)]
#[command(name = "hex-battle", version)]
struct Args {
    /// TOML file describing the grid, actors, and scenery.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for the battle's random generator; overrides the config file.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of rounds to play before concluding the battle.
    #[arg(long, default_value_t = 3)]
    rounds: u32,
}

/// Entry point for the hex battle command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut config = match args.config.as_deref() {
        Some(path) => load_config(path)?,
        None => BattleConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let (mut battle, _) = Battle::new(&config).context("invalid battle configuration")?;
    let mut locomotion = Locomotion::default();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "seed {}", battle.seed())?;

    for _ in 0..args.rounds {
        let events = battle.advance_to_player();
        follow_moves(&mut locomotion, &battle, &events);
        if battle.phase().is_terminal() {
            break;
        }

        let state = *battle.state();
        writeln!(
            out,
            "\nround {} | budget {} | hand {:?}",
            state.round,
            state.movement_budget,
            query::hand(battle.world())
        )?;
        write!(out, "{}", render::ascii_map(battle.world()))?;

        if let Some(goal) = script::farthest_reachable(battle.world(), state.movement_budget) {
            match battle.attempt_move(goal, goal) {
                Ok(events) => follow_moves(&mut locomotion, &battle, &events),
                Err(rejection) => tracing::warn!(%rejection, ?goal, "scripted move rejected"),
            }
        }
        let _ = battle.end_turn().context("player turn was not active")?;
    }

    let _ = battle.conclude().context("battle had already ended")?;
    writeln!(out, "\nfinal position")?;
    write!(out, "{}", render::ascii_map(battle.world()))?;
    Ok(())
}

fn load_config(path: &Path) -> Result<BattleConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read battle config at {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid battle config at {}", path.display()))
}

fn parse_config(contents: &str) -> Result<BattleConfig> {
    toml::from_str(contents).context("failed to parse battle config toml contents")
}

/// Plays committed routes to completion, logging where each actor ends up.
fn follow_moves(locomotion: &mut Locomotion, battle: &Battle, events: &[Event]) {
    locomotion.handle(events, query::layout(battle.world()));

    let mut updates = Vec::new();
    while !locomotion.is_idle() {
        updates.clear();
        locomotion.advance(FRAME, &mut updates);
        for PositionUpdate {
            actor,
            position,
            arrived,
        } in &updates
        {
            if *arrived {
                tracing::debug!(actor = actor.get(), %position, "actor arrived");
            }
        }
    }
}
