//! `hexfleet`: plays battle packages headlessly and prints the event stream.
//!
//! Usage:
//!   hexfleet run demos/skirmish.json --turns 30 --seed 7
//!   hexfleet check demos/skirmish.json
//!
//! Events go to stdout as JSON lines; logs go to stderr and honor `RUST_LOG`.

mod cli;
mod package;

use anyhow::{bail, Context, Result};
use clap::Parser;
use glam::Vec2;
use hexfleet_core::event::Event;
use hexfleet_core::manager::GameStateManager;
use hexfleet_core::view::GameSnapshot;
use hexgrid::IsoProjection;
use serde::Serialize;
use std::io::{self, Write};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::package::BattlePackage;

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            package,
            turns,
            seed,
            show_state,
        } => {
            let mut battle = BattlePackage::load(&package)?;
            if let Some(seed) = seed {
                battle.config.ai_seed = seed;
            }
            run(battle, turns, show_state)
        }
        Command::Check { package } => check(BattlePackage::load(&package)?),
    }
}

fn check(battle: BattlePackage) -> Result<()> {
    let manager = GameStateManager::new(battle.config);
    let created = manager
        .create_game(battle.setup)
        .context("battle package is invalid")?;
    let snapshot = manager.snapshot(created.game_id)?;
    if snapshot.game.teams().len() < 2 {
        warn!(teams = snapshot.game.teams().len(), "package has fewer than two teams");
    }
    println!(
        "ok: {} ships, {} objectives, {} teams",
        created.ships.len(),
        created.objectives.len(),
        snapshot.game.teams().len()
    );
    Ok(())
}

fn run(battle: BattlePackage, turns: u32, show_state: bool) -> Result<()> {
    if turns == 0 {
        bail!("--turns must be at least 1");
    }
    let manager = GameStateManager::new(battle.config);
    let created = manager.create_game(battle.setup)?;
    let game = created.game_id;
    manager.begin_battle(game)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut seen = emit(&mut out, &manager.events(game)?)?.unwrap_or(0);

    for _ in 0..turns {
        let batch = manager.generate_ai_moves(game)?;
        if !batch.failed.is_empty() {
            warn!(failed = ?batch.failed, "some ships hold this turn");
        }
        let report = manager.resolve_turn(game)?;
        if let Some(last) = emit(&mut out, &manager.events_since(game, seen)?)? {
            seen = last;
        }
        if let Some(outcome) = report.summary.outcome {
            info!(turn = report.summary.turn, ?outcome, "battle over");
            break;
        }
    }

    let snapshot = manager.snapshot(game)?;
    info!(
        turn = snapshot.game.current_turn(),
        scores = ?snapshot.scores,
        "final state"
    );
    if show_state {
        serde_json::to_writer_pretty(&mut out, &StateView::new(&snapshot))?;
        writeln!(out)?;
    }
    Ok(())
}

/// Writes one JSON line per event; returns the last sequence number written.
fn emit(out: &mut impl Write, events: &[Event]) -> Result<Option<u64>> {
    for event in events {
        serde_json::to_writer(&mut *out, event)?;
        writeln!(out)?;
    }
    Ok(events.last().map(|event| event.seq))
}

/// Final snapshot plus renderer-ready pixel positions.
#[derive(Serialize)]
struct StateView<'a> {
    snapshot: &'a GameSnapshot,
    ship_pixels: Vec<(String, Vec2)>,
}

impl<'a> StateView<'a> {
    fn new(snapshot: &'a GameSnapshot) -> Self {
        let projection = IsoProjection::default();
        let ship_pixels = snapshot
            .ships_in_play()
            .map(|ship| (ship.name().to_owned(), projection.project(ship.position())))
            .collect();
        Self {
            snapshot,
            ship_pixels,
        }
    }
}
