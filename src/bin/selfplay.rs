//! Plays a demo game between AI factions and logs what happened.
//!
//! Usage: `conquest-selfplay [config.json]`. With a `database_url` in the
//! config, the world is saved to Postgres after every faction turn.

use std::path::PathBuf;

use conquest_core::db::migrate;
use conquest_core::scenario::Scenario;
use conquest_core::sim::{SignalKind, run, run_persisted};
use conquest_core::{GameConfig, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("conquest_core=info,conquest_selfplay=info")
        .init();

    if let Err(err) = play().await {
        error!(%err, "game aborted");
        std::process::exit(1);
    }
}

async fn play() -> Result<()> {
    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => GameConfig::from_json_file(&path)?,
        None => GameConfig::default(),
    };
    info!(seed = config.seed, turns = config.num_turns, "starting game");

    let mut world = Scenario::demo();
    let summaries = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().connect(url).await?;
            migrate(&pool).await?;
            run_persisted(&pool, &mut world, &config).await?
        }
        None => run(&mut world, &config)?,
    };

    let battles: usize = summaries.iter().map(|s| s.battles.len()).sum();
    let captures = summaries
        .iter()
        .flat_map(|s| &s.signals)
        .filter(|s| matches!(s.kind, SignalKind::CityCaptured { .. }))
        .count();
    info!(battles, captures, "game over");

    for faction in world.factions.values() {
        let stock = world.stock(faction.id).cloned().unwrap_or_default();
        info!(
            faction = %faction.name,
            ideology = faction.ideology.label(),
            cities = world.city_count(faction.id),
            strength = world.army_strength(faction.id),
            currency = stock.currency,
            crystal = stock.crystal,
            population = stock.population,
            "final standing"
        );
    }
    Ok(())
}
