use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use sqlx::PgPool;
use tracing::info;

use super::ai::{AiController, TurnSummary};
use crate::config::GameConfig;
use crate::db::save_world;
use crate::error::Result;
use crate::flush::flush_to_jsonl;
use crate::model::{FactionId, World};

/// AI factions in the order they act within a round.
pub fn turn_order(world: &World) -> Vec<FactionId> {
    world
        .factions
        .values()
        .filter(|f| f.is_ai())
        .map(|f| f.id)
        .collect()
}

/// Let every AI faction take one full turn, then advance the turn counter.
pub fn play_round(
    world: &mut World,
    controllers: &mut [AiController],
    rng: &mut dyn RngCore,
) -> Vec<TurnSummary> {
    let summaries = controllers
        .iter_mut()
        .map(|controller| controller.make_turn(world, rng))
        .collect();
    world.turn += 1;
    summaries
}

fn controllers_for(world: &World) -> Vec<AiController> {
    turn_order(world).into_iter().map(AiController::new).collect()
}

/// Whether a checkpoint is due after the round with zero-based index `round`.
fn checkpoint_due(config: &GameConfig, round: u32) -> bool {
    let Some(interval) = config.flush_interval.filter(|i| *i > 0) else {
        return false;
    };
    let is_last = round + 1 == config.num_turns;
    is_last || (round + 1) % interval == 0
}

fn write_checkpoint(world: &World, config: &GameConfig, round: u32) -> Result<()> {
    if !checkpoint_due(config, round) {
        return Ok(());
    }
    if let Some(dir) = &config.output_dir {
        let checkpoint_dir = dir.join(format!("turn_{:06}", world.turn));
        flush_to_jsonl(world, &checkpoint_dir)?;
        info!(turn = world.turn, dir = %checkpoint_dir.display(), "checkpoint written");
    }
    Ok(())
}

/// Play `config.num_turns` rounds with a RNG seeded from `config.seed`.
///
/// The same seed and starting world always produce the same game.
pub fn run(world: &mut World, config: &GameConfig) -> Result<Vec<TurnSummary>> {
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut controllers = controllers_for(world);
    let mut summaries = Vec::new();

    for round in 0..config.num_turns {
        summaries.extend(play_round(world, &mut controllers, &mut rng));
        write_checkpoint(world, config, round)?;
    }
    info!(turns = config.num_turns, factions = controllers.len(), "game finished");
    Ok(summaries)
}

/// Like [`run`], but saves the world to Postgres after every faction turn.
///
/// A failed save aborts the game; the in-memory world may be ahead of the
/// stored one at that point.
pub async fn run_persisted(
    pool: &PgPool,
    world: &mut World,
    config: &GameConfig,
) -> Result<Vec<TurnSummary>> {
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut controllers = controllers_for(world);
    let mut summaries = Vec::new();

    for round in 0..config.num_turns {
        for controller in controllers.iter_mut() {
            summaries.push(controller.make_turn(world, &mut rng));
            save_world(pool, world).await?;
        }
        world.turn += 1;
        write_checkpoint(world, config, round)?;
    }
    Ok(summaries)
}
