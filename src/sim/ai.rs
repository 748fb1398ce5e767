use rand::RngCore;
use serde::Serialize;
use tracing::{debug, info_span};

use super::buildings::construct;
use super::combat::BattleReport;
use super::context::TurnContext;
use super::diplomacy::{apply_ideology_drift, process_queries, propose_deals};
use super::economy::{apply_ideology_bonus, liquidate_crystal, recompute_resources, roll_market_price};
use super::recruitment::recruit;
use super::signal::Signal;
use super::trade::process_trade_agreements;
use super::war::wage_wars;
use crate::model::{FactionId, World};

/// What happened during one faction's turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnSummary {
    pub faction: FactionId,
    pub turn: u32,
    pub signals: Vec<Signal>,
    pub battles: Vec<BattleReport>,
}

/// Drives a single AI faction. Holds only what must survive between the
/// steps of one turn.
#[derive(Debug, Clone)]
pub struct AiController {
    pub faction: FactionId,
    hero_recruited: bool,
}

impl AiController {
    pub fn new(faction: FactionId) -> Self {
        Self {
            faction,
            hero_recruited: false,
        }
    }

    pub fn hero_recruited(&self) -> bool {
        self.hero_recruited
    }

    /// Play one full turn for this faction. Steps run in a fixed order and
    /// each sees the world as left by the previous one.
    pub fn make_turn(&mut self, world: &mut World, rng: &mut dyn RngCore) -> TurnSummary {
        let span = info_span!("ai_turn", faction = self.faction, turn = world.turn);
        let _guard = span.enter();

        self.hero_recruited = false;
        let mut signals = Vec::new();
        let mut ctx = TurnContext {
            world,
            rng,
            signals: &mut signals,
            faction: self.faction,
        };

        // Resource refresh
        roll_market_price(&mut ctx);
        process_trade_agreements(&mut ctx);
        process_queries(&mut ctx);
        let delta = recompute_resources(&mut ctx);

        let battles = wage_wars(&mut ctx);

        apply_ideology_bonus(&mut ctx, delta);
        apply_ideology_drift(&mut ctx);
        propose_deals(&mut ctx);

        construct(&mut ctx);
        liquidate_crystal(&mut ctx);
        recruit(&mut ctx, &mut self.hero_recruited);

        let turn = ctx.world.turn;
        debug!(signals = signals.len(), battles = battles.len(), "turn finished");
        TurnSummary {
            faction: self.faction,
            turn,
            signals,
            battles,
        }
    }
}
