use tracing::{debug, info};

use super::context::TurnContext;
use super::diplomacy::acceptance_coefficient;
use super::signal::SignalKind;
use crate::model::{RejectReason, TradeAgreement, TradeStatus, World};

/// Relationship below which no trade is even considered.
pub const MIN_TRADE_LEVEL: i64 = 15;
/// Relationship gained by both sides of an executed trade.
pub const TRADE_RELATION_BONUS: i64 = 5;

/// Decide a pending agreement from the target's point of view.
pub fn arbitrate(world: &World, agreement: &TradeAgreement) -> Result<(), RejectReason> {
    let (Some(proposer), Some(target)) = (
        world.stock(agreement.proposer),
        world.stock(agreement.target),
    ) else {
        return Err(RejectReason::UnknownFaction);
    };

    let level = world.diplomacy.level(agreement.proposer, agreement.target);
    if level < MIN_TRADE_LEVEL {
        return Err(RejectReason::LowRelationship);
    }
    if target.get(agreement.requested.kind) < agreement.requested.amount
        || proposer.get(agreement.offered.kind) < agreement.offered.amount
    {
        return Err(RejectReason::InsufficientStock);
    }

    let price = world.market.crystal_price;
    let offered = agreement.offered.value(price);
    let requested = agreement.requested.value(price);
    let ratio = if offered > 0.0 {
        requested / offered
    } else {
        f64::INFINITY
    };
    if ratio > acceptance_coefficient(level) {
        return Err(RejectReason::UnfavorableRatio);
    }
    Ok(())
}

/// Execute both legs of an accepted agreement. Nothing moves if either side
/// can no longer pay or has no room to receive.
fn execute(world: &mut World, agreement: &TradeAgreement) -> Result<(), RejectReason> {
    world.exchange(
        agreement.proposer,
        agreement.offered,
        agreement.target,
        agreement.requested,
    )?;
    world
        .diplomacy
        .adjust_level(agreement.proposer, agreement.target, TRADE_RELATION_BONUS);
    Ok(())
}

/// Accept or reject every pending agreement addressed to the current faction.
pub fn process_trade_agreements(ctx: &mut TurnContext) {
    let me = ctx.faction;
    let pending: Vec<usize> = ctx
        .world
        .trade_agreements
        .iter()
        .enumerate()
        .filter(|(_, a)| a.target == me && a.is_pending())
        .map(|(i, _)| i)
        .collect();

    for index in pending {
        let agreement = ctx.world.trade_agreements[index].clone();
        match arbitrate(ctx.world, &agreement).and_then(|()| execute(ctx.world, &agreement)) {
            Ok(()) => {
                ctx.world.trade_agreements[index].status = TradeStatus::Accepted;
                info!(
                    agreement = agreement.id,
                    proposer = agreement.proposer,
                    target = me,
                    "trade executed"
                );
                ctx.emit(SignalKind::TradeExecuted {
                    agreement_id: agreement.id,
                    proposer: agreement.proposer,
                    target: me,
                });
            }
            Err(reason) => {
                ctx.world.trade_agreements[index].status = TradeStatus::Rejected(reason);
                debug!(agreement = agreement.id, ?reason, "trade rejected");
                ctx.emit(SignalKind::TradeRejected {
                    agreement_id: agreement.id,
                    reason,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::model::resource::CURRENCY_CAP;
    use crate::model::{Controller, Faction, Ideology, ResourceKind, ResourceStock, TradeLeg};

    fn world_with_level(level: i64) -> World {
        let mut world = World::new();
        world.add_faction(
            Faction::new(1, "North", Ideology::Order, Controller::Ai),
            ResourceStock::new(10_000, 10_000, 100, 1000),
        );
        world.add_faction(
            Faction::new(2, "South", Ideology::Order, Controller::Ai),
            ResourceStock::new(10_000, 10_000, 100, 1000),
        );
        world.market.crystal_price = 1.0;
        world.diplomacy.set_level(1, 2, level);
        world
    }

    fn run_as(world: &mut World, faction: u64) -> Vec<crate::sim::Signal> {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut signals = Vec::new();
        let mut ctx = TurnContext {
            world,
            rng: &mut rng,
            signals: &mut signals,
            faction,
        };
        process_trade_agreements(&mut ctx);
        signals
    }

    #[test]
    fn rejects_below_minimum_level() {
        let mut world = world_with_level(14);
        let leg = TradeLeg::new(ResourceKind::Currency, 10);
        world.propose_trade(1, 2, leg, leg);
        run_as(&mut world, 2);
        assert_eq!(
            world.trade_agreements[0].status,
            TradeStatus::Rejected(RejectReason::LowRelationship)
        );
    }

    #[test]
    fn rejects_when_target_cannot_cover() {
        let mut world = world_with_level(60);
        world.propose_trade(
            1,
            2,
            TradeLeg::new(ResourceKind::Currency, 100_000),
            TradeLeg::new(ResourceKind::Crystal, 20_000),
        );
        run_as(&mut world, 2);
        assert_eq!(
            world.trade_agreements[0].status,
            TradeStatus::Rejected(RejectReason::InsufficientStock)
        );
    }

    #[test]
    fn rejects_greedy_ratio_at_low_level() {
        let mut world = world_with_level(20);
        world.propose_trade(
            1,
            2,
            TradeLeg::new(ResourceKind::Currency, 100),
            TradeLeg::new(ResourceKind::Crystal, 100),
        );
        run_as(&mut world, 2);
        assert_eq!(
            world.trade_agreements[0].status,
            TradeStatus::Rejected(RejectReason::UnfavorableRatio)
        );
    }

    #[test]
    fn accepted_trade_conserves_resources() {
        let mut world = world_with_level(70);
        world.propose_trade(
            1,
            2,
            TradeLeg::new(ResourceKind::Currency, 1000),
            TradeLeg::new(ResourceKind::Crystal, 800),
        );
        let currency_before = world.resources[&1].currency + world.resources[&2].currency;
        let crystal_before = world.resources[&1].crystal + world.resources[&2].crystal;

        let signals = run_as(&mut world, 2);

        assert_eq!(world.trade_agreements[0].status, TradeStatus::Accepted);
        assert_eq!(world.resources[&1].currency, 9000);
        assert_eq!(world.resources[&2].currency, 11_000);
        assert_eq!(world.resources[&1].crystal, 10_800);
        assert_eq!(world.resources[&2].crystal, 9200);
        assert_eq!(
            world.resources[&1].currency + world.resources[&2].currency,
            currency_before
        );
        assert_eq!(
            world.resources[&1].crystal + world.resources[&2].crystal,
            crystal_before
        );
        assert_eq!(world.diplomacy.level(1, 2), 75);
        assert_eq!(signals.len(), 1);
    }

    #[test]
    fn receiver_at_cap_rejects_without_destroying_currency() {
        let mut world = world_with_level(70);
        if let Some(stock) = world.resources.get_mut(&2) {
            stock.currency = CURRENCY_CAP;
        }
        world.propose_trade(
            1,
            2,
            TradeLeg::new(ResourceKind::Currency, 1000),
            TradeLeg::new(ResourceKind::Crystal, 800),
        );
        let currency_before = world.resources[&1].currency + world.resources[&2].currency;

        run_as(&mut world, 2);

        assert_eq!(
            world.trade_agreements[0].status,
            TradeStatus::Rejected(RejectReason::ReceiverFull)
        );
        assert_eq!(
            world.resources[&1].currency + world.resources[&2].currency,
            currency_before
        );
        assert_eq!(world.resources[&2].crystal, 10_000);
        assert_eq!(world.diplomacy.level(1, 2), 70);
    }

    #[test]
    fn ignores_agreements_for_other_factions() {
        let mut world = world_with_level(70);
        let leg = TradeLeg::new(ResourceKind::Currency, 10);
        world.propose_trade(2, 1, leg, leg);
        run_as(&mut world, 2);
        assert!(world.trade_agreements[0].is_pending());
    }
}
