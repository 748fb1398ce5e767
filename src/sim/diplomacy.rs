use tracing::{debug, info};

use super::context::TurnContext;
use super::signal::SignalKind;
use crate::model::{
    DiplomaticQuery, FactionId, QueryKind, RelationKind, ResourceKind, TradeLeg, World,
};

// --- Relationship bands ---
const COEFFICIENT_BANDS: [(i64, f64); 8] = [
    (15, 0.0),
    (25, 0.5),
    (35, 0.8),
    (50, 1.0),
    (60, 1.2),
    (70, 1.4),
    (80, 2.0),
    (90, 3.0),
];
const COEFFICIENT_TOP: f64 = 4.0;

const ACCEPTANCE_BANDS: [(i64, f64); 8] = [
    (25, 0.09),
    (35, 0.3),
    (45, 0.5),
    (55, 0.8),
    (65, 1.0),
    (75, 1.4),
    (80, 1.8),
    (90, 2.4),
];
const ACCEPTANCE_TOP: f64 = 3.1;

// --- Ideology drift ---
const IDEOLOGY_DRIFT_PERIOD: u32 = 3;
const IDEOLOGY_MATCH_BONUS: i64 = 3;
const IDEOLOGY_MISMATCH_PENALTY: i64 = -7;

// --- Queries ---
pub const ALLIANCE_MIN_LEVEL: i64 = 75;
pub const IMPROVEMENT_MIN_PAYMENT: i64 = 2000;
pub const IMPROVEMENT_GAIN: i64 = 10;
const ALLIANCE_PROPOSAL_LEVEL: i64 = 80;

// --- Crystal purchase proposals ---
const CRYSTAL_RESERVE: i64 = 2000;
const PURCHASE_MIN_CURRENCY: i64 = 10_000;
const PURCHASE_CRYSTAL_AMOUNT: i64 = 2000;

fn banded(level: i64, bands: &[(i64, f64)], top: f64) -> f64 {
    bands
        .iter()
        .find(|(upper, _)| level < *upper)
        .map(|(_, value)| *value)
        .unwrap_or(top)
}

/// Trade-value multiplier for a relationship level. Zero below 15.
pub fn calculate_coefficient(level: i64) -> f64 {
    banded(level, &COEFFICIENT_BANDS, COEFFICIENT_TOP)
}

/// Highest `requested / offered` value ratio a faction tolerates at this level.
pub fn acceptance_coefficient(level: i64) -> f64 {
    banded(level, &ACCEPTANCE_BANDS, ACCEPTANCE_TOP)
}

/// Every few turns, like-minded factions warm to each other and others cool.
pub fn apply_ideology_drift(ctx: &mut TurnContext) {
    if ctx.world.turn % IDEOLOGY_DRIFT_PERIOD != 0 {
        return;
    }
    let me = ctx.faction;
    let Some(my_ideology) = ctx.world.factions.get(&me).map(|f| f.ideology) else {
        return;
    };
    let others: Vec<(FactionId, bool)> = ctx
        .world
        .factions
        .values()
        .filter(|f| f.id != me)
        .map(|f| (f.id, f.ideology == my_ideology))
        .collect();
    for (other, same) in others {
        let delta = if same {
            IDEOLOGY_MATCH_BONUS
        } else {
            IDEOLOGY_MISMATCH_PENALTY
        };
        let level = ctx.world.diplomacy.adjust_level(me, other, delta);
        debug!(faction = me, other, level, "ideology drift");
    }
}

/// Whether an alliance between the two is acceptable right now.
pub fn alliance_acceptable(world: &World, a: FactionId, b: FactionId) -> bool {
    let rel = world.diplomacy.get(a, b);
    rel.kind != RelationKind::War && rel.level >= ALLIANCE_MIN_LEVEL
}

/// Answer every queued query addressed to the current faction.
pub fn process_queries(ctx: &mut TurnContext) {
    let me = ctx.faction;
    let (mine, rest): (Vec<DiplomaticQuery>, Vec<DiplomaticQuery>) =
        std::mem::take(&mut ctx.world.queries)
            .into_iter()
            .partition(|q| q.to == me);
    ctx.world.queries = rest;

    for query in mine {
        match query.kind {
            QueryKind::AllianceProposal => {
                if alliance_acceptable(ctx.world, me, query.from) {
                    ctx.world
                        .diplomacy
                        .set_kind(me, query.from, RelationKind::Alliance);
                    info!(a = me, b = query.from, "alliance formed");
                    ctx.emit(SignalKind::AllianceFormed {
                        a: query.from,
                        b: me,
                    });
                } else {
                    debug!(faction = me, from = query.from, "alliance proposal declined");
                }
            }
            QueryKind::ImproveRelations { payment } => {
                if payment < IMPROVEMENT_MIN_PAYMENT {
                    continue;
                }
                if !ctx
                    .world
                    .transfer(query.from, me, ResourceKind::Currency, payment)
                {
                    debug!(faction = me, from = query.from, payment, "goodwill payment not covered");
                } else {
                    ctx.world
                        .diplomacy
                        .adjust_level(me, query.from, IMPROVEMENT_GAIN);
                    ctx.emit(SignalKind::ResourcesTransferred {
                        from: query.from,
                        to: me,
                        kind: ResourceKind::Currency,
                        amount: payment,
                    });
                }
            }
        }
    }
}

/// Queue a paid request from `from` to improve relations with `to`. It is
/// settled during `to`'s next turn.
pub fn request_improvement(world: &mut World, from: FactionId, to: FactionId, payment: i64) {
    world.queries.push(DiplomaticQuery {
        from,
        to,
        kind: QueryKind::ImproveRelations { payment },
    });
}

/// Queue alliance offers to close friends and buy crystal when running low.
pub fn propose_deals(ctx: &mut TurnContext) {
    let me = ctx.faction;
    let others: Vec<FactionId> = ctx
        .world
        .factions
        .keys()
        .copied()
        .filter(|&f| f != me)
        .collect();

    for &other in &others {
        let rel = ctx.world.diplomacy.get(me, other);
        let already_queued = ctx
            .world
            .queries
            .iter()
            .any(|q| q.from == me && q.to == other && q.kind == QueryKind::AllianceProposal);
        if rel.kind == RelationKind::Peace && rel.level >= ALLIANCE_PROPOSAL_LEVEL && !already_queued
        {
            ctx.world.queries.push(DiplomaticQuery {
                from: me,
                to: other,
                kind: QueryKind::AllianceProposal,
            });
        }
    }

    let Some(stock) = ctx.world.stock(me) else {
        return;
    };
    if stock.crystal >= CRYSTAL_RESERVE || stock.currency <= PURCHASE_MIN_CURRENCY {
        return;
    }
    let has_pending = ctx
        .world
        .trade_agreements
        .iter()
        .any(|a| a.proposer == me && a.is_pending());
    if has_pending {
        return;
    }
    let friendliest = others
        .iter()
        .copied()
        .filter(|&o| !ctx.world.diplomacy.at_war(me, o))
        .max_by_key(|&o| ctx.world.diplomacy.level(me, o));
    if let Some(partner) = friendliest {
        let price = (PURCHASE_CRYSTAL_AMOUNT as f64 * ctx.world.market.crystal_price).ceil() as i64;
        let id = ctx.world.propose_trade(
            me,
            partner,
            TradeLeg::new(ResourceKind::Currency, price),
            TradeLeg::new(ResourceKind::Crystal, PURCHASE_CRYSTAL_AMOUNT),
        );
        debug!(faction = me, partner, agreement = id, "crystal purchase proposed");
    }
}
