use rand::Rng;
use tracing::{debug, info, warn};

use super::context::TurnContext;
use super::signal::SignalKind;
use crate::model::Ideology;

// --- Market ---
const CRYSTAL_PRICE_MIN: f64 = 0.8;
const CRYSTAL_PRICE_MAX: f64 = 1.6;
const LIQUIDATION_THRESHOLD: i64 = 1000;
const LIQUIDATION_SHARE: f64 = 0.95;

// --- Growth & income ---
const TAX_RATE: f64 = 0.34;
const TAX_POPULATION_DRAG: f64 = 0.005;
const HOSPITAL_GROWTH: i64 = 500;
const FACTORY_GROWTH_PENALTY: i64 = 200;
const CITY_GROWTH_DIVISOR: i64 = 100;
const FACTORY_CRYSTAL_OUTPUT: f64 = 1000.0;
const LABOR_RATE: f64 = 0.05;
const ARMY_LIMIT_DIVISOR: i64 = 10;

// --- Starvation ---
const STARVATION_SHARE: f64 = 0.45;
const STARVATION_SMALL_POPULATION: i64 = 100;
const STARVATION_SMALL_CAP: i64 = 50;

// --- Ideology ---
const SUBMISSION_CURRENCY_BONUS: f64 = 1.65;
const STRUGGLE_CRYSTAL_BONUS: f64 = 2.25;

/// Income computed during a refresh, kept for the ideology bonus.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EconomyDelta {
    pub currency: f64,
    pub crystal: f64,
}

/// Draw a new crystal market price.
pub fn roll_market_price(ctx: &mut TurnContext) -> f64 {
    let price = ctx.rng.random_range(CRYSTAL_PRICE_MIN..=CRYSTAL_PRICE_MAX);
    ctx.world.market.crystal_price = price;
    price
}

/// Population lost to starvation.
pub fn starvation_loss(population: i64) -> i64 {
    let share = (population as f64 * STARVATION_SHARE).round() as i64;
    if population <= STARVATION_SMALL_POPULATION {
        share.min(STARVATION_SMALL_CAP)
    } else {
        share
    }
}

/// Recompute the faction's stock from its buildings, cities and population.
pub fn recompute_resources(ctx: &mut TurnContext) -> EconomyDelta {
    let me = ctx.faction;
    let Some(faction) = ctx.world.factions.get(&me).cloned() else {
        warn!(faction = me, "resource refresh for unknown faction");
        return EconomyDelta::default();
    };
    let buildings = ctx.world.faction_buildings(me);
    let city_count = ctx.world.city_count(me) as i64;
    let crystal_output: f64 = ctx
        .world
        .cities_of(me)
        .map(|c| {
            ctx.world.buildings_of(c.id).factories as f64
                * FACTORY_CRYSTAL_OUTPUT
                * c.crystal_coefficient
        })
        .sum();
    let consumption = ctx.world.total_consumption(me);

    let Some(stock) = ctx.world.stock_mut(me) else {
        warn!(faction = me, "faction has no resource ledger");
        return EconomyDelta::default();
    };
    let population = stock.population;

    let tax_income = population as f64 * TAX_RATE;
    let tax_effect = -(population as f64 * TAX_POPULATION_DRAG);
    let growth = buildings.hospitals * HOSPITAL_GROWTH - buildings.factories * FACTORY_GROWTH_PENALTY
        + tax_effect.round() as i64
        + city_count * (population / CITY_GROWTH_DIVISOR);

    let delta = EconomyDelta {
        currency: tax_income - buildings.hospitals as f64 * faction.money_loss_coefficient,
        crystal: crystal_output - population as f64 * faction.food_loss_coefficient,
    };

    stock.population += growth;
    stock.currency += delta.currency.floor() as i64;
    stock.crystal += delta.crystal.floor() as i64;
    stock.labor += (population as f64 * LABOR_RATE).floor() as i64;

    let mut starved = 0;
    if stock.crystal <= 0 {
        starved = starvation_loss(stock.population.max(0));
        stock.population -= starved;
        stock.labor = 0;
    }

    stock.total_consumption = consumption;
    stock.army_limit = stock.population.max(0) / ARMY_LIMIT_DIVISOR;
    stock.clamp();

    debug!(
        faction = me,
        population = stock.population,
        currency = stock.currency,
        crystal = stock.crystal,
        labor = stock.labor,
        "resources recomputed"
    );

    if starved > 0 {
        info!(faction = me, starved, "starvation");
        ctx.emit(SignalKind::Starvation {
            faction_id: me,
            population_lost: starved,
        });
    }
    delta
}

/// Ideology-specific boost on top of this turn's income.
pub fn apply_ideology_bonus(ctx: &mut TurnContext, delta: EconomyDelta) {
    let me = ctx.faction;
    let Some(ideology) = ctx.world.factions.get(&me).map(|f| f.ideology) else {
        return;
    };
    let Some(stock) = ctx.world.stock_mut(me) else {
        return;
    };
    match ideology {
        Ideology::Submission if delta.currency > 0.0 => {
            stock.currency += (delta.currency * SUBMISSION_CURRENCY_BONUS).floor() as i64;
        }
        Ideology::Struggle if delta.crystal > 0.0 => {
            stock.crystal += (delta.crystal * STRUGGLE_CRYSTAL_BONUS).floor() as i64;
        }
        _ => {}
    }
    stock.clamp();
}

/// Sell most of a large crystal stock at the current market price.
pub fn liquidate_crystal(ctx: &mut TurnContext) {
    let me = ctx.faction;
    let price = ctx.world.market.crystal_price;
    let Some(stock) = ctx.world.stock_mut(me) else {
        return;
    };
    if stock.crystal <= LIQUIDATION_THRESHOLD {
        return;
    }
    let sold = (stock.crystal as f64 * LIQUIDATION_SHARE).floor() as i64;
    let revenue = (sold as f64 * price).floor() as i64;
    stock.crystal -= sold;
    stock.currency += revenue;
    stock.clamp();
    debug!(faction = me, sold, revenue, price, "crystal liquidated");
    ctx.emit(SignalKind::CrystalSold {
        faction_id: me,
        amount: sold,
        revenue,
    });
}
