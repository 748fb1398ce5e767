use tracing::{debug, info};

use super::buildings::most_developed_city;
use super::context::TurnContext;
use super::signal::SignalKind;
use crate::model::{CityId, FactionId, UnitClass, UnitTemplate, World};

const UNIT_BUDGET_SHARE: f64 = 0.4;
const HERO_BUDGET_SHARE: f64 = 0.6;
/// Below this many cities, champions must be attack-leaning.
const EXPANSION_CITY_COUNT: usize = 5;
/// Legendaries become available after this turn.
pub const LEGENDARY_TURN: u32 = 14;

/// How many of `template` the faction can afford with `budget` currency.
fn affordable_count(world: &World, faction: FactionId, template: &UnitTemplate, budget: i64) -> i64 {
    let Some(stock) = world.stock(faction) else {
        return 0;
    };
    let by_currency = budget / template.cost.currency.max(1);
    let by_labor = if template.cost.time > 0 {
        stock.labor / template.cost.time
    } else {
        i64::MAX
    };
    let by_upkeep = if template.consumption > 0 {
        stock.consumption_headroom() / template.consumption
    } else {
        i64::MAX
    };
    by_currency.min(by_labor).min(by_upkeep).max(0)
}

/// Pay for `count` units and station them in `city_id`.
fn enlist(ctx: &mut TurnContext, city_id: CityId, template: &UnitTemplate, count: i64) {
    let me = ctx.faction;
    if let Some(stock) = ctx.world.stock_mut(me) {
        stock.currency -= template.cost.currency * count;
        stock.labor -= template.cost.time * count;
        stock.total_consumption += template.consumption * count;
        stock.clamp();
    }
    ctx.world
        .garrisons
        .upsert(city_id, &template.name, count, &template.image);
    info!(faction = me, city = city_id, unit = %template.name, count, "units recruited");
    ctx.emit(SignalKind::UnitsRecruited {
        faction_id: me,
        city_id,
        unit_name: template.name.clone(),
        count,
    });
}

/// Hero candidates the faction may recruit right now.
///
/// Only one hero per class may be held. Small realms only take champions
/// whose attack exceeds their defense.
fn hero_candidates(world: &World, faction: FactionId) -> Vec<UnitTemplate> {
    let expanding = world.city_count(faction) < EXPANSION_CITY_COUNT;
    world
        .catalog
        .for_faction(faction)
        .filter(|t| matches!(t.class, UnitClass::Hero | UnitClass::Champion))
        .filter(|t| !world.fields_class(faction, t.class))
        .filter(|t| !(expanding && t.class == UnitClass::Champion && t.attack <= t.defense))
        .cloned()
        .collect()
}

fn strongest_affordable(
    world: &World,
    faction: FactionId,
    candidates: Vec<UnitTemplate>,
    budget: i64,
) -> Option<UnitTemplate> {
    candidates
        .into_iter()
        .filter(|t| affordable_count(world, faction, t, budget) >= 1)
        .max_by(|a, b| a.power().total_cmp(&b.power()))
}

/// Spend the treasury on rank-and-file units and, once per turn, one hero.
pub fn recruit(ctx: &mut TurnContext, hero_recruited: &mut bool) {
    let me = ctx.faction;
    let Some(city_id) = most_developed_city(ctx.world, me) else {
        return;
    };
    let Some(treasury) = ctx.world.stock(me).map(|s| s.currency) else {
        return;
    };
    let unit_budget = (treasury as f64 * UNIT_BUDGET_SHARE).floor() as i64;
    let hero_budget = (treasury as f64 * HERO_BUDGET_SHARE).floor() as i64;

    // Rank and file: best power per currency.
    let best_unit = ctx
        .world
        .catalog
        .for_faction(me)
        .filter(|t| t.class == UnitClass::Base)
        .max_by(|a, b| {
            let a_value = a.power() / a.cost.currency.max(1) as f64;
            let b_value = b.power() / b.cost.currency.max(1) as f64;
            a_value.total_cmp(&b_value)
        })
        .cloned();
    if let Some(template) = best_unit {
        let count = affordable_count(ctx.world, me, &template, unit_budget);
        if count > 0 {
            enlist(ctx, city_id, &template, count);
        }
    }

    if !*hero_recruited {
        let candidates = hero_candidates(ctx.world, me);
        if let Some(hero) = strongest_affordable(ctx.world, me, candidates, hero_budget) {
            enlist(ctx, city_id, &hero, 1);
            *hero_recruited = true;
        } else {
            debug!(faction = me, hero_budget, "no hero affordable");
        }
    }

    if ctx.world.turn > LEGENDARY_TURN && !ctx.world.fields_class(me, UnitClass::Legendary) {
        let remaining = ctx.world.stock(me).map(|s| s.currency).unwrap_or(0);
        let legendaries: Vec<UnitTemplate> = ctx
            .world
            .catalog
            .for_faction(me)
            .filter(|t| t.class == UnitClass::Legendary)
            .cloned()
            .collect();
        if let Some(legend) = strongest_affordable(ctx.world, me, legendaries, remaining) {
            enlist(ctx, city_id, &legend, 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::model::{Controller, Ideology};
    use crate::scenario::Scenario;

    fn recruit_as(world: &mut World, faction: FactionId, hero_recruited: &mut bool) {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut signals = Vec::new();
        let mut ctx = TurnContext {
            world,
            rng: &mut rng,
            signals: &mut signals,
            faction,
        };
        recruit(&mut ctx, hero_recruited);
    }

    fn realm(currency: i64, cities: u64) -> Scenario {
        let mut s = Scenario::new();
        s.faction(1, "A", Ideology::Order, Controller::Ai)
            .currency(currency)
            .labor(10_000)
            .population(1_000_000);
        s.unit(1, "Pike", (10, 5, 5), UnitClass::Base);
        for i in 0..cities {
            s.city(10 + i, "Town", 0, 0).owner(1);
        }
        s
    }

    #[test]
    fn spends_unit_share_on_rank_and_file() {
        let mut world = realm(1000, 1).build();
        let mut hero = false;
        recruit_as(&mut world, 1, &mut hero);
        assert_eq!(world.garrisons.count_of(10, "Pike"), 4);
        assert_eq!(world.stock(1).map(|s| s.currency), Some(600));
        assert!(!hero);
    }

    #[test]
    fn labor_limits_recruitment() {
        let mut s = realm(100_000, 1);
        if let Some(stock) = s.world_mut().stock_mut(1) {
            stock.labor = 3;
        }
        let mut world = s.build();
        recruit_as(&mut world, 1, &mut false);
        assert_eq!(world.garrisons.count_of(10, "Pike"), 3);
    }

    #[test]
    fn small_realm_skips_defensive_champion() {
        let mut s = realm(100_000, 1);
        s.unit(1, "Bulwark", (100, 500, 100), UnitClass::Champion);
        s.unit(1, "Reaver", (500, 100, 100), UnitClass::Champion);
        let mut world = s.build();
        let mut hero = false;
        recruit_as(&mut world, 1, &mut hero);
        assert!(hero);
        assert_eq!(world.garrisons.count_of(10, "Reaver"), 1);
        assert_eq!(world.garrisons.count_of(10, "Bulwark"), 0);
    }

    #[test]
    fn large_realm_takes_strongest_champion() {
        let mut s = realm(100_000, 5);
        s.unit(1, "Bulwark", (400, 900, 900), UnitClass::Champion);
        s.unit(1, "Reaver", (500, 100, 100), UnitClass::Champion);
        let mut world = s.build();
        recruit_as(&mut world, 1, &mut false);
        assert_eq!(world.garrisons.count_of(10, "Bulwark"), 1);
    }

    #[test]
    fn one_hero_per_turn_and_class() {
        let mut s = realm(1_000_000, 1);
        s.unit(1, "Warden", (300, 100, 100), UnitClass::Hero);
        let mut world = s.build();
        let mut hero = false;
        recruit_as(&mut world, 1, &mut hero);
        recruit_as(&mut world, 1, &mut hero);
        assert_eq!(world.garrisons.count_of(10, "Warden"), 1);

        // Already fielded, so a fresh turn does not add a second one.
        let mut hero = false;
        recruit_as(&mut world, 1, &mut hero);
        assert_eq!(world.garrisons.count_of(10, "Warden"), 1);
        assert!(!hero);
    }

    #[test]
    fn legendary_only_after_turn_fourteen() {
        let mut s = realm(1_000_000, 1);
        s.unit(1, "Titan", (5000, 100, 100), UnitClass::Legendary);
        let mut world = s.build();
        world.turn = LEGENDARY_TURN;
        recruit_as(&mut world, 1, &mut false);
        assert_eq!(world.garrisons.count_of(10, "Titan"), 0);

        world.turn = LEGENDARY_TURN + 1;
        recruit_as(&mut world, 1, &mut false);
        assert_eq!(world.garrisons.count_of(10, "Titan"), 1);
    }
}
