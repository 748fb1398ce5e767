use std::cmp::Reverse;

use tracing::info;

use super::context::TurnContext;
use super::signal::SignalKind;
use crate::model::{BuildingKind, Buildings, CityId, FactionId, World};

pub const BUILDING_COST: i64 = 125;
/// Ideal count of each kind; hospitals and factories are kept 1:1.
pub const TARGET_PER_KIND: i64 = 250;
pub const CITY_BUILDING_CAP: i64 = 2 * TARGET_PER_KIND;
const CONSTRUCTION_SPEND_SHARE: f64 = 0.99;

/// The owned city with the most buildings; ties go to the lowest id.
pub fn most_developed_city(world: &World, faction: FactionId) -> Option<CityId> {
    world
        .cities_of(faction)
        .max_by_key(|c| (world.buildings_of(c.id).total(), Reverse(c.id)))
        .map(|c| c.id)
}

/// How many of each kind to add to `current` with `budget` currency.
///
/// Each new building goes to whichever kind is behind, hospitals first on a tie.
pub fn plan_construction(current: Buildings, budget: i64) -> Buildings {
    let affordable = (budget / BUILDING_COST).max(0);
    let room = (CITY_BUILDING_CAP - current.total()).max(0);
    let mut planned = Buildings::default();
    for _ in 0..affordable.min(room) {
        let hospitals = current.hospitals + planned.hospitals;
        let factories = current.factories + planned.factories;
        let kind = if hospitals <= factories {
            BuildingKind::Hospital
        } else {
            BuildingKind::Factory
        };
        *planned.get_mut(kind) += 1;
    }
    planned
}

/// Spend most of the treasury on hospitals and factories in the best city.
pub fn construct(ctx: &mut TurnContext) {
    let me = ctx.faction;
    let Some(city_id) = most_developed_city(ctx.world, me) else {
        return;
    };
    let Some(currency) = ctx.world.stock(me).map(|s| s.currency) else {
        return;
    };
    let budget = (currency as f64 * CONSTRUCTION_SPEND_SHARE).floor() as i64;
    let current = ctx.world.buildings_of(city_id);
    let planned = plan_construction(current, budget);
    if planned.total() == 0 {
        return;
    }

    let cost = planned.total() * BUILDING_COST;
    if let Some(stock) = ctx.world.stock_mut(me) {
        stock.currency -= cost;
    }
    ctx.world.buildings.insert(
        city_id,
        Buildings {
            hospitals: current.hospitals + planned.hospitals,
            factories: current.factories + planned.factories,
        },
    );
    info!(
        faction = me,
        city = city_id,
        hospitals = planned.hospitals,
        factories = planned.factories,
        cost,
        "buildings constructed"
    );
    ctx.emit(SignalKind::BuildingsConstructed {
        city_id,
        hospitals: planned.hospitals,
        factories: planned.factories,
    });
}
