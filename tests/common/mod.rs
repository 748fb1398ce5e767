use conquest_core::model::*;
use conquest_core::scenario::Scenario;
use conquest_core::sim::combat::{self, BattleResult, Engagement};

pub const ATTACKER: FactionId = 1;
pub const DEFENDER: FactionId = 2;
pub const SOURCE_CITY: CityId = 10;
pub const TARGET_CITY: CityId = 20;

/// Two neighbouring factions, AI attacker and human defender, one city each.
pub fn battlefield() -> Scenario {
    let mut s = Scenario::new();
    s.faction(ATTACKER, "Raiders", Ideology::Struggle, Controller::Ai)
        .currency(10_000)
        .population(10_000);
    s.faction(DEFENDER, "Keepers", Ideology::Order, Controller::Human)
        .currency(10_000)
        .population(10_000);
    s.city(SOURCE_CITY, "Camp", 0, 0).owner(ATTACKER);
    s.city(TARGET_CITY, "Keep", 50, 0)
        .owner(DEFENDER)
        .buildings(10, 10);
    s
}

/// Station the armies, then fight at the target city.
pub fn fight(world: &mut World, attackers: &[(&str, i64)], defenders: &[(&str, i64)]) -> BattleResult {
    for (name, count) in attackers {
        world.garrisons.upsert(SOURCE_CITY, name, *count, "");
    }
    for (name, count) in defenders {
        world.garrisons.upsert(TARGET_CITY, name, *count, "");
    }
    let attacking_army = world.garrisons.city(SOURCE_CITY).to_vec();
    let defending_army = world.garrisons.city(TARGET_CITY).to_vec();
    combat::resolve(
        world,
        &attacking_army,
        &defending_army,
        Engagement {
            attacking_city: SOURCE_CITY,
            defending_city: TARGET_CITY,
            attacking_faction: ATTACKER,
            defending_faction: Some(DEFENDER),
        },
    )
    .unwrap()
}

pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Small but complete world touching every stored table.
pub fn build_test_world() -> World {
    let mut s = Scenario::new().at_turn(7);
    s.faction(1, "Northern Reach", Ideology::Submission, Controller::Ai)
        .currency(12_000)
        .crystal(3_000)
        .labor(400)
        .population(50_000);
    s.faction(2, "Southern\tIsles", Ideology::Freedom, Controller::Human)
        .currency(8_000)
        .crystal(900)
        .population(20_000);
    s.unit(1, "Pikeman", (30, 20, 40), UnitClass::Base);
    s.unit(2, "Corsair", (2500, 1200, 2000), UnitClass::Champion);
    s.city(10, "Frosthold", 0, 0)
        .owner(1)
        .buildings(12, 8)
        .garrison("Pikeman", 40);
    s.city(20, "Saltport", 120, 30)
        .owner(2)
        .crystal_coefficient(1.5)
        .buildings(3, 5)
        .garrison("Corsair", 1);
    s.city(30, "Nowhere", 60, 60);
    s.relation(1, 2, 18, RelationKind::War);

    let mut world = s.build();
    if let Some(t) = world.catalog.get_mut(2, "Corsair") {
        t.attack = 2750;
    }
    world.market.crystal_price = 1.3;
    world.propose_trade(
        1,
        2,
        TradeLeg::new(ResourceKind::Currency, 500),
        TradeLeg::new(ResourceKind::Crystal, 300),
    );
    let id = world.propose_trade(
        2,
        1,
        TradeLeg::new(ResourceKind::Labor, 10),
        TradeLeg::new(ResourceKind::Population, 100),
    );
    if let Some(a) = world.trade_agreements.iter_mut().find(|a| a.id == id) {
        a.status = TradeStatus::Rejected(RejectReason::UnfavorableRatio);
    }
    world
}
