mod duel;
mod report;
mod siege;

pub use duel::{DuelOutcome, battle_chain, run_duels};
pub use report::{BattleOutcome, BattleReport, ReportLine, Side};
pub use siege::{DAMAGE_PER_BUILDING, damage_to_infrastructure};

use tracing::{info, warn};

use crate::error::{CoreError, Result};
use crate::model::{CityId, FactionId, GarrisonEntry, UnitClass, World};
use report::{ReportInput, build_report};

/// Attack bonus a surviving class-3 stack earns on its faction's template.
const VETERANCY_ATTACK_BONUS: f64 = 0.10;

/// A unit stack during battle: the merged garrison entry plus a stats snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleUnit {
    pub name: String,
    pub image: String,
    pub initial_count: i64,
    pub count: i64,
    pub attack: i64,
    pub defense: i64,
    pub durability: i64,
    pub class: UnitClass,
}

impl BattleUnit {
    pub fn killed(&self) -> i64 {
        self.initial_count - self.count
    }
}

/// Everything the caller needs after a battle.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleResult {
    pub attacker_won: bool,
    pub attackers: Vec<BattleUnit>,
    pub defenders: Vec<BattleUnit>,
    pub report: BattleReport,
}

/// Who fights where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engagement {
    pub attacking_city: CityId,
    pub defending_city: CityId,
    pub attacking_faction: FactionId,
    pub defending_faction: Option<FactionId>,
}

/// Collapse entries with the same unit name into one stack, keeping first-seen order.
pub fn merge_army(army: &[GarrisonEntry]) -> Vec<GarrisonEntry> {
    let mut merged: Vec<GarrisonEntry> = Vec::with_capacity(army.len());
    for entry in army {
        match merged.iter_mut().find(|m| m.unit_name == entry.unit_name) {
            Some(stack) => stack.count += entry.count,
            None => merged.push(entry.clone()),
        }
    }
    merged
}

/// Sum class-2 and class-3 stats and add them to every class-1 unit on the side.
pub fn apply_hero_bonus(side: &mut [BattleUnit]) {
    let (mut attack, mut defense, mut durability) = (0, 0, 0);
    for hero in side
        .iter()
        .filter(|u| matches!(u.class, UnitClass::Hero | UnitClass::Champion))
    {
        attack += hero.attack;
        defense += hero.defense;
        durability += hero.durability;
    }
    for unit in side.iter_mut().filter(|u| u.class == UnitClass::Base) {
        unit.attack += attack;
        unit.defense += defense;
        unit.durability += durability;
    }
}

/// Lower class first; within a class, higher attack first.
pub fn sort_by_priority(side: &mut [BattleUnit]) {
    side.sort_by_key(|u| (u.class, std::cmp::Reverse(u.attack)));
}

/// Battle stacks for one side, plus the entries whose template is unknown.
/// Those sit the battle out.
fn build_side(
    world: &World,
    army: &[GarrisonEntry],
    faction: Option<FactionId>,
) -> (Vec<BattleUnit>, Vec<GarrisonEntry>) {
    let mut units = Vec::new();
    let mut skipped = Vec::new();
    for entry in merge_army(army).into_iter().filter(|e| e.count > 0) {
        let template = match faction {
            Some(f) => world.catalog.get(f, &entry.unit_name),
            None => world.catalog.iter().find(|t| t.name == entry.unit_name),
        };
        let Some(template) = template else {
            warn!(unit = %entry.unit_name, ?faction, "unknown unit template, skipping stack");
            skipped.push(entry);
            continue;
        };
        units.push(BattleUnit {
            initial_count: entry.count,
            count: entry.count,
            attack: template.attack,
            defense: template.defense,
            durability: template.durability,
            class: template.class,
            name: entry.unit_name,
            image: entry.image,
        });
    }
    (units, skipped)
}

/// Resolve a battle and apply its consequences to the world.
///
/// Garrisons, building counts and city ownership are mutated in place. An
/// empty attacking army cannot win; an empty defending army is captured
/// without losses.
pub fn resolve(
    world: &mut World,
    attacking_army: &[GarrisonEntry],
    defending_army: &[GarrisonEntry],
    engagement: Engagement,
) -> Result<BattleResult> {
    for city in [engagement.attacking_city, engagement.defending_city] {
        if !world.cities.contains_key(&city) {
            return Err(CoreError::UnknownCity(city));
        }
    }

    let (mut attackers, _) = build_side(world, attacking_army, Some(engagement.attacking_faction));
    let (mut defenders, idle_defenders) =
        build_side(world, defending_army, engagement.defending_faction);

    apply_hero_bonus(&mut attackers);
    apply_hero_bonus(&mut defenders);
    sort_by_priority(&mut attackers);
    sort_by_priority(&mut defenders);

    let mut buildings = world.buildings_of(engagement.defending_city);
    let destroyed = run_duels(&mut attackers, &mut defenders, &mut buildings);
    world.buildings.insert(engagement.defending_city, buildings);

    let attacker_won = attackers.iter().any(|u| u.count > 0);

    update_garrisons_after_battle(world, &attackers, &defenders, engagement, attacker_won);
    if attacker_won {
        if !idle_defenders.is_empty() {
            warn!(
                city = engagement.defending_city,
                stacks = idle_defenders.len(),
                "unresolved stacks lost with the city"
            );
        }
    } else {
        for entry in &idle_defenders {
            world.garrisons.upsert(
                engagement.defending_city,
                &entry.unit_name,
                entry.count,
                &entry.image,
            );
        }
    }
    if attacker_won {
        grant_veterancy(world, engagement.attacking_faction, &attackers);
    } else if let Some(defender) = engagement.defending_faction {
        grant_veterancy(world, defender, &defenders);
    }
    reset_unfielded_champions(world, engagement.attacking_faction);
    if let Some(defender) = engagement.defending_faction {
        reset_unfielded_champions(world, defender);
    }

    info!(
        city = engagement.defending_city,
        attacker = engagement.attacking_faction,
        defender = ?engagement.defending_faction,
        attacker_won,
        hospitals_destroyed = destroyed.hospitals,
        factories_destroyed = destroyed.factories,
        "battle resolved"
    );

    let report = build_report(ReportInput {
        city_id: engagement.defending_city,
        attacker: engagement.attacking_faction,
        defender: engagement.defending_faction,
        human: world.human_faction(),
        attacker_won,
        buildings_destroyed: destroyed,
        attackers: &attackers,
        defenders: &defenders,
    });

    Ok(BattleResult {
        attacker_won,
        attackers,
        defenders,
        report,
    })
}

/// Fold battle survivors back into garrisons and transfer the city on capture.
///
/// The defending garrison is always replaced: by the surviving attackers when
/// the city falls, by the surviving defenders otherwise. Deployed attackers
/// always leave their source city.
pub fn update_garrisons_after_battle(
    world: &mut World,
    attackers: &[BattleUnit],
    defenders: &[BattleUnit],
    engagement: Engagement,
    attacker_won: bool,
) {
    world.garrisons.clear_city(engagement.defending_city);
    let survivors = if attacker_won { attackers } else { defenders };
    for unit in survivors.iter().filter(|u| u.count > 0) {
        world
            .garrisons
            .upsert(engagement.defending_city, &unit.name, unit.count, &unit.image);
    }

    for unit in attackers {
        world
            .garrisons
            .decrement(engagement.attacking_city, &unit.name, unit.initial_count);
    }

    if attacker_won {
        if let Some(city) = world.cities.get_mut(&engagement.defending_city) {
            city.owner = Some(engagement.attacking_faction);
        }
    }
}

fn grant_veterancy(world: &mut World, faction: FactionId, survivors: &[BattleUnit]) {
    for unit in survivors
        .iter()
        .filter(|u| u.count > 0 && u.class == UnitClass::Champion)
    {
        if let Some(template) = world.catalog.get_mut(faction, &unit.name) {
            template.attack += (template.attack as f64 * VETERANCY_ATTACK_BONUS).round() as i64;
        }
    }
}

/// If a faction no longer fields any class-3 unit, its class-3 templates
/// respawn at baseline stats under the current season's modifiers.
pub fn reset_unfielded_champions(world: &mut World, faction: FactionId) {
    if world.fields_class(faction, UnitClass::Champion) {
        return;
    }
    let Some(modifier) = world
        .factions
        .get(&faction)
        .map(|f| f.season_modifier(world.season()))
    else {
        return;
    };
    world.catalog.reset_champions(faction, modifier);
}
