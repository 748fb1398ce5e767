use tracing::{info, warn};

use super::combat::{self, BattleReport, Engagement};
use super::context::TurnContext;
use super::signal::SignalKind;
use crate::model::{CityId, FactionId, RelationKind, World};

/// Cities farther apart than this cannot be attacked.
pub const MAX_ATTACK_DISTANCE: i64 = 280;
/// Relationship below which war is considered.
pub const WAR_LEVEL_THRESHOLD: i64 = 12;
/// Required strength advantage before declaring war.
pub const WAR_STRENGTH_RATIO: f64 = 1.4;

/// Closest (source, target) pair between an own garrisoned city and an enemy city.
pub fn nearest_target(world: &World, me: FactionId, enemy: FactionId) -> Option<(CityId, CityId)> {
    let mut best: Option<(i64, CityId, CityId)> = None;
    for source in world.cities_of(me).filter(|c| !world.garrisons.is_empty(c.id)) {
        for target in world.cities_of(enemy) {
            let distance = source.manhattan_distance(target);
            if distance >= MAX_ATTACK_DISTANCE {
                continue;
            }
            if best.is_none_or(|(d, _, _)| distance < d) {
                best = Some((distance, source.id, target.id));
            }
        }
    }
    best.map(|(_, source, target)| (source, target))
}

/// Send the whole garrison of `source` against `target`.
pub fn attack(ctx: &mut TurnContext, source: CityId, target: CityId) -> Option<BattleReport> {
    let me = ctx.faction;
    let defender = ctx.world.city_owner(target);
    let attacking_army = ctx.world.garrisons.city(source).to_vec();
    let defending_army = ctx.world.garrisons.city(target).to_vec();

    let engagement = Engagement {
        attacking_city: source,
        defending_city: target,
        attacking_faction: me,
        defending_faction: defender,
    };
    let result = match combat::resolve(ctx.world, &attacking_army, &defending_army, engagement) {
        Ok(result) => result,
        Err(err) => {
            warn!(faction = me, source, target, %err, "attack skipped");
            return None;
        }
    };

    ctx.emit(SignalKind::BattleFought {
        city_id: target,
        attacker_id: me,
        defender_id: defender,
        attacker_won: result.attacker_won,
    });
    let destroyed = result.report.buildings_destroyed;
    if destroyed.total() > 0 {
        ctx.emit(SignalKind::BuildingsDestroyed {
            city_id: target,
            hospitals: destroyed.hospitals,
            factories: destroyed.factories,
        });
    }
    if result.attacker_won {
        ctx.emit(SignalKind::CityCaptured {
            city_id: target,
            old_owner: defender,
            new_owner: me,
        });
    }
    Some(result.report)
}

/// Keep fighting existing wars, start new ones against weak and hated
/// neighbours, then claim a neutral city if the army is not empty.
pub fn wage_wars(ctx: &mut TurnContext) -> Vec<BattleReport> {
    let me = ctx.faction;
    let own_strength = ctx.world.army_strength(me);
    let others: Vec<FactionId> = ctx
        .world
        .factions
        .keys()
        .copied()
        .filter(|&f| f != me)
        .collect();

    let mut reports = Vec::new();
    for other in others {
        let rel = ctx.world.diplomacy.get(me, other);
        let at_war = rel.kind == RelationKind::War;
        if !at_war {
            let their_strength = ctx.world.army_strength(other);
            let provoked = rel.level < WAR_LEVEL_THRESHOLD
                && rel.kind != RelationKind::Alliance
                && own_strength > WAR_STRENGTH_RATIO * their_strength;
            if !provoked {
                continue;
            }
            ctx.world.diplomacy.set_kind(me, other, RelationKind::War);
            info!(attacker = me, defender = other, own_strength, their_strength, "war declared");
            ctx.emit(SignalKind::WarDeclared {
                attacker_id: me,
                defender_id: other,
            });
        }
        if let Some((source, target)) = nearest_target(ctx.world, me, other) {
            reports.extend(attack(ctx, source, target));
        }
    }

    if ctx.world.army_strength(me) > 0.0 {
        claim_neutral_city(ctx);
    }
    reports
}

/// Take the unclaimed city nearest to any owned city, without a fight.
pub fn claim_neutral_city(ctx: &mut TurnContext) -> Option<CityId> {
    let me = ctx.faction;
    let world = &*ctx.world;
    let claim = world
        .cities
        .values()
        .filter(|c| c.is_neutral())
        .filter_map(|neutral| {
            world
                .cities_of(me)
                .map(|own| own.manhattan_distance(neutral))
                .min()
                .map(|d| (d, neutral.id))
        })
        .min()
        .map(|(_, id)| id)?;

    if let Some(city) = ctx.world.cities.get_mut(&claim) {
        city.owner = Some(me);
    }
    info!(faction = me, city = claim, "neutral city claimed");
    ctx.emit(SignalKind::NeutralCityClaimed {
        city_id: claim,
        faction_id: me,
    });
    Some(claim)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::model::{Controller, Ideology, UnitClass};
    use crate::scenario::Scenario;
    use crate::sim::Signal;

    fn two_realms(level: i64, distance: i64) -> Scenario {
        let mut s = Scenario::new();
        s.faction(1, "A", Ideology::Order, Controller::Ai);
        s.faction(2, "B", Ideology::Order, Controller::Ai);
        s.unit(1, "Pike", (100, 20, 50), UnitClass::Base);
        s.unit(2, "Guard", (10, 5, 5), UnitClass::Base);
        s.city(10, "A-home", 0, 0).owner(1).garrison("Pike", 100);
        s.city(20, "B-home", distance, 0).owner(2).garrison("Guard", 10);
        s.relation(1, 2, level, RelationKind::Peace);
        s
    }

    fn turn_of(world: &mut World, faction: FactionId) -> (Vec<BattleReport>, Vec<Signal>) {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut signals = Vec::new();
        let mut ctx = TurnContext {
            world,
            rng: &mut rng,
            signals: &mut signals,
            faction,
        };
        let reports = wage_wars(&mut ctx);
        (reports, signals)
    }

    #[test]
    fn targets_must_be_in_range() {
        let world = two_realms(50, MAX_ATTACK_DISTANCE).build();
        assert_eq!(nearest_target(&world, 1, 2), None);
        let world = two_realms(50, MAX_ATTACK_DISTANCE - 1).build();
        assert_eq!(nearest_target(&world, 1, 2), Some((10, 20)));
    }

    #[test]
    fn hated_weak_neighbour_is_attacked() {
        let mut world = two_realms(WAR_LEVEL_THRESHOLD - 1, 100).build();
        let (reports, signals) = turn_of(&mut world, 1);
        assert!(world.diplomacy.at_war(1, 2));
        assert_eq!(reports.len(), 1);
        assert!(reports[0].attacker_won);
        assert_eq!(world.city_owner(20), Some(1));
        assert!(
            signals
                .iter()
                .any(|s| matches!(s.kind, SignalKind::WarDeclared { attacker_id: 1, defender_id: 2 }))
        );
    }

    #[test]
    fn tolerated_neighbour_is_left_alone() {
        let mut world = two_realms(WAR_LEVEL_THRESHOLD, 100).build();
        let (reports, _) = turn_of(&mut world, 1);
        assert!(reports.is_empty());
        assert!(!world.diplomacy.at_war(1, 2));
    }

    #[test]
    fn allies_are_never_attacked() {
        let mut s = two_realms(0, 100);
        s.relation(1, 2, 0, RelationKind::Alliance);
        let mut world = s.build();
        let (reports, _) = turn_of(&mut world, 1);
        assert!(reports.is_empty());
    }

    #[test]
    fn claims_nearest_neutral_city() {
        let mut s = two_realms(50, 250);
        s.city(30, "Far", 0, 200);
        s.city(31, "Near", 0, 40);
        let mut world = s.build();
        let (_, signals) = turn_of(&mut world, 1);
        assert_eq!(world.city_owner(31), Some(1));
        assert_eq!(world.city_owner(30), None);
        assert!(
            signals
                .iter()
                .any(|s| matches!(s.kind, SignalKind::NeutralCityClaimed { city_id: 31, .. }))
        );
    }

    #[test]
    fn empty_army_claims_nothing() {
        let mut s = Scenario::new();
        s.faction(1, "A", Ideology::Order, Controller::Ai);
        s.city(10, "Home", 0, 0).owner(1);
        s.city(11, "Free", 10, 0);
        let mut world = s.build();
        turn_of(&mut world, 1);
        assert_eq!(world.city_owner(11), None);
    }
}
