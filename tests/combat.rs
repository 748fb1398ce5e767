mod common;

use common::*;
use conquest_core::model::*;
use conquest_core::sim::combat::{BattleOutcome, BattleUnit, merge_army};

fn assert_stack_invariants(units: &[BattleUnit]) {
    for u in units {
        assert!(u.count >= 0, "{} went negative", u.name);
        assert_eq!(u.killed(), u.initial_count - u.count);
        if u.class.is_singular() {
            assert!(u.count <= 1 || u.count == u.initial_count, "{} split", u.name);
        }
    }
}

#[test]
fn scenario_a_larger_stack_overwhelms_defenders() {
    let mut s = battlefield();
    s.unit(ATTACKER, "Lancer", (100, 20, 50), UnitClass::Base);
    s.unit(DEFENDER, "Spearman", (80, 30, 60), UnitClass::Base);
    let mut world = s.build();

    let result = fight(&mut world, &[("Lancer", 100)], &[("Spearman", 50)]);

    assert!(result.attacker_won);
    assert_eq!(result.defenders[0].count, 0);
    assert_eq!(result.attackers[0].count, 55);
    assert_stack_invariants(&result.attackers);
    assert_stack_invariants(&result.defenders);
}

#[test]
fn scenario_b_hero_chain_kills_two_stacks() {
    let mut s = battlefield();
    s.unit(ATTACKER, "Blademaster", (10_000, 10, 10), UnitClass::Champion);
    s.unit(DEFENDER, "Guard", (5, 100, 100), UnitClass::Base);
    s.unit(DEFENDER, "Archer", (6, 100, 100), UnitClass::Base);
    let mut world = s.build();

    let result = fight(&mut world, &[("Blademaster", 1)], &[("Guard", 1), ("Archer", 1)]);

    assert!(result.attacker_won);
    assert!(result.defenders.iter().all(|d| d.count == 0));
    assert_eq!(result.attackers[0].count, 1);
    assert_stack_invariants(&result.attackers);
}

#[test]
fn scenario_c_hero_beats_legendary() {
    let mut s = battlefield();
    s.unit(ATTACKER, "Blademaster", (10_000, 1000, 1000), UnitClass::Champion);
    s.unit(DEFENDER, "Wyrm", (9_999, 1000, 1000), UnitClass::Legendary);
    let mut world = s.build();

    let result = fight(&mut world, &[("Blademaster", 1)], &[("Wyrm", 1)]);

    assert!(result.attacker_won);
    assert_eq!(result.attackers[0].count, 1);
    assert_eq!(result.defenders[0].count, 0);
}

#[test]
fn winning_attacker_takes_city_and_leaves_source() {
    let mut s = battlefield();
    s.unit(ATTACKER, "Lancer", (100, 20, 50), UnitClass::Base);
    s.unit(DEFENDER, "Spearman", (80, 30, 60), UnitClass::Base);
    let mut world = s.build();

    fight(&mut world, &[("Lancer", 100)], &[("Spearman", 50)]);

    assert_eq!(world.city_owner(TARGET_CITY), Some(ATTACKER));
    assert_eq!(world.garrisons.count_of(TARGET_CITY, "Lancer"), 55);
    assert_eq!(world.garrisons.count_of(TARGET_CITY, "Spearman"), 0);
    assert!(world.garrisons.city(SOURCE_CITY).is_empty());
}

#[test]
fn failed_attack_keeps_defender_survivors_only() {
    let mut s = battlefield();
    s.unit(ATTACKER, "Scout", (10, 5, 5), UnitClass::Base);
    s.unit(DEFENDER, "Spearman", (80, 30, 60), UnitClass::Base);
    let mut world = s.build();

    let result = fight(&mut world, &[("Scout", 10)], &[("Spearman", 50)]);

    assert!(!result.attacker_won);
    assert_eq!(world.city_owner(TARGET_CITY), Some(DEFENDER));
    assert_eq!(world.garrisons.count_of(TARGET_CITY, "Spearman"), result.defenders[0].count);
    assert!(result.defenders[0].count > 0);
    assert!(world.garrisons.city(SOURCE_CITY).is_empty());
}

#[test]
fn stacks_without_a_template_sit_out_and_stay() {
    let mut s = battlefield();
    s.unit(ATTACKER, "Scout", (10, 5, 5), UnitClass::Base);
    s.unit(DEFENDER, "Spearman", (80, 30, 60), UnitClass::Base);
    let mut world = s.build();

    let result = fight(&mut world, &[("Scout", 10)], &[("Spearman", 50), ("Ghost", 40)]);

    assert!(!result.attacker_won);
    assert_eq!(result.defenders.len(), 1);
    assert_eq!(world.garrisons.count_of(TARGET_CITY, "Ghost"), 40);
    assert_eq!(world.garrisons.count_of(TARGET_CITY, "Spearman"), result.defenders[0].count);
}

#[test]
fn unknown_attacking_stack_stays_home() {
    let mut s = battlefield();
    s.unit(ATTACKER, "Lancer", (100, 20, 50), UnitClass::Base);
    s.unit(DEFENDER, "Spearman", (80, 30, 60), UnitClass::Base);
    let mut world = s.build();

    fight(&mut world, &[("Lancer", 100), ("Ghost", 9)], &[("Spearman", 50)]);

    assert_eq!(world.garrisons.count_of(SOURCE_CITY, "Ghost"), 9);
    assert_eq!(world.garrisons.count_of(TARGET_CITY, "Ghost"), 0);
    assert_eq!(world.garrisons.count_of(TARGET_CITY, "Lancer"), 55);
}

#[test]
fn empty_attack_cannot_win() {
    let mut s = battlefield();
    s.unit(DEFENDER, "Spearman", (80, 30, 60), UnitClass::Base);
    let mut world = s.build();

    let result = fight(&mut world, &[], &[("Spearman", 5)]);

    assert!(!result.attacker_won);
    assert_eq!(world.garrisons.count_of(TARGET_CITY, "Spearman"), 5);
    assert_eq!(world.city_owner(TARGET_CITY), Some(DEFENDER));
}

#[test]
fn empty_defence_is_captured_without_losses() {
    let mut s = battlefield();
    s.unit(ATTACKER, "Lancer", (100, 20, 50), UnitClass::Base);
    let mut world = s.build();

    let result = fight(&mut world, &[("Lancer", 7)], &[]);

    assert!(result.attacker_won);
    assert_eq!(result.attackers[0].killed(), 0);
    assert_eq!(world.garrisons.count_of(TARGET_CITY, "Lancer"), 7);
    assert_eq!(world.city_owner(TARGET_CITY), Some(ATTACKER));
}

#[test]
fn heroes_buff_rank_and_file() {
    let mut s = battlefield();
    s.unit(ATTACKER, "Scout", (10, 5, 5), UnitClass::Base);
    s.unit(ATTACKER, "Captain", (90, 25, 55), UnitClass::Hero);
    s.unit(DEFENDER, "Spearman", (80, 30, 60), UnitClass::Base);
    let mut world = s.build();

    let result = fight(&mut world, &[("Scout", 100), ("Captain", 1)], &[("Spearman", 50)]);

    let scout = result.attackers.iter().find(|u| u.name == "Scout").unwrap();
    assert_eq!((scout.attack, scout.defense, scout.durability), (100, 30, 60));
    let captain = result.attackers.iter().find(|u| u.name == "Captain").unwrap();
    assert_eq!(captain.attack, 90);
    assert!(result.attacker_won);
}

#[test]
fn siege_damage_destroys_hospitals_first() {
    let mut s = battlefield();
    s.unit(ATTACKER, "Ram", (45_900, 1, 1), UnitClass::Base);
    s.unit(DEFENDER, "Guard", (1, 1, 1), UnitClass::Base);
    let mut world = s.build();

    let result = fight(&mut world, &[("Ram", 3)], &[("Guard", 1)]);

    assert_eq!(result.report.buildings_destroyed.hospitals, 3);
    assert_eq!(result.report.buildings_destroyed.factories, 0);
    assert_eq!(world.buildings_of(TARGET_CITY).hospitals, 7);
}

#[test]
fn surviving_champion_gains_veterancy() {
    let mut s = battlefield();
    s.unit(ATTACKER, "Blademaster", (10_000, 10, 10), UnitClass::Champion);
    s.unit(DEFENDER, "Guard", (5, 100, 100), UnitClass::Base);
    let mut world = s.build();

    fight(&mut world, &[("Blademaster", 1)], &[("Guard", 1)]);

    let template = world.catalog.get(ATTACKER, "Blademaster").unwrap();
    assert_eq!(template.attack, 11_000);
}

#[test]
fn fallen_champion_respawns_at_seasonal_baseline() {
    let mut s = battlefield();
    s.unit(ATTACKER, "Blademaster", (100, 10, 10), UnitClass::Champion);
    s.unit(DEFENDER, "Wall", (5, 5000, 5000), UnitClass::Base);
    let mut world = s.build();
    if let Some(faction) = world.factions.get_mut(&ATTACKER) {
        faction.seasonal[0] = SeasonModifier {
            stat_multiplier: 1.5,
            cost_multiplier: 2.0,
        };
    }
    if let Some(t) = world.catalog.get_mut(ATTACKER, "Blademaster") {
        t.attack = 400;
    }

    let result = fight(&mut world, &[("Blademaster", 1)], &[("Wall", 1)]);

    assert!(!result.attacker_won);
    let template = world.catalog.get(ATTACKER, "Blademaster").unwrap();
    assert_eq!(template.attack, 150);
    assert_eq!(template.defense, 15);
    assert_eq!(template.cost.currency, 200);
}

#[test]
fn report_is_labelled_for_the_human_side() {
    let mut s = battlefield();
    s.unit(ATTACKER, "Lancer", (100, 20, 50), UnitClass::Base);
    s.unit(DEFENDER, "Spearman", (80, 30, 60), UnitClass::Base);
    let mut world = s.build();

    let result = fight(&mut world, &[("Lancer", 100)], &[("Spearman", 50)]);

    assert_eq!(result.report.player_outcome, Some(BattleOutcome::Defeat));
    assert_eq!(result.report.player_label(), Some("Поражение"));
    let spearmen = result
        .report
        .lines
        .iter()
        .find(|l| l.unit_name == "Spearman")
        .unwrap();
    assert_eq!(spearmen.losses, 50);
    assert_eq!(spearmen.outcome, BattleOutcome::Defeat);
    let lancers = result.report.lines.iter().find(|l| l.unit_name == "Lancer").unwrap();
    assert_eq!(lancers.outcome.label(), "Победа");
    assert_eq!(lancers.losses, 45);
}

#[test]
fn merging_merged_army_is_a_no_op() {
    let army = vec![
        GarrisonEntry::new(1, "Lancer", 3),
        GarrisonEntry::new(1, "Scout", 2),
        GarrisonEntry::new(1, "Lancer", 4),
    ];
    let once = merge_army(&army);
    assert_eq!(once.len(), 2);
    assert_eq!(once[0].count, 7);
    assert_eq!(merge_army(&once), once);
}
