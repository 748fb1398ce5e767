use tracing::debug;

use super::BattleUnit;
use super::siege::damage_to_infrastructure;
use crate::model::Buildings;

/// Outcome of a single attacker-versus-defender exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuelOutcome {
    pub total_attack: i64,
    pub total_defense: i64,
    pub attacker_won: bool,
}

/// Resolve one duel, mutating both stacks' counts.
///
/// The winner keeps `floor(remaining_power / per_unit_power)` units; heroes and
/// legendaries keep exactly one if any power remains, else none. The loser is
/// wiped out. A tie eliminates both.
pub fn battle_chain(attacker: &mut BattleUnit, defender: &mut BattleUnit) -> DuelOutcome {
    let attack_power = attacker.attack.max(0);
    let defense_power = (defender.durability + defender.defense).max(1);
    let total_attack = attack_power.saturating_mul(attacker.count);
    let total_defense = defense_power.saturating_mul(defender.count);

    let attacker_won = total_attack > total_defense;
    if attacker_won {
        defender.count = 0;
        attacker.count = survivors(attacker, total_attack - total_defense, attack_power);
    } else {
        attacker.count = 0;
        defender.count = survivors(defender, total_defense - total_attack, defense_power);
    }

    debug!(
        attacker = %attacker.name,
        defender = %defender.name,
        total_attack,
        total_defense,
        attacker_won,
        "duel resolved"
    );

    DuelOutcome {
        total_attack,
        total_defense,
        attacker_won,
    }
}

fn survivors(unit: &BattleUnit, remaining_power: i64, per_unit_power: i64) -> i64 {
    if unit.class.is_singular() {
        i64::from(remaining_power >= 1)
    } else {
        (remaining_power / per_unit_power.max(1)).min(unit.count)
    }
}

/// Run every attacker against the defenders in priority order.
///
/// An attacker that wipes out its current defender moves on to the next one
/// for as long as it survives. Each exchange also lands its full attack on the
/// defending city's buildings. Returns the buildings destroyed in total.
pub fn run_duels(
    attackers: &mut [BattleUnit],
    defenders: &mut [BattleUnit],
    buildings: &mut Buildings,
) -> Buildings {
    let mut destroyed = Buildings::default();
    for attacker in attackers.iter_mut() {
        while attacker.count > 0 {
            let Some(defender) = defenders.iter_mut().find(|d| d.count > 0) else {
                break;
            };
            let outcome = battle_chain(attacker, defender);

            let lost = damage_to_infrastructure(outcome.total_attack, buildings);
            destroyed.hospitals += lost.hospitals;
            destroyed.factories += lost.factories;

            if !outcome.attacker_won {
                break;
            }
        }
    }
    destroyed
}
