use crate::model::{FactionId, World};

pub const PROVOCATION_BASE_PRICE: i64 = 50_000;
const MIN_REQUESTER_LEVEL: i64 = 20;
const DISCOUNT_FLOOR: i64 = 60;
const FREE_ROLL_FLOOR: i64 = 80;
const ALWAYS_FREE_LEVEL: i64 = 90;
const FREE_ROLL_CHANCE: f64 = 0.75;
const MAX_DISCOUNT: f64 = 0.6;
/// A target this close to the AI is never attacked for free.
const CLOSE_FRIEND_LEVEL: i64 = 80;

/// The AI's answer to "attack that faction for me".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Refused,
    Free,
    Price(i64),
}

/// Price the provocation. `roll` is a uniform draw in `[0, 1)`.
pub fn quote(world: &World, ai: FactionId, requester: FactionId, target: FactionId, roll: f64) -> Quote {
    if target == ai || target == requester || !world.factions.contains_key(&target) {
        return Quote::Refused;
    }
    if world.diplomacy.allied(ai, target) || world.diplomacy.at_war(ai, requester) {
        return Quote::Refused;
    }
    let level = world.diplomacy.level(ai, requester);
    if level < MIN_REQUESTER_LEVEL {
        return Quote::Refused;
    }

    let target_is_close = world.diplomacy.level(ai, target) >= CLOSE_FRIEND_LEVEL;
    if !target_is_close {
        if level >= ALWAYS_FREE_LEVEL {
            return Quote::Free;
        }
        if level >= FREE_ROLL_FLOOR && roll < FREE_ROLL_CHANCE {
            return Quote::Free;
        }
    }
    Quote::Price(price_for_level(level))
}

fn price_for_level(level: i64) -> i64 {
    let base = PROVOCATION_BASE_PRICE as f64;
    let price = if level >= DISCOUNT_FLOOR {
        let span = (ALWAYS_FREE_LEVEL - DISCOUNT_FLOOR) as f64;
        let progress = ((level - DISCOUNT_FLOOR) as f64 / span).min(1.0);
        base * (1.0 - MAX_DISCOUNT * progress)
    } else {
        base * (1.0 + (DISCOUNT_FLOOR - level) as f64 / DISCOUNT_FLOOR as f64)
    };
    price.round() as i64
}
