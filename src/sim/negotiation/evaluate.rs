use crate::model::{FactionId, TradeLeg, World};
use crate::sim::diplomacy::calculate_coefficient;

const THRESHOLD_BANDS: [(i64, f64); 3] = [(35, 1.5), (60, 1.2), (80, 1.0)];
const THRESHOLD_TOP: f64 = 0.9;

const NEED_FACTOR: f64 = 1.25;
const AVAILABILITY_HALF: f64 = 0.6;
const AVAILABILITY_QUARTER: f64 = 0.85;

/// A trade seen from the AI's side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    pub ai_gives: TradeLeg,
    pub ai_receives: TradeLeg,
}

/// Minimum attractiveness the AI accepts at this relationship level.
pub fn acceptance_threshold(level: i64) -> f64 {
    THRESHOLD_BANDS
        .iter()
        .find(|(upper, _)| level < *upper)
        .map(|(_, t)| *t)
        .unwrap_or(THRESHOLD_TOP)
}

/// How comfortable the AI is parting with `amount` of its stock.
pub fn availability_factor(stock: i64, amount: i64) -> f64 {
    if amount > stock {
        0.0
    } else if amount * 2 > stock {
        AVAILABILITY_HALF
    } else if amount * 4 > stock {
        AVAILABILITY_QUARTER
    } else {
        1.0
    }
}

/// Bonus when the AI is short of what it would receive.
pub fn need_factor(stock: i64, received: i64) -> f64 {
    if stock < received { NEED_FACTOR } else { 1.0 }
}

/// `(value received / value given) × relation × availability × need`.
pub fn attractiveness(world: &World, ai: FactionId, counterpart: FactionId, proposal: Proposal) -> f64 {
    let Some(stock) = world.stock(ai) else {
        return 0.0;
    };
    let price = world.market.crystal_price;
    let given = proposal.ai_gives.value(price);
    let received = proposal.ai_receives.value(price);
    if given <= 0.0 {
        return f64::INFINITY;
    }
    let relation = calculate_coefficient(world.diplomacy.level(ai, counterpart));
    let availability = availability_factor(stock.get(proposal.ai_gives.kind), proposal.ai_gives.amount);
    let need = need_factor(stock.get(proposal.ai_receives.kind), proposal.ai_receives.amount);
    (received / given) * relation * availability * need
}

/// Offer amount that would lift `score` to `threshold`, rounded up.
pub fn counter_amount(offer_amount: i64, score: f64, threshold: f64) -> Option<i64> {
    if score <= 0.0 || !score.is_finite() {
        return None;
    }
    Some((offer_amount as f64 * threshold / score).ceil() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_relax_with_friendship() {
        assert_eq!(acceptance_threshold(10), 1.5);
        assert_eq!(acceptance_threshold(35), 1.2);
        assert_eq!(acceptance_threshold(70), 1.0);
        assert_eq!(acceptance_threshold(80), 0.9);
    }

    #[test]
    fn availability_shrinks_with_share_given() {
        assert_eq!(availability_factor(100, 101), 0.0);
        assert_eq!(availability_factor(100, 60), AVAILABILITY_HALF);
        assert_eq!(availability_factor(100, 30), AVAILABILITY_QUARTER);
        assert_eq!(availability_factor(100, 25), 1.0);
    }

    #[test]
    fn counter_scales_with_shortfall() {
        assert_eq!(counter_amount(1000, 0.5, 1.0), Some(2000));
        assert_eq!(counter_amount(1000, 0.0, 1.0), None);
    }
}
