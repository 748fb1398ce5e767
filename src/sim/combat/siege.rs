use crate::model::{BuildingKind, Buildings};

/// Attack needed to knock down one building.
pub const DAMAGE_PER_BUILDING: i64 = 45_900;

/// Destruction order: hospitals go first.
const DAMAGE_ORDER: [BuildingKind; 2] = [BuildingKind::Hospital, BuildingKind::Factory];

/// Convert a duel's total attack into destroyed buildings, mutating `buildings`.
///
/// Returns how many of each kind were destroyed; never more than were present.
pub fn damage_to_infrastructure(total_attack: i64, buildings: &mut Buildings) -> Buildings {
    let mut budget = total_attack.max(0) / DAMAGE_PER_BUILDING;
    let mut destroyed = Buildings::default();
    for kind in DAMAGE_ORDER {
        if budget == 0 {
            break;
        }
        let present = buildings.get_mut(kind);
        let lost = budget.min(*present);
        *present -= lost;
        *destroyed.get_mut(kind) += lost;
        budget -= lost;
    }
    destroyed
}
