use serde::{Deserialize, Serialize};

use crate::model::{CityId, FactionId, RejectReason, ResourceKind};

/// Something notable that happened during a turn, reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Turn number the signal was emitted on.
    pub turn: u32,
    /// What happened.
    pub kind: SignalKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalKind {
    /// A faction flipped its relation with another to war.
    WarDeclared {
        attacker_id: FactionId,
        defender_id: FactionId,
    },

    /// A battle was resolved at a city.
    BattleFought {
        city_id: CityId,
        attacker_id: FactionId,
        defender_id: Option<FactionId>,
        attacker_won: bool,
    },

    /// A city changed hands after a battle.
    CityCaptured {
        city_id: CityId,
        old_owner: Option<FactionId>,
        new_owner: FactionId,
    },

    /// A neutral city was claimed without a fight.
    NeutralCityClaimed {
        city_id: CityId,
        faction_id: FactionId,
    },

    /// Siege damage destroyed buildings.
    BuildingsDestroyed {
        city_id: CityId,
        hospitals: i64,
        factories: i64,
    },

    /// New buildings were constructed.
    BuildingsConstructed {
        city_id: CityId,
        hospitals: i64,
        factories: i64,
    },

    /// A pending trade agreement was executed.
    TradeExecuted {
        agreement_id: u64,
        proposer: FactionId,
        target: FactionId,
    },

    /// A pending trade agreement was turned down.
    TradeRejected {
        agreement_id: u64,
        reason: RejectReason,
    },

    /// Two factions became allies.
    AllianceFormed { a: FactionId, b: FactionId },

    /// Units were bought and stationed in a city.
    UnitsRecruited {
        faction_id: FactionId,
        city_id: CityId,
        unit_name: String,
        count: i64,
    },

    /// Crystal ran out and the population shrank.
    Starvation {
        faction_id: FactionId,
        population_lost: i64,
    },

    /// Crystal was sold on the market.
    CrystalSold {
        faction_id: FactionId,
        amount: i64,
        revenue: i64,
    },

    /// Resources changed hands outside a standing agreement (negotiation, deals).
    ResourcesTransferred {
        from: FactionId,
        to: FactionId,
        kind: ResourceKind,
        amount: i64,
    },
}
