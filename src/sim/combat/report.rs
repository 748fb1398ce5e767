use serde::{Deserialize, Serialize};

use super::BattleUnit;
use crate::model::{Buildings, CityId, FactionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Attacker,
    Defender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    Victory,
    Defeat,
}

impl BattleOutcome {
    pub fn label(self) -> &'static str {
        match self {
            BattleOutcome::Victory => "Победа",
            BattleOutcome::Defeat => "Поражение",
        }
    }

    fn for_side(side: Side, attacker_won: bool) -> Self {
        match (side, attacker_won) {
            (Side::Attacker, true) | (Side::Defender, false) => BattleOutcome::Victory,
            _ => BattleOutcome::Defeat,
        }
    }
}

/// One unit stack's line in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    pub side: Side,
    pub outcome: BattleOutcome,
    pub unit_name: String,
    pub image: String,
    pub initial: i64,
    pub remaining: i64,
    pub losses: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    pub city_id: CityId,
    pub attacker: FactionId,
    pub defender: Option<FactionId>,
    pub attacker_won: bool,
    /// Outcome from the human player's point of view, when they took part.
    pub player_outcome: Option<BattleOutcome>,
    pub buildings_destroyed: Buildings,
    pub lines: Vec<ReportLine>,
}

impl BattleReport {
    pub fn player_label(&self) -> Option<&'static str> {
        self.player_outcome.map(BattleOutcome::label)
    }
}

pub(super) struct ReportInput<'a> {
    pub city_id: CityId,
    pub attacker: FactionId,
    pub defender: Option<FactionId>,
    pub human: Option<FactionId>,
    pub attacker_won: bool,
    pub buildings_destroyed: Buildings,
    pub attackers: &'a [BattleUnit],
    pub defenders: &'a [BattleUnit],
}

pub(super) fn build_report(input: ReportInput<'_>) -> BattleReport {
    let player_side = match input.human {
        Some(h) if h == input.attacker => Some(Side::Attacker),
        Some(h) if Some(h) == input.defender => Some(Side::Defender),
        _ => None,
    };

    let mut lines = Vec::with_capacity(input.attackers.len() + input.defenders.len());
    for (side, units) in [
        (Side::Attacker, input.attackers),
        (Side::Defender, input.defenders),
    ] {
        let outcome = BattleOutcome::for_side(side, input.attacker_won);
        lines.extend(units.iter().map(|u| ReportLine {
            side,
            outcome,
            unit_name: u.name.clone(),
            image: u.image.clone(),
            initial: u.initial_count,
            remaining: u.count,
            losses: (u.initial_count - u.count).abs(),
        }));
    }

    BattleReport {
        city_id: input.city_id,
        attacker: input.attacker,
        defender: input.defender,
        attacker_won: input.attacker_won,
        player_outcome: player_side.map(|s| BattleOutcome::for_side(s, input.attacker_won)),
        buildings_destroyed: input.buildings_destroyed,
        lines,
    }
}
