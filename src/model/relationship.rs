use std::collections::BTreeMap;

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::faction::FactionId;

pub const LEVEL_MIN: i64 = 0;
pub const LEVEL_MAX: i64 = 100;
pub const DEFAULT_LEVEL: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Peace,
    War,
    Alliance,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Peace => "peace",
            RelationKind::War => "war",
            RelationKind::Alliance => "alliance",
        }
    }
}

impl Serialize for RelationKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RelationKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "peace" => Ok(RelationKind::Peace),
            "war" => Ok(RelationKind::War),
            "alliance" => Ok(RelationKind::Alliance),
            _ => Err(de::Error::custom(format!("unknown relation kind: {s}"))),
        }
    }
}

/// Unordered faction pair; `(a, b)` and `(b, a)` normalize to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactionPair(FactionId, FactionId);

impl FactionPair {
    pub fn new(a: FactionId, b: FactionId) -> Self {
        if a <= b {
            FactionPair(a, b)
        } else {
            FactionPair(b, a)
        }
    }

    pub fn first(&self) -> FactionId {
        self.0
    }

    pub fn second(&self) -> FactionId {
        self.1
    }

    pub fn contains(&self, faction: FactionId) -> bool {
        self.0 == faction || self.1 == faction
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub level: i64,
    pub kind: RelationKind,
}

impl Default for Relation {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            kind: RelationKind::Peace,
        }
    }
}

/// Pairwise relationship table. Symmetric by construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiplomacyState {
    relations: BTreeMap<FactionPair, Relation>,
}

impl DiplomacyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, a: FactionId, b: FactionId) -> Relation {
        self.relations
            .get(&FactionPair::new(a, b))
            .copied()
            .unwrap_or_default()
    }

    pub fn level(&self, a: FactionId, b: FactionId) -> i64 {
        self.get(a, b).level
    }

    pub fn kind(&self, a: FactionId, b: FactionId) -> RelationKind {
        self.get(a, b).kind
    }

    pub fn at_war(&self, a: FactionId, b: FactionId) -> bool {
        self.kind(a, b) == RelationKind::War
    }

    pub fn allied(&self, a: FactionId, b: FactionId) -> bool {
        self.kind(a, b) == RelationKind::Alliance
    }

    pub fn set(&mut self, a: FactionId, b: FactionId, relation: Relation) {
        let relation = Relation {
            level: relation.level.clamp(LEVEL_MIN, LEVEL_MAX),
            kind: relation.kind,
        };
        self.relations.insert(FactionPair::new(a, b), relation);
    }

    pub fn set_level(&mut self, a: FactionId, b: FactionId, level: i64) {
        let kind = self.kind(a, b);
        self.set(a, b, Relation { level, kind });
    }

    /// Shift the level by `delta`, clamped to `[0, 100]`. Returns the new level.
    pub fn adjust_level(&mut self, a: FactionId, b: FactionId, delta: i64) -> i64 {
        let level = (self.level(a, b) + delta).clamp(LEVEL_MIN, LEVEL_MAX);
        self.set_level(a, b, level);
        level
    }

    pub fn set_kind(&mut self, a: FactionId, b: FactionId, kind: RelationKind) {
        let level = self.level(a, b);
        self.set(a, b, Relation { level, kind });
    }

    pub fn iter(&self) -> impl Iterator<Item = (FactionPair, Relation)> + '_ {
        self.relations.iter().map(|(p, r)| (*p, *r))
    }

    /// Factions currently at war with `faction`.
    pub fn enemies_of(&self, faction: FactionId) -> Vec<FactionId> {
        self.relations
            .iter()
            .filter(|(pair, rel)| pair.contains(faction) && rel.kind == RelationKind::War)
            .map(|(pair, _)| if pair.0 == faction { pair.1 } else { pair.0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_order_independent() {
        assert_eq!(FactionPair::new(3, 1), FactionPair::new(1, 3));
    }

    #[test]
    fn updates_apply_to_both_orderings() {
        let mut diplomacy = DiplomacyState::new();
        diplomacy.set_level(2, 1, 80);
        diplomacy.set_kind(1, 2, RelationKind::Alliance);
        assert_eq!(diplomacy.get(1, 2), diplomacy.get(2, 1));
        assert_eq!(diplomacy.level(1, 2), 80);
        assert!(diplomacy.allied(2, 1));
    }

    #[test]
    fn adjust_level_is_clamped() {
        let mut diplomacy = DiplomacyState::new();
        assert_eq!(diplomacy.adjust_level(1, 2, 90), 100);
        assert_eq!(diplomacy.adjust_level(1, 2, -250), 0);
    }

    #[test]
    fn unknown_pair_defaults_to_neutral_peace() {
        let diplomacy = DiplomacyState::new();
        assert_eq!(diplomacy.get(4, 5), Relation::default());
        assert_eq!(diplomacy.level(4, 5), DEFAULT_LEVEL);
    }

    #[test]
    fn enemies_of_lists_war_partners() {
        let mut diplomacy = DiplomacyState::new();
        diplomacy.set_kind(1, 2, RelationKind::War);
        diplomacy.set_kind(3, 1, RelationKind::War);
        diplomacy.set_kind(1, 4, RelationKind::Alliance);
        assert_eq!(diplomacy.enemies_of(1), vec![2, 3]);
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RelationKind::Alliance).unwrap(),
            "\"alliance\""
        );
        assert!(serde_json::from_str::<RelationKind>("\"truce\"").is_err());
    }
}
