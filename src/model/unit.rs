use std::collections::BTreeMap;

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::faction::{FactionId, SeasonModifier};

/// Unit tier. Determines survival rules in combat and strength weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitClass {
    Base,
    Hero,
    Champion,
    Legendary,
}

impl UnitClass {
    pub fn from_tier(tier: u8) -> Option<Self> {
        match tier {
            1 => Some(UnitClass::Base),
            2 => Some(UnitClass::Hero),
            3 => Some(UnitClass::Champion),
            4 => Some(UnitClass::Legendary),
            _ => None,
        }
    }

    pub fn tier(self) -> u8 {
        match self {
            UnitClass::Base => 1,
            UnitClass::Hero => 2,
            UnitClass::Champion => 3,
            UnitClass::Legendary => 4,
        }
    }

    /// Heroes and legendaries fight as a single entity: they survive whole or die.
    pub fn is_singular(self) -> bool {
        self != UnitClass::Base
    }

    /// Weight applied to attack when estimating army strength.
    pub fn strength_coefficient(self) -> f64 {
        match self {
            UnitClass::Base => 1.3,
            UnitClass::Hero => 1.7,
            UnitClass::Champion => 2.0,
            UnitClass::Legendary => 3.0,
        }
    }
}

impl Serialize for UnitClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.tier())
    }
}

impl<'de> Deserialize<'de> for UnitClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tier = u8::deserialize(deserializer)?;
        UnitClass::from_tier(tier)
            .ok_or_else(|| de::Error::custom(format!("unit class must be 1-4, got {tier}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitCost {
    pub currency: i64,
    /// Paid in labor.
    pub time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTemplate {
    pub faction: FactionId,
    pub name: String,
    pub attack: i64,
    pub defense: i64,
    pub durability: i64,
    pub class: UnitClass,
    pub cost: UnitCost,
    pub consumption: i64,
    #[serde(default)]
    pub image: String,
}

impl UnitTemplate {
    /// Strength contribution of a single unit of this template.
    pub fn power(&self) -> f64 {
        self.attack as f64 * self.class.strength_coefficient() + (self.defense + self.durability) as f64
    }
}

/// Static unit templates per faction, plus the baseline they were seeded with.
#[derive(Debug, Clone, Default)]
pub struct UnitCatalog {
    current: BTreeMap<(FactionId, String), UnitTemplate>,
    baseline: BTreeMap<(FactionId, String), UnitTemplate>,
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template. The first insert for a key also fixes its baseline.
    pub fn insert(&mut self, template: UnitTemplate) {
        let key = (template.faction, template.name.clone());
        self.baseline
            .entry(key.clone())
            .or_insert_with(|| template.clone());
        self.current.insert(key, template);
    }

    /// Register a template whose baseline differs from its current stats.
    pub fn restore(&mut self, template: UnitTemplate, baseline: UnitTemplate) {
        let key = (template.faction, template.name.clone());
        self.baseline.insert(key.clone(), baseline);
        self.current.insert(key, template);
    }

    /// Look up a template, falling back to any faction's template of that name
    /// (captured cities can hold foreign units).
    pub fn get(&self, faction: FactionId, name: &str) -> Option<&UnitTemplate> {
        self.current
            .get(&(faction, name.to_string()))
            .or_else(|| self.current.values().find(|t| t.name == name))
    }

    pub fn get_mut(&mut self, faction: FactionId, name: &str) -> Option<&mut UnitTemplate> {
        self.current.get_mut(&(faction, name.to_string()))
    }

    pub fn for_faction(&self, faction: FactionId) -> impl Iterator<Item = &UnitTemplate> {
        self.current
            .range((faction, String::new())..)
            .take_while(move |((f, _), _)| *f == faction)
            .map(|(_, t)| t)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitTemplate> {
        self.current.values()
    }

    pub fn baseline(&self, faction: FactionId, name: &str) -> Option<&UnitTemplate> {
        self.baseline.get(&(faction, name.to_string()))
    }

    /// Roll every class-3 template of `faction` back to its baseline, then
    /// reapply the seasonal stat and cost multipliers.
    pub fn reset_champions(&mut self, faction: FactionId, modifier: SeasonModifier) {
        for (key, template) in self.current.iter_mut() {
            if key.0 != faction || template.class != UnitClass::Champion {
                continue;
            }
            let Some(base) = self.baseline.get(key) else {
                continue;
            };
            *template = base.clone();
            template.attack = (base.attack as f64 * modifier.stat_multiplier).round() as i64;
            template.defense = (base.defense as f64 * modifier.stat_multiplier).round() as i64;
            template.cost.currency =
                (base.cost.currency as f64 * modifier.cost_multiplier).round() as i64;
        }
    }
}
