use serde::{Deserialize, Serialize};

pub const CURRENCY_CAP: i64 = 10_000_000_000;
pub const CRYSTAL_CAP: i64 = 10_000_000_000;
pub const LABOR_CAP: i64 = 10_000_000;
pub const POPULATION_CAP: i64 = 100_000_000;

/// The four stockpiled resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Currency,
    Crystal,
    Labor,
    Population,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Currency,
        ResourceKind::Crystal,
        ResourceKind::Labor,
        ResourceKind::Population,
    ];

    pub fn cap(self) -> i64 {
        match self {
            ResourceKind::Currency => CURRENCY_CAP,
            ResourceKind::Crystal => CRYSTAL_CAP,
            ResourceKind::Labor => LABOR_CAP,
            ResourceKind::Population => POPULATION_CAP,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Currency => "currency",
            ResourceKind::Crystal => "crystal",
            ResourceKind::Labor => "labor",
            ResourceKind::Population => "population",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        ResourceKind::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Exchange value of one unit in currency terms.
    pub fn unit_value(self, crystal_price: f64) -> f64 {
        match self {
            ResourceKind::Currency => 1.0,
            ResourceKind::Crystal => crystal_price,
            ResourceKind::Labor => 2.0,
            ResourceKind::Population => 4.0,
        }
    }
}

/// Per-faction resource ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceStock {
    pub currency: i64,
    pub crystal: i64,
    pub labor: i64,
    pub population: i64,
    pub total_consumption: i64,
    pub army_limit: i64,
}

impl ResourceStock {
    pub fn new(currency: i64, crystal: i64, labor: i64, population: i64) -> Self {
        let mut stock = Self {
            currency,
            crystal,
            labor,
            population,
            total_consumption: 0,
            army_limit: 0,
        };
        stock.clamp();
        stock
    }

    pub fn get(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Currency => self.currency,
            ResourceKind::Crystal => self.crystal,
            ResourceKind::Labor => self.labor,
            ResourceKind::Population => self.population,
        }
    }

    pub fn get_mut(&mut self, kind: ResourceKind) -> &mut i64 {
        match kind {
            ResourceKind::Currency => &mut self.currency,
            ResourceKind::Crystal => &mut self.crystal,
            ResourceKind::Labor => &mut self.labor,
            ResourceKind::Population => &mut self.population,
        }
    }

    /// Add `amount` (may be negative) and clamp the touched resource.
    pub fn add(&mut self, kind: ResourceKind, amount: i64) {
        let slot = self.get_mut(kind);
        *slot = slot.saturating_add(amount).clamp(0, kind.cap());
    }

    /// Debit `amount` if fully covered. Returns false (and changes nothing) otherwise.
    pub fn try_spend(&mut self, kind: ResourceKind, amount: i64) -> bool {
        if amount < 0 || self.get(kind) < amount {
            return false;
        }
        *self.get_mut(kind) -= amount;
        true
    }

    /// Credit `amount` if it fits under the cap. Returns false (and changes nothing) otherwise.
    pub fn try_receive(&mut self, kind: ResourceKind, amount: i64) -> bool {
        if amount < 0 || kind.cap() - self.get(kind) < amount {
            return false;
        }
        *self.get_mut(kind) += amount;
        true
    }

    /// Clamp every resource and derived field to `[0, cap]`.
    pub fn clamp(&mut self) {
        for kind in ResourceKind::ALL {
            let slot = self.get_mut(kind);
            *slot = (*slot).clamp(0, kind.cap());
        }
        self.total_consumption = self.total_consumption.clamp(0, POPULATION_CAP);
        self.army_limit = self.army_limit.clamp(0, POPULATION_CAP);
    }

    /// Consumption headroom left under the army limit.
    pub fn consumption_headroom(&self) -> i64 {
        (self.army_limit - self.total_consumption).max(0)
    }
}
