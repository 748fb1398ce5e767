use serde::{Deserialize, Serialize};

use super::faction::FactionId;

pub type CityId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub x: i64,
    pub y: i64,
    /// `None` while the city is neutral.
    pub owner: Option<FactionId>,
    pub crystal_coefficient: f64,
}

impl City {
    pub fn manhattan_distance(&self, other: &City) -> i64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn is_neutral(&self) -> bool {
        self.owner.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Hospital,
    Factory,
}

impl BuildingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildingKind::Hospital => "hospital",
            BuildingKind::Factory => "factory",
        }
    }
}

/// Building counts in one city. Ownership follows the city's owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buildings {
    pub hospitals: i64,
    pub factories: i64,
}

impl Buildings {
    pub fn total(&self) -> i64 {
        self.hospitals + self.factories
    }

    pub fn get(&self, kind: BuildingKind) -> i64 {
        match kind {
            BuildingKind::Hospital => self.hospitals,
            BuildingKind::Factory => self.factories,
        }
    }

    pub fn get_mut(&mut self, kind: BuildingKind) -> &mut i64 {
        match kind {
            BuildingKind::Hospital => &mut self.hospitals,
            BuildingKind::Factory => &mut self.factories,
        }
    }
}
