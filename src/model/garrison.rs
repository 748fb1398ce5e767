use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::city::CityId;

/// One unit stack stationed in a city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarrisonEntry {
    pub city_id: CityId,
    pub unit_name: String,
    pub count: i64,
    #[serde(default)]
    pub image: String,
}

impl GarrisonEntry {
    pub fn new(city_id: CityId, unit_name: &str, count: i64) -> Self {
        Self {
            city_id,
            unit_name: unit_name.to_string(),
            count,
            image: String::new(),
        }
    }
}

/// Unit stacks per city. Entries never hold a zero or negative count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GarrisonStore {
    cities: BTreeMap<CityId, Vec<GarrisonEntry>>,
}

impl GarrisonStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn city(&self, city_id: CityId) -> &[GarrisonEntry] {
        self.cities.get(&city_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &GarrisonEntry> {
        self.cities.values().flatten()
    }

    pub fn count_of(&self, city_id: CityId, unit_name: &str) -> i64 {
        self.city(city_id)
            .iter()
            .filter(|e| e.unit_name == unit_name)
            .map(|e| e.count)
            .sum()
    }

    /// Add `count` units to the named stack, creating it if needed.
    pub fn upsert(&mut self, city_id: CityId, unit_name: &str, count: i64, image: &str) {
        if count <= 0 {
            return;
        }
        let entries = self.cities.entry(city_id).or_default();
        match entries.iter_mut().find(|e| e.unit_name == unit_name) {
            Some(entry) => entry.count += count,
            None => entries.push(GarrisonEntry {
                city_id,
                unit_name: unit_name.to_string(),
                count,
                image: image.to_string(),
            }),
        }
    }

    /// Remove up to `count` units from the named stack; stacks reaching zero are deleted.
    pub fn decrement(&mut self, city_id: CityId, unit_name: &str, count: i64) {
        let Some(entries) = self.cities.get_mut(&city_id) else {
            return;
        };
        let mut remaining = count;
        for entry in entries.iter_mut().filter(|e| e.unit_name == unit_name) {
            let taken = remaining.min(entry.count);
            entry.count -= taken;
            remaining -= taken;
            if remaining <= 0 {
                break;
            }
        }
        entries.retain(|e| e.count > 0);
        if entries.is_empty() {
            self.cities.remove(&city_id);
        }
    }

    /// Remove and return the whole garrison of a city.
    pub fn clear_city(&mut self, city_id: CityId) -> Vec<GarrisonEntry> {
        self.cities.remove(&city_id).unwrap_or_default()
    }

    pub fn is_empty(&self, city_id: CityId) -> bool {
        self.city(city_id).is_empty()
    }
}
