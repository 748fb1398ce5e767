use std::collections::BTreeMap;

use super::city::{Buildings, City, CityId};
use super::faction::{Faction, FactionId, Season};
use super::garrison::{GarrisonEntry, GarrisonStore};
use super::relationship::DiplomacyState;
use super::resource::{ResourceKind, ResourceStock};
use super::trade::{DiplomaticQuery, RejectReason, TradeAgreement, TradeLeg, TradeStatus};
use super::unit::{UnitCatalog, UnitClass};

pub const DEFAULT_CRYSTAL_PRICE: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Market {
    /// Currency paid per unit of crystal.
    pub crystal_price: f64,
}

impl Default for Market {
    fn default() -> Self {
        Self {
            crystal_price: DEFAULT_CRYSTAL_PRICE,
        }
    }
}

/// The complete mutable game state shared by the combat engine, the AI
/// controllers and the negotiation machine.
#[derive(Debug, Clone, Default)]
pub struct World {
    pub turn: u32,
    pub factions: BTreeMap<FactionId, Faction>,
    pub catalog: UnitCatalog,
    pub cities: BTreeMap<CityId, City>,
    pub garrisons: GarrisonStore,
    pub buildings: BTreeMap<CityId, Buildings>,
    pub resources: BTreeMap<FactionId, ResourceStock>,
    pub diplomacy: DiplomacyState,
    pub trade_agreements: Vec<TradeAgreement>,
    pub queries: Vec<DiplomaticQuery>,
    pub market: Market,
    pub next_agreement_id: u64,
}

impl World {
    pub fn new() -> Self {
        Self {
            next_agreement_id: 1,
            ..Self::default()
        }
    }

    pub fn add_faction(&mut self, faction: Faction, stock: ResourceStock) {
        self.resources.insert(faction.id, stock);
        self.factions.insert(faction.id, faction);
    }

    pub fn add_city(&mut self, city: City, buildings: Buildings) {
        self.buildings.insert(city.id, buildings);
        self.cities.insert(city.id, city);
    }

    pub fn season(&self) -> Season {
        Season::from_turn(self.turn)
    }

    pub fn human_faction(&self) -> Option<FactionId> {
        self.factions.values().find(|f| !f.is_ai()).map(|f| f.id)
    }

    pub fn city_owner(&self, city_id: CityId) -> Option<FactionId> {
        self.cities.get(&city_id).and_then(|c| c.owner)
    }

    pub fn cities_of(&self, faction: FactionId) -> impl Iterator<Item = &City> {
        self.cities
            .values()
            .filter(move |c| c.owner == Some(faction))
    }

    pub fn city_count(&self, faction: FactionId) -> usize {
        self.cities_of(faction).count()
    }

    pub fn buildings_of(&self, city_id: CityId) -> Buildings {
        self.buildings.get(&city_id).copied().unwrap_or_default()
    }

    /// Hospitals and factories summed over every city the faction owns.
    pub fn faction_buildings(&self, faction: FactionId) -> Buildings {
        self.cities_of(faction)
            .map(|c| self.buildings_of(c.id))
            .fold(Buildings::default(), |acc, b| Buildings {
                hospitals: acc.hospitals + b.hospitals,
                factories: acc.factories + b.factories,
            })
    }

    /// Every garrison entry stationed in a city the faction owns.
    pub fn garrison_of(&self, faction: FactionId) -> Vec<&GarrisonEntry> {
        self.cities_of(faction)
            .flat_map(|c| self.garrisons.city(c.id))
            .collect()
    }

    /// Summed consumption of the faction's stationed units.
    pub fn total_consumption(&self, faction: FactionId) -> i64 {
        self.garrison_of(faction)
            .into_iter()
            .filter_map(|e| {
                self.catalog
                    .get(faction, &e.unit_name)
                    .map(|t| t.consumption * e.count)
            })
            .sum()
    }

    /// Total army strength: per unit `attack × class coefficient + defense + durability`.
    pub fn army_strength(&self, faction: FactionId) -> f64 {
        self.garrison_of(faction)
            .into_iter()
            .filter_map(|e| {
                self.catalog
                    .get(faction, &e.unit_name)
                    .map(|t| t.power() * e.count as f64)
            })
            .sum()
    }

    /// Whether any garrison of the faction holds a unit of `class`.
    pub fn fields_class(&self, faction: FactionId, class: UnitClass) -> bool {
        self.garrison_of(faction).into_iter().any(|e| {
            self.catalog
                .get(faction, &e.unit_name)
                .is_some_and(|t| t.class == class)
        })
    }

    pub fn stock(&self, faction: FactionId) -> Option<&ResourceStock> {
        self.resources.get(&faction)
    }

    pub fn stock_mut(&mut self, faction: FactionId) -> Option<&mut ResourceStock> {
        self.resources.get_mut(&faction)
    }

    /// Move `amount` of `kind` from one faction to another. Nothing moves
    /// unless the sender can cover it and the receiver has room under the cap.
    pub fn transfer(
        &mut self,
        from: FactionId,
        to: FactionId,
        kind: ResourceKind,
        amount: i64,
    ) -> bool {
        let leg = TradeLeg::new(kind, amount);
        let nothing = TradeLeg::new(kind, 0);
        self.exchange(from, leg, to, nothing).is_ok()
    }

    /// Swap `a_gives` from `a` against `b_gives` from `b` as one step.
    ///
    /// Both legs are checked on copies of the two stocks first, so either
    /// both land in full or neither does. Every unit debited is credited.
    pub fn exchange(
        &mut self,
        a: FactionId,
        a_gives: TradeLeg,
        b: FactionId,
        b_gives: TradeLeg,
    ) -> Result<(), RejectReason> {
        if a == b {
            return Err(RejectReason::UnknownFaction);
        }
        let (Some(mut stock_a), Some(mut stock_b)) =
            (self.resources.get(&a).cloned(), self.resources.get(&b).cloned())
        else {
            return Err(RejectReason::UnknownFaction);
        };
        if !stock_a.try_spend(a_gives.kind, a_gives.amount)
            || !stock_b.try_spend(b_gives.kind, b_gives.amount)
        {
            return Err(RejectReason::InsufficientStock);
        }
        if !stock_b.try_receive(a_gives.kind, a_gives.amount)
            || !stock_a.try_receive(b_gives.kind, b_gives.amount)
        {
            return Err(RejectReason::ReceiverFull);
        }
        self.resources.insert(a, stock_a);
        self.resources.insert(b, stock_b);
        Ok(())
    }

    /// Queue a trade offer. Returns the agreement id.
    pub fn propose_trade(
        &mut self,
        proposer: FactionId,
        target: FactionId,
        offered: TradeLeg,
        requested: TradeLeg,
    ) -> u64 {
        let id = self.next_agreement_id.max(1);
        self.next_agreement_id = id + 1;
        self.trade_agreements.push(TradeAgreement {
            id,
            proposer,
            target,
            offered,
            requested,
            status: TradeStatus::Pending,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::faction::{Controller, Ideology};
    use crate::model::resource::CURRENCY_CAP;

    fn two_faction_world() -> World {
        let mut world = World::new();
        world.add_faction(
            Faction::new(1, "North", Ideology::Order, Controller::Ai),
            ResourceStock::new(1000, 0, 0, 100),
        );
        world.add_faction(
            Faction::new(2, "South", Ideology::Freedom, Controller::Human),
            ResourceStock::new(0, 0, 0, 100),
        );
        world
    }

    #[test]
    fn transfer_moves_resources() {
        let mut world = two_faction_world();
        assert!(world.transfer(1, 2, ResourceKind::Currency, 400));
        assert_eq!(world.resources[&1].currency, 600);
        assert_eq!(world.resources[&2].currency, 400);
    }

    #[test]
    fn transfer_refuses_overdraft() {
        let mut world = two_faction_world();
        assert!(!world.transfer(2, 1, ResourceKind::Currency, 1));
        assert!(!world.transfer(1, 9, ResourceKind::Currency, 1));
        assert_eq!(world.resources[&1].currency, 1000);
    }

    #[test]
    fn transfer_refuses_receiver_at_cap() {
        let mut world = two_faction_world();
        if let Some(stock) = world.resources.get_mut(&2) {
            stock.currency = CURRENCY_CAP - 100;
        }
        assert!(!world.transfer(1, 2, ResourceKind::Currency, 400));
        assert_eq!(world.resources[&1].currency, 1000);
        assert_eq!(world.resources[&2].currency, CURRENCY_CAP - 100);

        assert!(world.transfer(1, 2, ResourceKind::Currency, 100));
        assert_eq!(world.resources[&2].currency, CURRENCY_CAP);
    }

    #[test]
    fn exchange_is_all_or_nothing() {
        let mut world = two_faction_world();
        if let Some(stock) = world.resources.get_mut(&2) {
            stock.crystal = 500;
            stock.currency = CURRENCY_CAP;
        }

        let full = world.exchange(
            1,
            TradeLeg::new(ResourceKind::Currency, 300),
            2,
            TradeLeg::new(ResourceKind::Crystal, 50),
        );
        assert_eq!(full, Err(RejectReason::ReceiverFull));
        assert_eq!(world.resources[&1].currency, 1000);
        assert_eq!(world.resources[&1].crystal, 0);
        assert_eq!(world.resources[&2].crystal, 500);

        let short = world.exchange(
            2,
            TradeLeg::new(ResourceKind::Crystal, 50),
            1,
            TradeLeg::new(ResourceKind::Currency, 2000),
        );
        assert_eq!(short, Err(RejectReason::InsufficientStock));
        assert_eq!(world.resources[&2].crystal, 500);
    }

    #[test]
    fn exchange_moves_both_legs() {
        let mut world = two_faction_world();
        if let Some(stock) = world.resources.get_mut(&2) {
            stock.crystal = 500;
        }
        let result = world.exchange(
            1,
            TradeLeg::new(ResourceKind::Currency, 300),
            2,
            TradeLeg::new(ResourceKind::Crystal, 50),
        );
        assert_eq!(result, Ok(()));
        assert_eq!(world.resources[&1].currency, 700);
        assert_eq!(world.resources[&1].crystal, 50);
        assert_eq!(world.resources[&2].currency, 300);
        assert_eq!(world.resources[&2].crystal, 450);
    }

    #[test]
    fn agreement_ids_are_sequential() {
        let mut world = two_faction_world();
        let leg = TradeLeg::new(ResourceKind::Currency, 1);
        assert_eq!(world.propose_trade(1, 2, leg, leg), 1);
        assert_eq!(world.propose_trade(2, 1, leg, leg), 2);
    }

    #[test]
    fn human_faction_is_found() {
        assert_eq!(two_faction_world().human_faction(), Some(2));
    }
}
