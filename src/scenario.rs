use crate::model::*;

// -- Builder-style ref types --

/// Typed reference to a faction in a [`Scenario`], enabling chained field mutation.
///
/// Created by [`Scenario::faction`]. Call [`.id()`](FactionRef::id) to end the chain.
pub struct FactionRef<'a> {
    scenario: &'a mut Scenario,
    id: FactionId,
}

impl FactionRef<'_> {
    fn stock(&mut self, f: impl FnOnce(&mut ResourceStock)) -> &mut Self {
        if let Some(stock) = self.scenario.world.stock_mut(self.id) {
            f(stock);
            stock.clamp();
        }
        self
    }

    fn data(&mut self, f: impl FnOnce(&mut Faction)) -> &mut Self {
        if let Some(faction) = self.scenario.world.factions.get_mut(&self.id) {
            f(faction);
        }
        self
    }

    pub fn currency(mut self, v: i64) -> Self { self.stock(|s| s.currency = v); self }
    pub fn crystal(mut self, v: i64) -> Self { self.stock(|s| s.crystal = v); self }
    pub fn labor(mut self, v: i64) -> Self { self.stock(|s| s.labor = v); self }
    pub fn population(mut self, v: i64) -> Self {
        self.stock(|s| {
            s.population = v;
            s.army_limit = v / 10;
        });
        self
    }
    pub fn money_loss(mut self, v: f64) -> Self { self.data(|f| f.money_loss_coefficient = v); self }
    pub fn food_loss(mut self, v: f64) -> Self { self.data(|f| f.food_loss_coefficient = v); self }
    pub fn season(mut self, season: usize, modifier: SeasonModifier) -> Self {
        self.data(|f| {
            if let Some(slot) = f.seasonal.get_mut(season) {
                *slot = modifier;
            }
        });
        self
    }

    /// Register the four-tier unit roster every demo faction starts with.
    pub fn standard_roster(self) -> Self {
        let id = self.id;
        let prefix = self
            .scenario
            .world
            .factions
            .get(&id)
            .map(|f| f.name.clone())
            .unwrap_or_default();
        let roster = [
            ("Militia", 30, 20, 40, UnitClass::Base, 100, 1, 1),
            ("Warden", 900, 700, 1200, UnitClass::Hero, 12_000, 20, 5),
            ("Champion", 2500, 1200, 2000, UnitClass::Champion, 30_000, 40, 10),
            ("Colossus", 9000, 5000, 8000, UnitClass::Legendary, 150_000, 100, 40),
        ];
        for (name, attack, defense, durability, class, currency, time, consumption) in roster {
            self.scenario.world.catalog.insert(UnitTemplate {
                faction: id,
                name: format!("{prefix} {name}"),
                attack,
                defense,
                durability,
                class,
                cost: UnitCost { currency, time },
                consumption,
                image: format!("{}.png", name.to_lowercase()),
            });
        }
        self
    }

    /// Terminate the chain and return the faction id.
    pub fn id(self) -> FactionId { self.id }
}

/// Typed reference to a city in a [`Scenario`].
pub struct CityRef<'a> {
    scenario: &'a mut Scenario,
    id: CityId,
}

impl CityRef<'_> {
    pub fn owner(self, v: FactionId) -> Self {
        if let Some(city) = self.scenario.world.cities.get_mut(&self.id) {
            city.owner = Some(v);
        }
        self
    }

    pub fn crystal_coefficient(self, v: f64) -> Self {
        if let Some(city) = self.scenario.world.cities.get_mut(&self.id) {
            city.crystal_coefficient = v;
        }
        self
    }

    pub fn buildings(self, hospitals: i64, factories: i64) -> Self {
        self.scenario
            .world
            .buildings
            .insert(self.id, Buildings { hospitals, factories });
        self
    }

    /// Station `count` units of `unit_name` here.
    pub fn garrison(self, unit_name: &str, count: i64) -> Self {
        self.scenario.world.garrisons.upsert(self.id, unit_name, count, "");
        self
    }

    pub fn id(self) -> CityId { self.id }
}

/// Incremental world builder used by the self-play binary and the tests.
///
/// ```
/// use conquest_core::model::{Controller, Ideology};
/// use conquest_core::scenario::Scenario;
///
/// let mut s = Scenario::new();
/// let north = s.faction(1, "North", Ideology::Order, Controller::Ai).currency(5000).id();
/// s.city(10, "Holdfast", 0, 0).owner(north).buildings(10, 10);
/// let world = s.build();
/// assert_eq!(world.city_count(north), 1);
/// ```
pub struct Scenario {
    world: World,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    pub fn new() -> Self {
        Self { world: World::new() }
    }

    pub fn at_turn(mut self, turn: u32) -> Self {
        self.world.turn = turn;
        self
    }

    pub fn faction(
        &mut self,
        id: FactionId,
        name: &str,
        ideology: Ideology,
        controller: Controller,
    ) -> FactionRef<'_> {
        self.world
            .add_faction(Faction::new(id, name, ideology, controller), ResourceStock::default());
        FactionRef { scenario: self, id }
    }

    /// Add a neutral city with no buildings.
    pub fn city(&mut self, id: CityId, name: &str, x: i64, y: i64) -> CityRef<'_> {
        let city = City {
            id,
            name: name.to_string(),
            x,
            y,
            owner: None,
            crystal_coefficient: 1.0,
        };
        self.world.add_city(city, Buildings::default());
        CityRef { scenario: self, id }
    }

    pub fn unit(
        &mut self,
        faction: FactionId,
        name: &str,
        stats: (i64, i64, i64),
        class: UnitClass,
    ) -> &mut Self {
        let (attack, defense, durability) = stats;
        self.world.catalog.insert(UnitTemplate {
            faction,
            name: name.to_string(),
            attack,
            defense,
            durability,
            class,
            cost: UnitCost { currency: 100, time: 1 },
            consumption: 1,
            image: String::new(),
        });
        self
    }

    pub fn relation(&mut self, a: FactionId, b: FactionId, level: i64, kind: RelationKind) -> &mut Self {
        self.world.diplomacy.set(a, b, Relation { level, kind });
        self
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn build(self) -> World {
        self.world
    }

    /// Five factions on a 3x3 grid of cities, one human and four AI, each
    /// with a starting garrison. Unowned grid cells start neutral.
    pub fn demo() -> World {
        let mut s = Scenario::new();
        let factions = [
            (1, "Aurel", Ideology::Order, Controller::Human),
            (2, "Brann", Ideology::Struggle, Controller::Ai),
            (3, "Cyrene", Ideology::Submission, Controller::Ai),
            (4, "Dorn", Ideology::Freedom, Controller::Ai),
            (5, "Essa", Ideology::Struggle, Controller::Ai),
        ];
        for (id, name, ideology, controller) in factions {
            s.faction(id, name, ideology, controller)
                .currency(40_000)
                .crystal(8_000)
                .labor(2_000)
                .population(20_000)
                .standard_roster();
        }

        let homes = [(1, 0, 0), (2, 200, 0), (3, 0, 200), (4, 200, 200), (5, 100, 100)];
        for (faction, x, y) in homes {
            let militia = format!("{} Militia", factions[(faction - 1) as usize].1);
            s.city(faction * 10, &format!("Capital {faction}"), x, y)
                .owner(faction)
                .buildings(40, 40)
                .garrison(&militia, 60);
        }
        let neutral = [(100, 0), (0, 100), (200, 100), (100, 200)];
        for (i, (x, y)) in neutral.into_iter().enumerate() {
            s.city(100 + i as CityId, &format!("Outpost {}", i + 1), x, y)
                .crystal_coefficient(1.5);
        }
        s.relation(2, 5, 8, RelationKind::Peace);
        s.relation(3, 4, 85, RelationKind::Peace);
        s.build()
    }
}
