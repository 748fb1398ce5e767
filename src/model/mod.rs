pub mod city;
pub mod faction;
pub mod garrison;
pub mod relationship;
pub mod resource;
pub mod trade;
pub mod unit;
pub mod world;

pub use city::{BuildingKind, Buildings, City, CityId};
pub use faction::{Controller, Faction, FactionId, Ideology, Season, SeasonModifier};
pub use garrison::{GarrisonEntry, GarrisonStore};
pub use relationship::{DiplomacyState, FactionPair, Relation, RelationKind};
pub use resource::{ResourceKind, ResourceStock};
pub use trade::{DiplomaticQuery, QueryKind, RejectReason, TradeAgreement, TradeLeg, TradeStatus};
pub use unit::{UnitCatalog, UnitClass, UnitCost, UnitTemplate};
pub use world::{Market, World};
