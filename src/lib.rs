pub mod config;
pub mod db;
pub mod error;
pub mod flush;
pub mod model;
pub mod scenario;
pub mod sim;

pub use config::GameConfig;
pub use error::{CoreError, Result};
pub use model::{
    City, CityId, Faction, FactionId, GarrisonEntry, GarrisonStore, RelationKind, ResourceKind,
    ResourceStock, UnitCatalog, UnitClass, UnitTemplate, World,
};
pub use sim::{AiController, NegotiationStateMachine, TurnSummary};
