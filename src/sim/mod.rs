pub mod ai;
pub mod buildings;
pub mod combat;
mod context;
pub mod diplomacy;
pub mod economy;
pub mod negotiation;
pub mod recruitment;
mod runner;
mod signal;
pub mod trade;
pub mod war;

pub use ai::{AiController, TurnSummary};
pub use combat::{BattleReport, BattleResult, Engagement};
pub use context::TurnContext;
pub use negotiation::{Entities, Intent, IntentClassifier, NegotiationStateMachine, Stage};
pub use runner::{play_round, run, run_persisted, turn_order};
pub use signal::{Signal, SignalKind};
