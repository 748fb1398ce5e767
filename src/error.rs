use crate::model::{CityId, FactionId};

/// Failures surfaced to callers of the engine.
///
/// Running out of a resource is not an error: trades are rejected and
/// recruitment is skipped instead.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("faction {0} not found")]
    UnknownFaction(FactionId),
    #[error("city {0} not found")]
    UnknownCity(CityId),
    #[error("unit template {name} not found for faction {faction}")]
    UnknownUnit { faction: FactionId, name: String },
    #[error("stored row is corrupt: {0}")]
    CorruptRow(String),
    #[error("persistence failed: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
