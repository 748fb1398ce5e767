use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration for a game run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// RNG seed; the same seed replays the same game.
    pub seed: u64,
    /// Number of rounds to play. Every AI faction takes one turn per round.
    pub num_turns: u32,
    /// If set, flush world state every N rounds.
    pub flush_interval: Option<u32>,
    /// Directory to write flush checkpoints into.
    pub output_dir: Option<PathBuf>,
    /// Postgres connection string used by the persisted runner.
    pub database_url: Option<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_turns: 20,
            flush_interval: None,
            output_dir: None,
            database_url: None,
        }
    }
}

impl GameConfig {
    pub fn new(num_turns: u32, seed: u64) -> Self {
        Self {
            seed,
            num_turns,
            ..Self::default()
        }
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
