use serde::{Deserialize, Serialize};

pub type FactionId = u64;

/// Political system of a faction. Matching ideologies drift closer over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ideology {
    Submission,
    Struggle,
    Order,
    Freedom,
}

impl Ideology {
    pub fn label(self) -> &'static str {
        match self {
            Ideology::Submission => "Смирение",
            Ideology::Struggle => "Борьба",
            Ideology::Order => "Порядок",
            Ideology::Freedom => "Свобода",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    Human,
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

pub const TURNS_PER_SEASON: u32 = 3;

impl Season {
    pub fn from_turn(turn: u32) -> Self {
        match (turn / TURNS_PER_SEASON) % 4 {
            0 => Season::Spring,
            1 => Season::Summer,
            2 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    fn index(self) -> usize {
        match self {
            Season::Spring => 0,
            Season::Summer => 1,
            Season::Autumn => 2,
            Season::Winter => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonModifier {
    pub stat_multiplier: f64,
    pub cost_multiplier: f64,
}

impl Default for SeasonModifier {
    fn default() -> Self {
        Self {
            stat_multiplier: 1.0,
            cost_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    pub ideology: Ideology,
    pub controller: Controller,
    /// Currency upkeep per hospital.
    pub money_loss_coefficient: f64,
    /// Crystal eaten per head of population.
    pub food_loss_coefficient: f64,
    /// Indexed by season: spring, summer, autumn, winter.
    #[serde(default)]
    pub seasonal: [SeasonModifier; 4],
}

impl Faction {
    pub fn new(id: FactionId, name: &str, ideology: Ideology, controller: Controller) -> Self {
        Self {
            id,
            name: name.to_string(),
            ideology,
            controller,
            money_loss_coefficient: 20.0,
            food_loss_coefficient: 0.1,
            seasonal: [SeasonModifier::default(); 4],
        }
    }

    pub fn season_modifier(&self, season: Season) -> SeasonModifier {
        self.seasonal[season.index()]
    }

    pub fn is_ai(&self) -> bool {
        self.controller == Controller::Ai
    }
}
