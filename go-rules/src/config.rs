use serde::{Deserialize, Serialize};

use crate::error::GoError;
use crate::grid::Grid;
use crate::handicap;
use crate::rules::Rules;

fn default_size() -> u8 {
    19
}

fn default_komi() -> f32 {
    6.5
}

/// Parameters of a new game. Every field has a default, so `{}` is a valid
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_size")]
    pub cols: u8,
    #[serde(default = "default_size")]
    pub rows: u8,
    #[serde(default = "default_komi")]
    pub komi: f32,
    #[serde(default)]
    pub handicap: u8,
    #[serde(default)]
    pub rules: Rules,
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, GoError> {
        let config: GameConfig =
            serde_json::from_str(json).map_err(|e| GoError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GoError> {
        let grid = self.grid()?;
        handicap::handicap_points(&grid, self.handicap)?;
        if !self.komi.is_finite() {
            return Err(GoError::Config(format!("komi {} is not a number", self.komi)));
        }
        Ok(())
    }

    pub fn grid(&self) -> Result<Grid, GoError> {
        Grid::new(self.cols, self.rows)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            cols: default_size(),
            rows: default_size(),
            komi: default_komi(),
            handicap: 0,
            rules: Rules::default(),
        }
    }
}
