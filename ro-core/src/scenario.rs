//! Scenario files: racer positions, spectator tiles and the remaining set.
//!
//! ```yaml
//! racers:
//!   - { racer: red, cell: 3, stack: 0 }
//!   - { racer: blue, cell: 4, stack: 0 }
//! remaining: [red, blue]      # optional, defaults to every placed racer
//! spectators:
//!   - { cell: 7, effect: advance }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::board::{BoardError, BoardState, Placement, Racer, Spectator};
use crate::calc::CalcRequest;
use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectatorPlacement {
    pub cell: u8,
    pub effect: Spectator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub racers: Vec<Placement>,
    #[serde(default)]
    pub remaining: Option<Vec<Racer>>,
    #[serde(default)]
    pub spectators: Vec<SpectatorPlacement>,
}

impl Scenario {
    /// Load a scenario; `.json` files parse as JSON, anything else as YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn board(&self, track_len: u8) -> Result<BoardState, BoardError> {
        let tiles: Vec<(u8, Spectator)> =
            self.spectators.iter().map(|s| (s.cell, s.effect)).collect();
        BoardState::new(track_len, &self.racers, &tiles)
    }

    /// Racers still owed a roll. Defaults to every placed racer.
    pub fn remaining(&self) -> Vec<Racer> {
        match &self.remaining {
            Some(r) => r.clone(),
            None => {
                let mut all: Vec<Racer> = self.racers.iter().map(|p| p.racer).collect();
                all.sort_unstable();
                all.dedup();
                all
            }
        }
    }

    pub fn request(&self, track_len: u8) -> Result<CalcRequest, BoardError> {
        Ok(CalcRequest {
            board: self.board(track_len)?,
            remaining: self.remaining(),
        })
    }
}
