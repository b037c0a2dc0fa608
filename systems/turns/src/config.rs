//! Battle setup parameters.

use hex_battle_core::{HexCoord, DEFAULT_HAND_SIZE, DEFAULT_MOVEMENT_PER_TURN};
use hex_battle_world::{GridError, HexLayout};
use serde::{Deserialize, Serialize};

use crate::TurnRules;

/// Everything needed to set up a battle session.
///
/// Every field has a default, so a partial TOML table only overrides what it
/// names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BattleConfig {
    /// Number of tile columns.
    pub width: u32,
    /// Number of tile rows.
    pub height: u32,
    /// Distance from a tile centre to its corners, in world units.
    pub tile_size: f32,
    /// Tiles the player may travel per turn.
    pub movement_per_turn: u32,
    /// Cards held after each refill.
    pub hand_size: usize,
    /// Seed for the battle's random generator; drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Starting tile of the player.
    pub player: HexCoord,
    /// Starting tiles of the non-player actors.
    pub npcs: Vec<HexCoord>,
    /// Impassable scenery.
    pub obstacles: Vec<HexCoord>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            width: 8,
            height: 8,
            tile_size: 1.0,
            movement_per_turn: DEFAULT_MOVEMENT_PER_TURN,
            hand_size: DEFAULT_HAND_SIZE,
            seed: None,
            player: HexCoord::new(2, 5),
            npcs: vec![HexCoord::new(3, 3)],
            obstacles: vec![HexCoord::new(3, 4)],
        }
    }
}

/// Reasons a configuration cannot produce a battle.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The grid dimensions or tile size are unusable.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// An actor or obstacle lies outside the grid.
    #[error("{what} at {coord:?} lies outside the grid")]
    OutOfBounds {
        /// Kind of entry that was misplaced.
        what: &'static str,
        /// Offending coordinate.
        coord: HexCoord,
    },
    /// Two entries claim the same tile.
    #[error("more than one entry occupies {0:?}")]
    Overlap(HexCoord),
}

impl BattleConfig {
    /// Checks the configuration and returns the grid layout it describes.
    pub fn validate(&self) -> Result<HexLayout, ConfigError> {
        let layout = HexLayout::new(self.width, self.height, self.tile_size)?;

        let entries = std::iter::once(("player", self.player))
            .chain(self.npcs.iter().map(|coord| ("npc", *coord)))
            .chain(self.obstacles.iter().map(|coord| ("obstacle", *coord)));

        let mut seen = Vec::new();
        for (what, coord) in entries {
            if !layout.is_valid_coord(coord) {
                return Err(ConfigError::OutOfBounds { what, coord });
            }
            if seen.contains(&coord) {
                return Err(ConfigError::Overlap(coord));
            }
            seen.push(coord);
        }

        Ok(layout)
    }

    /// Turn limits derived from the configuration.
    #[must_use]
    pub const fn rules(&self) -> TurnRules {
        TurnRules::new(self.movement_per_turn, self.hand_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        let layout = BattleConfig::default().validate().expect("defaults are valid");
        assert_eq!((layout.width(), layout.height()), (8, 8));
    }

    #[test]
    fn actors_outside_the_grid_are_rejected() {
        let config = BattleConfig {
            npcs: vec![HexCoord::new(8, 0)],
            ..BattleConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::OutOfBounds {
                what: "npc",
                coord: HexCoord::new(8, 0),
            })
        );
    }

    #[test]
    fn overlapping_entries_are_rejected() {
        let config = BattleConfig {
            obstacles: vec![HexCoord::new(2, 5)],
            ..BattleConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Overlap(HexCoord::new(2, 5))));
    }

    #[test]
    fn degenerate_grids_are_rejected() {
        let config = BattleConfig {
            width: 0,
            ..BattleConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Grid(_))));
    }
}
