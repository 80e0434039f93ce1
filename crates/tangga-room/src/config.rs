//! Game rules: capacity, dice, session length, board size.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tangga_protocol::{Color, GameSession};

/// A rule set that can't be played with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("dice range {min}..={max} is empty")]
    EmptyDice { min: u8, max: u8 },

    #[error("dice range {min}..={max} for level {level} is empty")]
    EmptyLevelDice { level: u32, min: u8, max: u8 },

    #[error("session duration {min_secs}..={max_secs}s is empty")]
    EmptyDuration { min_secs: u32, max_secs: u32 },

    #[error("board size must be at least 1")]
    EmptyBoard,
}

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

/// Inclusive dice bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRange {
    pub min: u8,
    pub max: u8,
}

impl DiceRange {
    /// Draws a value uniformly from the range.
    ///
    /// Inverted bounds are read low-to-high, so an unvalidated rule set
    /// can never panic the coordinator.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> u8 {
        let (low, high) = self.bounds();
        rng.random_range(low..=high)
    }

    /// Returns `true` if `value` could have been rolled.
    pub fn contains(&self, value: u8) -> bool {
        let (low, high) = self.bounds();
        (low..=high).contains(&value)
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    fn bounds(&self) -> (u8, u8) {
        (self.min.min(self.max), self.max.max(self.min))
    }
}

impl Default for DiceRange {
    fn default() -> Self {
        Self { min: 4, max: 6 }
    }
}

/// Inclusive bounds for the target session length, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRange {
    pub min_secs: u32,
    pub max_secs: u32,
}

impl Default for DurationRange {
    fn default() -> Self {
        // Five to seven minutes.
        Self {
            min_secs: 300,
            max_secs: 420,
        }
    }
}

// ---------------------------------------------------------------------------
// GameRules
// ---------------------------------------------------------------------------

/// Server-wide rules applied to every room.
///
/// Missing fields in a config file take their default, so an empty JSON
/// object is a valid rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Capacity used when a creator doesn't ask for one.
    pub default_max_players: usize,

    /// Dice bounds for levels without an override.
    pub dice: DiceRange,

    /// Per-level dice bounds, keyed by level.
    pub level_dice: BTreeMap<u32, DiceRange>,

    /// Bounds for the random session length drawn at game start.
    pub session_duration: DurationRange,

    /// Highest board cell a player can occupy.
    pub board_size: u32,

    /// Number of characters in generated room codes.
    pub code_length: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            default_max_players: 4,
            dice: DiceRange::default(),
            level_dice: BTreeMap::new(),
            session_duration: DurationRange::default(),
            board_size: 100,
            code_length: 6,
        }
    }
}

impl GameRules {
    /// Checks that every range is non-empty and the board has a cell.
    ///
    /// # Errors
    /// Returns the first offending setting.
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.dice.is_empty() {
            let DiceRange { min, max } = self.dice;
            return Err(RulesError::EmptyDice { min, max });
        }
        if let Some((&level, dice)) = self.level_dice.iter().find(|(_, d)| d.is_empty()) {
            return Err(RulesError::EmptyLevelDice {
                level,
                min: dice.min,
                max: dice.max,
            });
        }
        let DurationRange { min_secs, max_secs } = self.session_duration;
        if min_secs > max_secs {
            return Err(RulesError::EmptyDuration { min_secs, max_secs });
        }
        if self.board_size == 0 {
            return Err(RulesError::EmptyBoard);
        }
        Ok(())
    }

    /// Returns the dice bounds for `level`.
    pub fn dice_for(&self, level: u32) -> DiceRange {
        self.level_dice.get(&level).copied().unwrap_or(self.dice)
    }

    /// Resolves a requested capacity.
    ///
    /// Absent means the default; anything else is clamped to
    /// `1..=PALETTE.len()` because every player needs a distinct color.
    pub fn capacity(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_max_players)
            .clamp(1, Color::PALETTE.len())
    }

    /// Draws the session metadata for a room entering `playing`.
    pub fn draw_session<R: Rng + ?Sized>(
        &self,
        level: u32,
        started_at: u64,
        rng: &mut R,
    ) -> GameSession {
        let DurationRange { min_secs, max_secs } = self.session_duration;
        GameSession {
            level,
            started_at,
            duration_secs: rng.random_range(min_secs..=max_secs.max(min_secs)),
        }
    }
}
