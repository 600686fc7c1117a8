//! Player preferences read by the variants.

use serde::{Deserialize, Serialize};

use crate::cards::SuitCount;
use crate::rules::{AutoMove, GameKind};

/// Preferences are read when a game is created; only `auto_move` is picked
/// up again mid-game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub auto_move: AutoMove,
    /// Klondike turns three cards per deal instead of one.
    pub deal_three: bool,
    /// Klondike with Vegas scoring and a limited number of redeals.
    pub vegas: bool,
    pub spider_suits: SuitCount,
    /// Variant started when a saved game cannot be restored.
    pub last_game: GameKind,
    pub replay_on_win: bool,
    /// Fixed shuffle seed. `None` shuffles from entropy.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            auto_move: AutoMove::Always,
            deal_three: true,
            vegas: false,
            spider_suits: SuitCount::Four,
            last_game: GameKind::Klondike,
            replay_on_win: true,
            seed: None,
        }
    }
}

impl Settings {
    pub fn seeded(seed: u64) -> Settings {
        Settings {
            seed: Some(seed),
            ..Settings::default()
        }
    }
}
