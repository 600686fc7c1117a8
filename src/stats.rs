use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Best score assumed before any scored win.
const DEFAULT_BEST_SCORE: i32 = -52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub attempts: u32,
    pub wins: u32,
    /// Fastest win in milliseconds.
    pub best_time: Option<u64>,
    pub best_score: i32,
}

impl Default for GameStats {
    fn default() -> Self {
        GameStats {
            attempts: 0,
            wins: 0,
            best_time: None,
            best_score: DEFAULT_BEST_SCORE,
        }
    }
}

impl GameStats {
    pub fn win_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.wins as f64 / self.attempts as f64
        }
    }
}

/// Statistics keyed by game type string, e.g. `SolitaireVegasDeal3`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    games: HashMap<String, GameStats>,
}

impl Stats {
    pub fn get(&self, game_type: &str) -> GameStats {
        self.games.get(game_type).copied().unwrap_or_default()
    }

    pub fn record_attempt(&mut self, game_type: &str) {
        self.games.entry(game_type.to_string()).or_default().attempts += 1;
    }

    /// `score` is only given for variants that keep one.
    pub fn record_win(&mut self, game_type: &str, elapsed_ms: u64, score: Option<i32>) {
        let stats = self.games.entry(game_type.to_string()).or_default();
        stats.wins += 1;
        if stats.best_time.map_or(true, |best| elapsed_ms < best) {
            stats.best_time = Some(elapsed_ms);
        }
        if let Some(score) = score {
            stats.best_score = stats.best_score.max(score);
        }
    }

    /// Keeps the final score of a scored game that ended without a win.
    pub fn record_score(&mut self, game_type: &str, score: i32) {
        let stats = self.games.entry(game_type.to_string()).or_default();
        stats.best_score = stats.best_score.max(score);
    }
}
