//! Rules engine for Klondike, Spider, Freecell and Forty Thieves.
//!
//! A [`Game`] owns one variant's [`Rules`] and the [`Table`] they play on.
//! The presentation layer issues commands, shows transfers as they happen
//! and reports back through [`Game::transfer_complete`].

pub mod anchor;
pub mod cards;
pub mod event;
pub mod game;
pub mod moves;
pub mod rules;
pub mod settings;
pub mod snapshot;
pub mod stats;
pub mod table;

pub use crate::cards::{Card, Suit, SuitCount};
pub use crate::game::{Game, Notice};
pub use crate::rules::{AutoMove, GameKind, Rules};
pub use crate::settings::Settings;
pub use crate::snapshot::Snapshot;
pub use crate::stats::Stats;
pub use crate::table::Table;
