//! Numeric game state: typed stat keys, the authoritative value store and
//! one-shot flags.
pub mod config;
pub mod flags;
pub mod plugin;
pub mod store;

pub use flags::GameFlags;
pub use plugin::StatsPlugin;
pub use store::{GameStats, NumericStore, StatCategory, StatKey};
