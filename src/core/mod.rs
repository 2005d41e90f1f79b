//! Core module hosting the simulation clock, application config and the
//! shared error taxonomy.
pub mod config;
pub mod errors;
pub mod plugin;

pub use plugin::{CorePlugin, InteractionSet, SimulationClock};
