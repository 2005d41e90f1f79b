// src/ui/hud/mod.rs
//
// HUD panel showing animated stats, the clock and interaction messages.

pub mod components;
pub mod plugin;
pub mod systems;

pub use components::{HudFeed, HudSettings};
pub use plugin::HudPlugin;
