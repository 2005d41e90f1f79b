// src/ui/mod.rs
//
// UI module providing the input layers and screen-space HUD.
//
// Current features:
// - Static input surfaces (fixed buttons per scene and interaction mode)
// - Screen anchors (clickable regions following moving actors)
// - HUD (animated stats, clock, interaction messages)

pub mod anchor;
pub mod config;
pub mod hud;
pub mod plugin;
pub mod surface;

// Re-export the main plugin
pub use plugin::UiPlugin;
