// src/ui/anchor/mod.rs
//
// Screen anchors: clickable regions that follow moving world-space actors.

pub mod components;
pub mod plugin;
pub mod projection;
pub mod systems;

pub use components::{AnchorHit, AnchorHitRegion, ScreenAnchors, TrackedActor};
pub use plugin::AnchorPlugin;
pub use projection::{Projection, Projector, ScreenRect};
