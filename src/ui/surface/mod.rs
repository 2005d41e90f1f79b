// src/ui/surface/mod.rs
//
// Static input surfaces: fixed buttons enabled per scene and interaction mode.

pub mod components;
pub mod plugin;
pub mod systems;

pub use components::{StaticSurfaces, SurfaceAffinity, SurfaceButton, SurfaceClick};
pub use plugin::SurfacePlugin;
