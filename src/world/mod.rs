//! World module housing both locations, the scene camera and the in-game clock.
pub mod components;
pub mod plugin;
pub mod systems;
pub mod time;

pub use plugin::WorldPlugin;
