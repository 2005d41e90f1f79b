//! Mode/scene state machine: game state, active scene and interaction mode,
//! plus the multi-frame scene transition sequence.
pub mod events;
pub mod machine;
pub mod plugin;
pub mod state;
pub mod systems;
pub mod transition;

pub use machine::ModeStateMachine;
pub use plugin::ModePlugin;
pub use state::{GameState, InputLayer, InteractionMode, ModeState, SceneMode};
pub use systems::{InputLayers, ModeDirector};
pub use transition::TransitionRejection;
