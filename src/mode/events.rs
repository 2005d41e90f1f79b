//! Before/after notifications published by the state machine.
use super::{
    state::{GameState, InteractionMode, SceneMode},
    transition::TransitionRejection,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameStateChanging {
    pub from: GameState,
    pub to: GameState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameStateChanged {
    pub from: GameState,
    pub to: GameState,
}

/// Published when a scene transition is accepted, before any hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneChanging {
    pub from: SceneMode,
    pub to: SceneMode,
}

/// Exit hook for the scene being left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneExited {
    pub scene: SceneMode,
}

/// Enter hook for the new scene; the swap has already happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneEntered {
    pub scene: SceneMode,
}

/// Published once the settle delay has elapsed (or the transition was snapped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneChanged {
    pub from: SceneMode,
    pub to: SceneMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionModeChanging {
    pub from: InteractionMode,
    pub to: InteractionMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionModeChanged {
    pub from: InteractionMode,
    pub to: InteractionMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRejected {
    pub rejection: TransitionRejection,
}
