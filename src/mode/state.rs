//! The three orthogonal mode axes and the layer hook driven by them.
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    Menu,
    Gameplay,
    Dialog,
    Paused,
}

impl GameState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Gameplay => "gameplay",
            Self::Dialog => "dialog",
            Self::Paused => "paused",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SceneMode {
    #[default]
    LocationA,
    LocationB,
}

impl SceneMode {
    pub const ALL: [SceneMode; 2] = [SceneMode::LocationA, SceneMode::LocationB];

    pub fn other(self) -> Self {
        match self {
            Self::LocationA => Self::LocationB,
            Self::LocationB => Self::LocationA,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::LocationA => "location_a",
            Self::LocationB => "location_b",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    #[default]
    Overview,
    Dialog,
}

impl InteractionMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Dialog => "dialog",
        }
    }
}

macro_rules! display_via_label {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

display_via_label!(GameState, SceneMode, InteractionMode);

/// Single authoritative mode snapshot, written only by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeState {
    pub game: GameState,
    pub scene: SceneMode,
    pub interaction: InteractionMode,
}

impl ModeState {
    pub fn new(game: GameState, scene: SceneMode, interaction: InteractionMode) -> Self {
        Self {
            game,
            scene,
            interaction,
        }
    }

    pub fn gameplay(scene: SceneMode) -> Self {
        Self::new(GameState::Gameplay, scene, InteractionMode::Overview)
    }
}

impl fmt::Display for ModeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.game, self.scene, self.interaction)
    }
}

/// Any requested destination on one of the three axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTarget {
    Game(GameState),
    Scene(SceneMode),
    Interaction(InteractionMode),
}

impl fmt::Display for ModeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Game(state) => write!(f, "game state {state}"),
            Self::Scene(scene) => write!(f, "scene {scene}"),
            Self::Interaction(mode) => write!(f, "interaction mode {mode}"),
        }
    }
}

/// Input layers (static surfaces, anchored hit regions) recompute their
/// enabled set whenever the scene or interaction mode changes.
pub trait InputLayer {
    fn apply_mode(&mut self, state: &ModeState);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenes_toggle() {
        assert_eq!(SceneMode::LocationA.other(), SceneMode::LocationB);
        assert_eq!(SceneMode::LocationB.other(), SceneMode::LocationA);
    }

    #[test]
    fn display_is_compact() {
        let state = ModeState::gameplay(SceneMode::LocationB);
        assert_eq!(state.to_string(), "gameplay/location_b/overview");
        assert_eq!(
            ModeTarget::Interaction(InteractionMode::Dialog).to_string(),
            "interaction mode dialog"
        );
    }
}
