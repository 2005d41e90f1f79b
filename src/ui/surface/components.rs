// src/ui/surface/components.rs
//
// Static input surfaces: fixed buttons whose enabled state follows the
// active scene and interaction mode.

use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::Deserialize;

use crate::{
    interaction::types::TargetId,
    mode::state::{InputLayer, InteractionMode, ModeState, SceneMode},
    ui::config::{SurfaceSpec, UiConfig},
};

/// Which interaction mode a surface belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceAffinity {
    OverviewOnly,
    DialogOnly,
    #[default]
    Any,
}

impl SurfaceAffinity {
    pub fn allows(self, mode: InteractionMode) -> bool {
        match self {
            Self::OverviewOnly => mode == InteractionMode::Overview,
            Self::DialogOnly => mode == InteractionMode::Dialog,
            Self::Any => true,
        }
    }
}

/// Marker on the button entity spawned for a surface.
#[derive(Component, Debug, Clone)]
pub struct SurfaceButton {
    pub name: String,
}

#[derive(Debug, Clone)]
struct SurfaceState {
    spec: SurfaceSpec,
    in_scene: bool,
    in_mode: bool,
    /// Manual switch from `set_enabled`; cannot override scene or mode.
    switched_on: bool,
    last_click: Option<f64>,
}

impl SurfaceState {
    fn enabled(&self) -> bool {
        self.in_scene && self.in_mode && self.switched_on
    }
}

/// A click accepted by a surface, ready for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceClick {
    pub interaction: String,
    pub target: TargetId,
}

#[derive(Resource, Debug, Clone)]
pub struct StaticSurfaces {
    surfaces: BTreeMap<String, SurfaceState>,
    scene_allow: BTreeMap<SceneMode, Vec<String>>,
    debounce_seconds: f64,
}

impl StaticSurfaces {
    /// Builds every configured surface disabled; the state machine enables
    /// the right set on its first sync.
    pub fn from_config(config: &UiConfig) -> Self {
        let surfaces = config
            .surfaces
            .iter()
            .map(|spec| {
                (
                    spec.name.clone(),
                    SurfaceState {
                        spec: spec.clone(),
                        in_scene: false,
                        in_mode: false,
                        switched_on: true,
                        last_click: None,
                    },
                )
            })
            .collect();

        Self {
            surfaces,
            scene_allow: config.scene_allow.clone(),
            debounce_seconds: f64::from(config.debounce_seconds),
        }
    }

    pub fn spec(&self, name: &str) -> Option<&SurfaceSpec> {
        self.surfaces.get(name).map(|state| &state.spec)
    }

    pub fn specs(&self) -> impl Iterator<Item = &SurfaceSpec> {
        self.surfaces.values().map(|state| &state.spec)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.surfaces.get(name).is_some_and(SurfaceState::enabled)
    }

    pub fn enabled_names(&self) -> Vec<&str> {
        self.surfaces
            .iter()
            .filter(|(_, state)| state.enabled())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn affinity(&self, name: &str) -> Option<SurfaceAffinity> {
        self.surfaces.get(name).map(|state| state.spec.affinity)
    }

    /// Switches one surface on or off. A surface outside the current scene
    /// or mode stays disabled regardless.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let Some(state) = self.surfaces.get_mut(name) else {
            warn!(target: "surface", "set_enabled on unknown surface `{}`", name);
            return false;
        };
        state.switched_on = enabled;
        debug!(target: "surface", "Surface `{}` switched {}", name, if enabled { "on" } else { "off" });
        true
    }

    pub fn set_all_enabled(&mut self, enabled: bool) {
        for state in self.surfaces.values_mut() {
            state.switched_on = enabled;
        }
        debug!(target: "surface", "All surfaces switched {}", if enabled { "on" } else { "off" });
    }

    /// Accepts a click if the surface is enabled and outside its debounce
    /// window. No gating happens here; the dispatcher decides.
    pub fn register_click(&mut self, name: &str, now_seconds: f64) -> Option<SurfaceClick> {
        let debounce = self.debounce_seconds;
        let state = self.surfaces.get_mut(name)?;
        if !state.enabled() {
            debug!(target: "surface", "Click on disabled surface `{}` ignored", name);
            return None;
        }
        if let Some(last) = state.last_click {
            if now_seconds - last < debounce {
                debug!(target: "surface", "Click on `{}` debounced", name);
                return None;
            }
        }

        state.last_click = Some(now_seconds);
        Some(SurfaceClick {
            interaction: state.spec.interaction.clone(),
            target: TargetId::new(state.spec.target.clone()),
        })
    }
}

impl InputLayer for StaticSurfaces {
    fn apply_mode(&mut self, state: &ModeState) {
        let allowed = self
            .scene_allow
            .get(&state.scene)
            .cloned()
            .unwrap_or_default();
        for (name, surface) in &mut self.surfaces {
            surface.in_scene = allowed.iter().any(|entry| entry == name);
            surface.in_mode = surface.spec.affinity.allows(state.interaction);
        }
        debug!(
            target: "surface",
            "Surfaces recomputed for {}: {:?}",
            state,
            self.enabled_names()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::state::GameState;

    fn surfaces() -> StaticSurfaces {
        StaticSurfaces::from_config(&UiConfig::builtin())
    }

    fn dialog(scene: SceneMode) -> ModeState {
        ModeState::new(GameState::Dialog, scene, InteractionMode::Dialog)
    }

    #[test]
    fn scene_allow_list_drives_enabled_set() {
        let mut surfaces = surfaces();
        assert!(surfaces.enabled_names().is_empty());

        surfaces.apply_mode(&ModeState::gameplay(SceneMode::LocationA));
        assert!(surfaces.is_enabled("HelpWork"));
        assert!(!surfaces.is_enabled("FeedCat"));

        surfaces.apply_mode(&ModeState::gameplay(SceneMode::LocationB));
        assert!(!surfaces.is_enabled("HelpWork"));
        assert!(surfaces.is_enabled("FeedCat"));
    }

    #[test]
    fn dialog_and_overview_sets_are_disjoint() {
        let mut surfaces = surfaces();
        surfaces.apply_mode(&dialog(SceneMode::LocationA));
        for name in surfaces.enabled_names() {
            assert_ne!(surfaces.affinity(name), Some(SurfaceAffinity::OverviewOnly));
        }
        assert!(surfaces.is_enabled("AskRaise"));

        surfaces.apply_mode(&ModeState::gameplay(SceneMode::LocationA));
        for name in surfaces.enabled_names() {
            assert_ne!(surfaces.affinity(name), Some(SurfaceAffinity::DialogOnly));
        }
    }

    #[test]
    fn manual_switch_cannot_break_mode_disjointness() {
        let mut surfaces = surfaces();
        surfaces.apply_mode(&dialog(SceneMode::LocationA));
        surfaces.set_all_enabled(true);
        assert!(!surfaces.is_enabled("HelpWork"));

        assert!(surfaces.set_enabled("AskRaise", false));
        assert!(!surfaces.is_enabled("AskRaise"));
        assert!(!surfaces.set_enabled("Teleport", true));
    }

    #[test]
    fn clicks_are_debounced_per_surface() {
        let mut surfaces = surfaces();
        surfaces.apply_mode(&ModeState::gameplay(SceneMode::LocationA));

        let click = surfaces.register_click("HelpWork", 1.0).expect("first click");
        assert_eq!(click.interaction, "HelpWork");
        assert_eq!(click.target, TargetId::new("desk"));
        assert!(surfaces.register_click("HelpWork", 1.1).is_none());
        assert!(surfaces.register_click("TalkBoss", 1.1).is_some());
        assert!(surfaces.register_click("HelpWork", 1.3).is_some());
    }

    #[test]
    fn disabled_surface_ignores_clicks() {
        let mut surfaces = surfaces();
        surfaces.apply_mode(&ModeState::gameplay(SceneMode::LocationB));
        assert!(surfaces.register_click("HelpWork", 0.0).is_none());
    }
}
