// src/ui/config.rs
//
// Layout and behaviour of the input layers, loaded from `config/ui.toml`.

use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::Deserialize;

use crate::{core::config::load_toml_or_default, mode::state::SceneMode};

use super::surface::components::SurfaceAffinity;

const CONFIG_PATH: &str = "config/ui.toml";

#[derive(Debug, Clone, Deserialize, Default)]
struct RawUiConfig {
    #[serde(default)]
    anchor: RawAnchorSection,
    #[serde(default)]
    surfaces: RawSurfacesSection,
    #[serde(default, rename = "surface")]
    surface_list: Vec<RawSurface>,
    #[serde(default)]
    scenes: BTreeMap<String, RawSceneSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawAnchorSection {
    margin: f32,
    offscreen_margin: f32,
    smoothing: bool,
    smoothing_rate: f32,
    region_size: [f32; 2],
}

impl Default for RawAnchorSection {
    fn default() -> Self {
        Self {
            margin: 24.0,
            offscreen_margin: 120.0,
            smoothing: true,
            smoothing_rate: 12.0,
            region_size: [96.0, 96.0],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawSurfacesSection {
    debounce_seconds: f32,
}

impl Default for RawSurfacesSection {
    fn default() -> Self {
        Self {
            debounce_seconds: 0.25,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawSurface {
    name: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    interaction: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    affinity: SurfaceAffinity,
    #[serde(default)]
    position: [f32; 2],
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawSceneSection {
    #[serde(default)]
    allow: Vec<String>,
}

/// Screen anchor tuning.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct AnchorSettings {
    /// Inset from every screen edge the clickable region never crosses.
    pub margin: f32,
    /// How far outside the viewport an actor may be and still count as visible.
    pub offscreen_margin: f32,
    pub smoothing: bool,
    /// Exponential approach rate, per second.
    pub smoothing_rate: f32,
    pub region_size: Vec2,
}

impl Default for AnchorSettings {
    fn default() -> Self {
        RawAnchorSection::default().into()
    }
}

impl From<RawAnchorSection> for AnchorSettings {
    fn from(value: RawAnchorSection) -> Self {
        Self {
            margin: value.margin.max(0.0),
            offscreen_margin: value.offscreen_margin.max(0.0),
            smoothing: value.smoothing,
            smoothing_rate: value.smoothing_rate.max(0.0),
            region_size: Vec2::new(value.region_size[0], value.region_size[1]).max(Vec2::ONE),
        }
    }
}

/// One fixed clickable button.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSpec {
    pub name: String,
    pub label: String,
    pub interaction: String,
    pub target: String,
    pub affinity: SurfaceAffinity,
    pub position: Vec2,
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct UiConfig {
    pub anchor: AnchorSettings,
    pub debounce_seconds: f32,
    pub surfaces: Vec<SurfaceSpec>,
    /// Interaction names each scene enables.
    pub scene_allow: BTreeMap<SceneMode, Vec<String>>,
}

impl UiConfig {
    pub fn load_or_default() -> Self {
        let raw = load_toml_or_default::<RawUiConfig>(CONFIG_PATH);
        if raw.surface_list.is_empty() {
            info!("No surfaces in {}; using built-in layout", CONFIG_PATH);
            return Self {
                anchor: raw.anchor.into(),
                debounce_seconds: raw.surfaces.debounce_seconds.max(0.0),
                ..Self::builtin()
            };
        }
        raw.into()
    }

    pub fn allowed_in(&self, scene: SceneMode) -> &[String] {
        self.scene_allow
            .get(&scene)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Office and home layouts matching the built-in interaction catalog.
    pub fn builtin() -> Self {
        use SurfaceAffinity::{DialogOnly, OverviewOnly};

        let surface = |name: &str, label: &str, target: &str, affinity, x: f32, y: f32| SurfaceSpec {
            name: name.to_string(),
            label: label.to_string(),
            interaction: name.to_string(),
            target: target.to_string(),
            affinity,
            position: Vec2::new(x, y),
        };
        let surfaces = vec![
            surface("HelpWork", "Work", "desk", OverviewOnly, 24.0, 24.0),
            surface("TalkBoss", "Talk to boss", "boss", OverviewOnly, 24.0, 72.0),
            surface("GoHome", "Go home", "door", OverviewOnly, 24.0, 120.0),
            surface("AskRaise", "Ask for a raise", "boss", DialogOnly, 24.0, 24.0),
            surface("EndConversation", "Leave", "boss", DialogOnly, 24.0, 72.0),
            surface("FeedCat", "Feed cat", "bowl", OverviewOnly, 24.0, 24.0),
            surface("Nap", "Nap", "couch", OverviewOnly, 24.0, 72.0),
            surface("Snack", "Snack", "fridge", OverviewOnly, 24.0, 120.0),
            surface("GoToWork", "Go to work", "door", OverviewOnly, 24.0, 168.0),
        ];

        let names = |list: &[&str]| -> Vec<String> { list.iter().map(|name| name.to_string()).collect() };
        let scene_allow = BTreeMap::from([
            (
                SceneMode::LocationA,
                names(&["HelpWork", "TalkBoss", "GoHome", "AskRaise", "EndConversation"]),
            ),
            (
                SceneMode::LocationB,
                names(&["FeedCat", "Nap", "Snack", "GoToWork"]),
            ),
        ]);

        Self {
            anchor: AnchorSettings::default(),
            debounce_seconds: RawSurfacesSection::default().debounce_seconds,
            surfaces,
            scene_allow,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl From<RawUiConfig> for UiConfig {
    fn from(value: RawUiConfig) -> Self {
        let surfaces = value
            .surface_list
            .into_iter()
            .map(|raw| {
                let interaction = raw.interaction.unwrap_or_else(|| raw.name.clone());
                SurfaceSpec {
                    label: raw.label.unwrap_or_else(|| raw.name.clone()),
                    target: raw.target.unwrap_or_else(|| raw.name.clone()),
                    interaction,
                    name: raw.name,
                    affinity: raw.affinity,
                    position: Vec2::new(raw.position[0], raw.position[1]),
                }
            })
            .collect();

        let mut scene_allow = BTreeMap::new();
        for (label, section) in value.scenes {
            match SceneMode::ALL.into_iter().find(|scene| scene.label() == label) {
                Some(scene) => {
                    scene_allow.insert(scene, section.allow);
                }
                None => warn!("Ignoring unknown scene `{}` in {}", label, CONFIG_PATH),
            }
        }

        Self {
            anchor: value.anchor.into(),
            debounce_seconds: value.surfaces.debounce_seconds.max(0.0),
            surfaces,
            scene_allow,
        }
    }
}
