// src/ui/anchor/plugin.rs
//
// AnchorPlugin registers the screen anchor layer and its per-frame systems.
//
// Requirements:
// - `WorldPlugin` must be registered (provides the SceneCamera)

use bevy::prelude::*;

use crate::{
    core::InteractionSet,
    ui::config::{AnchorSettings, UiConfig},
};

use super::{
    components::ScreenAnchors,
    systems::{handle_anchor_clicks, position_anchor_regions, spawn_anchor_regions, track_actors},
};

pub struct AnchorPlugin;

impl Plugin for AnchorPlugin {
    fn build(&self, app: &mut App) {
        let settings = app.world_mut().get_resource_or_init::<UiConfig>().anchor;
        info!(
            "AnchorPlugin registered (margin {:.0}px, smoothing {})",
            settings.margin,
            if settings.smoothing { "on" } else { "off" }
        );

        app.insert_resource::<AnchorSettings>(settings)
            .insert_resource(ScreenAnchors::new(settings))
            .add_systems(Update, handle_anchor_clicks.in_set(InteractionSet::Input))
            .add_systems(
                Update,
                (spawn_anchor_regions, track_actors, position_anchor_regions)
                    .chain()
                    .in_set(InteractionSet::Present),
            );
    }
}
