// src/ui/surface/plugin.rs
//
// SurfacePlugin registers the static surface layer and its button systems.

use bevy::prelude::*;

use crate::{core::InteractionSet, ui::config::UiConfig};

use super::{
    components::StaticSurfaces,
    systems::{handle_surface_clicks, spawn_surface_buttons, sync_surface_buttons},
};

pub struct SurfacePlugin;

impl Plugin for SurfacePlugin {
    fn build(&self, app: &mut App) {
        let surfaces = {
            let config = app.world_mut().get_resource_or_init::<UiConfig>();
            StaticSurfaces::from_config(&config)
        };
        info!("SurfacePlugin registered ({} surface(s))", surfaces.specs().count());

        app.insert_resource(surfaces)
            .add_systems(Startup, spawn_surface_buttons)
            .add_systems(Update, handle_surface_clicks.in_set(InteractionSet::Input))
            .add_systems(Update, sync_surface_buttons.in_set(InteractionSet::Present));
    }
}
