// src/ui/plugin.rs
//
// UiPlugin loads the UI layout and registers the input layers and the HUD.

use bevy::prelude::*;

use super::{anchor::AnchorPlugin, config::UiConfig, hud::HudPlugin, surface::SurfacePlugin};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<UiConfig>() {
            app.insert_resource(UiConfig::load_or_default());
        }
        info!("UiPlugin registered");

        // Layers read UiConfig while building, so it must exist first.
        app.add_plugins((SurfacePlugin, AnchorPlugin, HudPlugin));
    }
}
