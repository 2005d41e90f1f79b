// src/ui/hud/plugin.rs
//
// HudPlugin coordinates the stat HUD systems and resources.

use bevy::prelude::*;

use crate::core::InteractionSet;

use super::components::{HudFeed, HudSettings};
use super::systems::{spawn_hud, update_hud_clock, update_hud_message, update_hud_stats};

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        info!("HudPlugin registered");

        app.init_resource::<HudSettings>()
            .init_resource::<HudFeed>()
            .add_systems(Startup, spawn_hud)
            .add_systems(
                Update,
                (update_hud_stats, update_hud_clock, update_hud_message)
                    .in_set(InteractionSet::Present),
            );
    }
}
