//! WorldPlugin sets up both locations, the scene camera and the in-game clock.
use bevy::prelude::*;

use crate::{
    core::InteractionSet,
    world::{
        systems::{apply_scene_visibility, spawn_world_environment, wander_actors},
        time::{GameClock, TimeSettings},
    },
};

pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        let time_settings = TimeSettings::load_or_default();
        info!(
            "World time configured: {} slot(s) per day, starting day {} slot {}",
            time_settings.slots_per_day, time_settings.start_day, time_settings.start_slot
        );

        app.insert_resource(GameClock::new(&time_settings))
            .insert_resource(time_settings)
            .add_systems(Startup, spawn_world_environment)
            .add_systems(
                Update,
                (wander_actors, apply_scene_visibility).in_set(InteractionSet::Present),
            );
    }
}
