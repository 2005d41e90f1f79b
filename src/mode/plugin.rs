//! ModePlugin owns the state machine and schedules its frame-driven work.
use bevy::prelude::*;

use crate::core::{config::AppConfig, InteractionSet};

use super::{
    machine::{ModeStateMachine, DEFAULT_SETTLE_SECONDS},
    state::ModeState,
    systems::{
        advance_scene_transition, enter_gameplay, route_completed_interactions,
        sync_simulation_pause, toggle_pause_on_escape, ModeDirector,
    },
};

pub struct ModePlugin;

impl Plugin for ModePlugin {
    fn build(&self, app: &mut App) {
        let settle_seconds = app
            .world()
            .get_resource::<AppConfig>()
            .map_or(DEFAULT_SETTLE_SECONDS, |config| {
                config.scene_transition_seconds
            });
        info!(
            "ModePlugin registered (scene settle {:.2}s)",
            settle_seconds
        );

        app.insert_resource(ModeStateMachine::new(ModeState::default(), settle_seconds))
            .init_resource::<ModeDirector>()
            .add_systems(PostStartup, enter_gameplay)
            .add_systems(Update, toggle_pause_on_escape.in_set(InteractionSet::Input))
            .add_systems(
                Update,
                (
                    route_completed_interactions,
                    advance_scene_transition,
                    sync_simulation_pause,
                )
                    .chain()
                    .in_set(InteractionSet::Mode),
            );
    }
}
