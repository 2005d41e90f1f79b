use std::path::Path;

use bevy::{log::LogPlugin, prelude::*};

mod bus;
mod core;
mod interaction;
mod mode;
mod persistence;
mod stats;
mod ui;
mod world;

use crate::{
    bus::BusPlugin,
    core::{config::AppConfig, CorePlugin},
    interaction::InteractionPlugin,
    mode::ModePlugin,
    persistence::PersistencePlugin,
    stats::StatsPlugin,
    ui::UiPlugin,
    world::WorldPlugin,
};

fn main() {
    load_interaction_env();
    let config = AppConfig::load_or_default();

    App::new()
        .insert_resource(config.clone())
        .add_plugins(
            DefaultPlugins
                .set(LogPlugin {
                    filter: config.log_filter.clone(),
                    ..default()
                })
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: config.window_title.clone(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .add_plugins((
            CorePlugin::default(),
            BusPlugin::with_history_capacity(config.bus_history_capacity),
            StatsPlugin,
            WorldPlugin,
            InteractionPlugin::default(), // Reads AppConfig for the gate bypass
            UiPlugin,
            ModePlugin,
            PersistencePlugin::default(),
        ))
        .run();
}

/// Optional playtest overrides such as `INTERACTION_GATE_BYPASS=1`.
fn load_interaction_env() {
    const ENV_FILE: &str = "interaction.env";

    let path = Path::new(ENV_FILE);
    if !path.exists() {
        return;
    }

    if let Err(err) = dotenvy::from_filename(path) {
        eprintln!("Failed to load {}: {}", ENV_FILE, err);
    }
}
