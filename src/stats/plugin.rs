//! StatsPlugin loads stat bounds and seeds the numeric store.
use bevy::prelude::*;

use super::{config::StatsConfig, flags::GameFlags, store::GameStats};

pub struct StatsPlugin;

impl Plugin for StatsPlugin {
    fn build(&self, app: &mut App) {
        let config = StatsConfig::load_or_default();
        info!(
            "Stats configured: display durations currency {:.2}s, vital {:.2}s, emotion {:.2}s",
            config.display.currency_seconds,
            config.display.vital_seconds,
            config.display.emotion_seconds
        );

        app.insert_resource(GameStats::from_config(&config))
            .insert_resource(config)
            .init_resource::<GameFlags>();
    }
}
