//! Bus plugin owning the process-wide `EventBus` resource.
use bevy::{app::AppExit, ecs::message::MessageReader, prelude::*};

use super::{channel::EventBus, history::DEFAULT_HISTORY_CAPACITY};

/// Signal published once every plugin has finished its startup systems.
pub const APP_STARTED_SIGNAL: &str = "app.started";

#[derive(Debug, Clone, Copy)]
pub struct BusPlugin {
    history_capacity: usize,
}

impl BusPlugin {
    pub const fn with_history_capacity(history_capacity: usize) -> Self {
        Self { history_capacity }
    }
}

impl Default for BusPlugin {
    fn default() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl Plugin for BusPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(EventBus::new(self.history_capacity))
            .add_systems(PostStartup, announce_startup)
            .add_systems(Last, clear_bus_on_exit);

        info!(
            "BusPlugin registered (history capacity {})",
            self.history_capacity
        );
    }
}

fn announce_startup(bus: Res<EventBus>) {
    bus.publish_signal(APP_STARTED_SIGNAL, serde_json::Value::Null);
}

fn clear_bus_on_exit(mut exits: MessageReader<AppExit>, bus: Res<EventBus>) {
    if exits.read().next().is_none() {
        return;
    }

    info!(
        target: "bus",
        "Shutting down bus: {} publishes retained, {} subscriber failures",
        bus.history().len(),
        bus.failure_count()
    );
    bus.clear();
}
