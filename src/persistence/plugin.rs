//! PersistencePlugin wires F5/F9 to the configured snapshot store.
use std::sync::Mutex;

use bevy::prelude::*;

use crate::core::{config::AppConfig, InteractionSet};

use super::{
    snapshot::{JsonSnapshotFile, SnapshotStore},
    systems::{load_snapshot, read_snapshot_keys, save_snapshot, PendingSnapshot, SnapshotSlot},
};

#[derive(Default)]
pub struct PersistencePlugin {
    store: Mutex<Option<Box<dyn SnapshotStore>>>,
}

impl PersistencePlugin {
    /// Uses `store` instead of the file named in `AppConfig`.
    pub fn with_store(store: impl SnapshotStore + 'static) -> Self {
        Self {
            store: Mutex::new(Some(Box::new(store))),
        }
    }
}

impl Plugin for PersistencePlugin {
    fn build(&self, app: &mut App) {
        let custom = self
            .store
            .lock()
            .ok()
            .and_then(|mut store| store.take());
        let store = custom.unwrap_or_else(|| {
            let path = app
                .world()
                .get_resource::<AppConfig>()
                .map(|config| config.snapshot_path.clone())
                .unwrap_or_else(|| AppConfig::default().snapshot_path);
            Box::new(JsonSnapshotFile::new(path))
        });
        info!("PersistencePlugin registered (snapshot at {})", store.describe());

        app.insert_resource(SnapshotSlot(store))
            .init_resource::<PendingSnapshot>()
            .add_systems(Update, read_snapshot_keys.in_set(InteractionSet::Input))
            .add_systems(
                Update,
                (save_snapshot, load_snapshot)
                    .chain()
                    .after(InteractionSet::Process)
                    .before(InteractionSet::Mode),
            );
    }
}
