//! Save/load of the running game (F5 saves, F9 loads).
pub mod plugin;
pub mod snapshot;
pub mod systems;

pub use plugin::PersistencePlugin;
pub use snapshot::{GameSnapshot, JsonSnapshotFile, SnapshotError, SnapshotStore};
pub use systems::{PendingSnapshot, SnapshotAction, SnapshotRestored, SnapshotSaved};
