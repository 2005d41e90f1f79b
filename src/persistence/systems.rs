//! F5/F9 handling and the restore sequence.
use bevy::{ecs::system::SystemParam, prelude::*};

use crate::{
    bus::EventBus,
    interaction::{
        feedback::ActiveFeedbackPlayer, processor::ApplyTargets, InteractionDispatcher,
        ResultProcessor,
    },
    mode::{InputLayers, ModeStateMachine},
    stats::{GameFlags, GameStats},
    world::time::GameClock,
};

use super::snapshot::{GameSnapshot, SnapshotStore};

/// Active snapshot backend.
#[derive(Resource)]
pub struct SnapshotSlot(pub Box<dyn SnapshotStore>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotAction {
    Save,
    Load,
}

/// Action requested this frame (keyboard or programmatic).
#[derive(Resource, Debug, Default)]
pub struct PendingSnapshot(pub Option<SnapshotAction>);

/// Published after a snapshot was written.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSaved {
    pub location: String,
}

/// Published after a snapshot replaced the running state.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRestored {
    pub location: String,
    pub snapshot: GameSnapshot,
}

/// Everything a restore writes to.
#[derive(SystemParam)]
pub struct RestoreTargets<'w> {
    processor: ResMut<'w, ResultProcessor>,
    dispatcher: ResMut<'w, InteractionDispatcher>,
    machine: ResMut<'w, ModeStateMachine>,
    stats: ResMut<'w, GameStats>,
    flags: ResMut<'w, GameFlags>,
    clock: ResMut<'w, GameClock>,
    feedback: ResMut<'w, ActiveFeedbackPlayer>,
    layers: InputLayers<'w>,
    bus: Res<'w, EventBus>,
}

impl RestoreTargets<'_> {
    /// Snaps running work, then replaces state in one step: pending results
    /// are abandoned, the scene transition is finished, in-flight marks are
    /// cleared and the displayed values jump to the restored ones.
    pub fn apply(&mut self, snapshot: &GameSnapshot) {
        {
            let mut targets = ApplyTargets {
                stats: &mut *self.stats,
                flags: &mut self.flags,
                clock: &mut self.clock,
                feedback: self.feedback.player_mut(),
                bus: &self.bus,
            };
            self.processor.abandon_pending(&mut targets);
        }

        self.stats.restore(&snapshot.stats);
        self.flags.restore(snapshot.flags.iter().cloned());
        self.clock.set(snapshot.clock);
        self.dispatcher.reset();
        self.machine
            .restore(snapshot.scene, &mut self.layers.as_layers(), &self.bus);
        self.processor.resync_displayed(&*self.stats);
    }
}

pub(super) fn read_snapshot_keys(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut pending: ResMut<PendingSnapshot>,
) {
    let Some(keys) = keys else {
        return;
    };
    if keys.just_pressed(KeyCode::F5) {
        pending.0 = Some(SnapshotAction::Save);
    } else if keys.just_pressed(KeyCode::F9) {
        pending.0 = Some(SnapshotAction::Load);
    }
}

pub(super) fn save_snapshot(
    mut pending: ResMut<PendingSnapshot>,
    slot: Res<SnapshotSlot>,
    stats: Res<GameStats>,
    flags: Res<GameFlags>,
    clock: Res<GameClock>,
    machine: Res<ModeStateMachine>,
    bus: Res<EventBus>,
) {
    if pending.0 != Some(SnapshotAction::Save) {
        return;
    }
    pending.0 = None;

    // Mid-transition saves record the destination.
    let scene = machine
        .transition()
        .map_or(machine.state().scene, |transition| transition.to());
    let snapshot = GameSnapshot::capture(&stats, &flags, &clock, scene);
    let location = slot.0.describe();
    match slot.0.save(&snapshot) {
        Ok(()) => {
            info!(target: "persistence", "Game saved to {}", location);
            bus.publish(&SnapshotSaved { location });
        }
        Err(err) => error!(target: "persistence", "Save failed: {err}"),
    }
}

pub(super) fn load_snapshot(
    mut pending: ResMut<PendingSnapshot>,
    slot: Res<SnapshotSlot>,
    mut targets: RestoreTargets,
) {
    if pending.0 != Some(SnapshotAction::Load) {
        return;
    }
    pending.0 = None;

    let location = slot.0.describe();
    match slot.0.load() {
        Ok(Some(snapshot)) => {
            targets.apply(&snapshot);
            info!(
                target: "persistence",
                "Game loaded from {} (day {}, slot {}, {})",
                location, snapshot.clock.day, snapshot.clock.slot, snapshot.scene
            );
            targets.bus.publish(&SnapshotRestored { location, snapshot });
        }
        Ok(None) => warn!(target: "persistence", "No snapshot at {}", location),
        Err(err) => error!(target: "persistence", "Load failed: {err}"),
    }
}
