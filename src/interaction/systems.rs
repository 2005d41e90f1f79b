use bevy::{ecs::system::SystemParam, prelude::*};

use crate::{
    bus::EventBus,
    core::SimulationClock,
    mode::ModeStateMachine,
    stats::{GameFlags, GameStats},
    world::time::GameClock,
};

use super::{
    catalog::InteractionCatalog,
    dispatcher::{DispatchContext, DispatchOutcome, InteractionDispatcher},
    feedback::ActiveFeedbackPlayer,
    gate::ConditionGate,
    processor::{ApplyTargets, ResultProcessor},
    types::TargetId,
};

/// System parameter bundling everything `trigger_interaction` reads. Input
/// systems take this instead of reaching for the dispatcher directly.
#[derive(SystemParam)]
pub struct InteractionTrigger<'w> {
    dispatcher: ResMut<'w, InteractionDispatcher>,
    gate: Res<'w, ConditionGate>,
    catalog: Res<'w, InteractionCatalog>,
    stats: Res<'w, GameStats>,
    flags: Res<'w, GameFlags>,
    clock: Res<'w, GameClock>,
    mode: Res<'w, ModeStateMachine>,
    simulation: Res<'w, SimulationClock>,
    bus: Res<'w, EventBus>,
}

impl InteractionTrigger<'_> {
    pub fn trigger(&mut self, name: &str, target: &TargetId) -> DispatchOutcome {
        let context = DispatchContext {
            gate: &self.gate,
            catalog: &self.catalog,
            stats: &*self.stats,
            flags: &self.flags,
            clock: &self.clock,
            mode: &self.mode,
            now_seconds: self.simulation.elapsed_secs(),
        };
        self.dispatcher
            .trigger_interaction(name, target, &context, &self.bus)
    }
}

pub(super) fn release_completed_requests(mut dispatcher: ResMut<InteractionDispatcher>) {
    dispatcher.collect_completions();
}

pub(super) fn collect_started_interactions(
    mut processor: ResMut<ResultProcessor>,
    catalog: Res<InteractionCatalog>,
) {
    processor.collect_started(&catalog);
}

pub(super) fn advance_feedback_player(
    mut feedback: ResMut<ActiveFeedbackPlayer>,
    simulation: Res<SimulationClock>,
) {
    let delta = simulation.delta_secs();
    feedback.player_mut().update(delta);
}

pub(super) fn advance_result_processor(
    mut processor: ResMut<ResultProcessor>,
    mut stats: ResMut<GameStats>,
    mut flags: ResMut<GameFlags>,
    mut clock: ResMut<GameClock>,
    mut feedback: ResMut<ActiveFeedbackPlayer>,
    bus: Res<EventBus>,
    simulation: Res<SimulationClock>,
) {
    let mut targets = ApplyTargets {
        stats: &mut *stats,
        flags: &mut flags,
        clock: &mut clock,
        feedback: feedback.player_mut(),
        bus: &bus,
    };
    processor.tick(simulation.delta_secs(), &mut targets);
}
