//! InteractionPlugin registers the gate, dispatcher and result processor.
use bevy::prelude::*;

use crate::{
    bus::EventBus,
    core::{config::AppConfig, InteractionSet},
    stats::{config::StatsConfig, GameStats},
};

use super::{
    catalog::InteractionCatalog,
    dispatcher::InteractionDispatcher,
    feedback::ActiveFeedbackPlayer,
    gate::ConditionGate,
    processor::ResultProcessor,
    systems::{
        advance_feedback_player, advance_result_processor, collect_started_interactions,
        release_completed_requests,
    },
};

impl FromWorld for InteractionDispatcher {
    fn from_world(world: &mut World) -> Self {
        let bus = world.get_resource_or_init::<EventBus>().clone();
        Self::new(&bus)
    }
}

impl FromWorld for ResultProcessor {
    fn from_world(world: &mut World) -> Self {
        let bus = world.get_resource_or_init::<EventBus>().clone();
        let durations = world.get_resource_or_init::<StatsConfig>().display;
        let stats = world.get_resource_or_init::<GameStats>().clone();
        Self::new(&bus, durations, &stats)
    }
}

/// Catalog override used by tests and tools; skips the config file.
#[derive(Default)]
pub struct InteractionPlugin {
    catalog: Option<InteractionCatalog>,
}

impl InteractionPlugin {
    pub fn with_catalog(catalog: InteractionCatalog) -> Self {
        Self {
            catalog: Some(catalog),
        }
    }
}

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        let catalog = self
            .catalog
            .clone()
            .unwrap_or_else(InteractionCatalog::load_or_default);
        let bypass = app
            .world()
            .get_resource::<AppConfig>()
            .is_some_and(|config| config.gate_bypass);
        info!(
            "InteractionPlugin: {} interaction(s) configured, gate bypass {}",
            catalog.len(),
            if bypass { "ON" } else { "off" }
        );

        app.insert_resource(catalog)
            .insert_resource(ConditionGate::new(bypass))
            .init_resource::<ActiveFeedbackPlayer>()
            .init_resource::<InteractionDispatcher>()
            .init_resource::<ResultProcessor>()
            .add_systems(
                Update,
                release_completed_requests.in_set(InteractionSet::Dispatch),
            )
            .add_systems(
                Update,
                (
                    collect_started_interactions,
                    advance_feedback_player,
                    advance_result_processor,
                )
                    .chain()
                    .in_set(InteractionSet::Process),
            );
    }
}

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;

    use super::*;
    use crate::{
        bus::{BusInbox, BusPlugin},
        core::CorePlugin,
        interaction::{
            events::{InteractionApplied, InteractionCompleted, InteractionStarted},
            processor::ApplyTargets,
            systems::InteractionTrigger,
            types::TargetId,
        },
        mode::{
            state::{ModeState, SceneMode},
            ModeStateMachine,
        },
        stats::{GameFlags, NumericStore, StatKey, StatsPlugin},
        world::time::GameClock,
    };

    #[derive(Resource, Default)]
    struct PendingClick(Option<(&'static str, &'static str)>);

    fn click_system(mut pending: ResMut<PendingClick>, mut trigger: InteractionTrigger) {
        if let Some((name, target)) = pending.0.take() {
            trigger.trigger(name, &TargetId::new(target));
        }
    }

    fn snap_active_result(
        mut processor: ResMut<ResultProcessor>,
        mut stats: ResMut<GameStats>,
        mut flags: ResMut<GameFlags>,
        mut clock: ResMut<GameClock>,
        mut feedback: ResMut<ActiveFeedbackPlayer>,
        bus: Res<EventBus>,
    ) {
        let mut targets = ApplyTargets {
            stats: &mut *stats,
            flags: &mut flags,
            clock: &mut clock,
            feedback: feedback.player_mut(),
            bus: &bus,
        };
        processor.cancel_active(&mut targets);
    }

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins((
                CorePlugin::default(),
                BusPlugin::default(),
                StatsPlugin,
                InteractionPlugin::with_catalog(InteractionCatalog::builtin()),
            ))
            .init_resource::<GameClock>()
            .insert_resource(ModeStateMachine::new(
                ModeState::gameplay(SceneMode::LocationB),
                0.0,
            ))
            .init_resource::<PendingClick>()
            .add_systems(Update, click_system.in_set(InteractionSet::Input));
        app
    }

    #[test]
    fn click_flows_through_dispatch_and_processing() {
        let mut app = app();
        let (started, applied, completed) = {
            let bus = app.world().resource::<EventBus>();
            (
                BusInbox::<InteractionStarted>::attach(bus),
                BusInbox::<InteractionApplied>::attach(bus),
                BusInbox::<InteractionCompleted>::attach(bus),
            )
        };
        let mood_before = app.world().resource::<GameStats>().value(StatKey::Mood);

        app.world_mut().resource_mut::<PendingClick>().0 = Some(("CatPlay", "cat"));
        app.update();

        assert_eq!(started.len(), 1);
        assert_eq!(applied.len(), 1);
        let mood_after = app.world().resource::<GameStats>().value(StatKey::Mood);
        assert!(mood_after > mood_before);
        let target = TargetId::new("cat");
        assert!(app
            .world()
            .resource::<InteractionDispatcher>()
            .is_in_flight(&target));

        // Snap the display animation so the completion lands next frame.
        app.world_mut()
            .run_system_once(snap_active_result)
            .expect("snap system runs");
        assert_eq!(completed.len(), 1);

        app.update();
        assert!(!app
            .world()
            .resource::<InteractionDispatcher>()
            .is_in_flight(&target));
    }
}
